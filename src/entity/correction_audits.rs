//! 强制重批审计实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "correction_audits")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub correction_id: i64,
    pub exam_assignment_id: i64,
    pub student_id: i64,
    // 覆盖后的版本号
    pub revision: i32,
    #[sea_orm(column_type = "Text")]
    pub previous_raw_detections: String,
    pub previous_score: i32,
    pub previous_total: i32,
    pub previous_corrected_by: i64,
    pub previous_corrected_at: i64,
    #[sea_orm(column_type = "Text")]
    pub new_raw_detections: String,
    pub new_score: i32,
    pub new_total: i32,
    pub changed_by: i64,
    pub changed_at: i64,
    #[sea_orm(column_type = "Text", nullable)]
    pub reason: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::correction_records::Entity",
        from = "Column::CorrectionId",
        to = "super::correction_records::Column::Id"
    )]
    Correction,
}

impl Related<super::correction_records::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Correction.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn into_audit(
        self,
    ) -> crate::errors::Result<crate::models::corrections::entities::CorrectionAudit> {
        use crate::models::corrections::entities::CorrectionAudit;
        use chrono::{DateTime, Utc};

        Ok(CorrectionAudit {
            id: self.id,
            correction_id: self.correction_id,
            exam_assignment_id: self.exam_assignment_id,
            student_id: self.student_id,
            revision: self.revision,
            previous_raw_detections: serde_json::from_str(&self.previous_raw_detections)?,
            previous_score: self.previous_score as u32,
            previous_total: self.previous_total as u32,
            previous_corrected_by: self.previous_corrected_by,
            previous_corrected_at: DateTime::<Utc>::from_timestamp(self.previous_corrected_at, 0)
                .unwrap_or_default(),
            new_raw_detections: serde_json::from_str(&self.new_raw_detections)?,
            new_score: self.new_score as u32,
            new_total: self.new_total as u32,
            changed_by: self.changed_by,
            changed_at: DateTime::<Utc>::from_timestamp(self.changed_at, 0).unwrap_or_default(),
            reason: self.reason,
        })
    }
}
