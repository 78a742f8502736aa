//! 批改记录实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "correction_records")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub exam_assignment_id: i64,
    pub student_id: i64,
    // 按显示位置保存的原始识别结果（JSON）
    #[sea_orm(column_type = "Text")]
    pub raw_detections: String,
    pub score: i32,
    pub total: i32,
    #[sea_orm(column_type = "Double")]
    pub grade: f64,
    pub needs_review: bool,
    pub corrected_by: i64,
    pub corrected_at: i64,
    pub revision: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::exam_assignments::Entity",
        from = "Column::ExamAssignmentId",
        to = "super::exam_assignments::Column::Id"
    )]
    ExamAssignment,
    #[sea_orm(
        belongs_to = "super::students::Entity",
        from = "Column::StudentId",
        to = "super::students::Column::Id"
    )]
    Student,
    #[sea_orm(has_many = "super::correction_audits::Entity")]
    Audits,
}

impl Related<super::exam_assignments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ExamAssignment.def()
    }
}

impl Related<super::students::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Student.def()
    }
}

impl Related<super::correction_audits::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Audits.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn into_record(
        self,
    ) -> crate::errors::Result<crate::models::corrections::entities::CorrectionRecord> {
        use crate::models::corrections::entities::CorrectionRecord;
        use chrono::{DateTime, Utc};

        Ok(CorrectionRecord {
            id: self.id,
            exam_assignment_id: self.exam_assignment_id,
            student_id: self.student_id,
            raw_detections: serde_json::from_str(&self.raw_detections)?,
            score: self.score as u32,
            total: self.total as u32,
            grade: self.grade,
            needs_review: self.needs_review,
            corrected_by: self.corrected_by,
            corrected_at: DateTime::<Utc>::from_timestamp(self.corrected_at, 0)
                .unwrap_or_default(),
            revision: self.revision,
        })
    }
}
