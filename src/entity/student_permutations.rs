//! 学生排列实体
//!
//! 顺序以 JSON 文本保存，写入后不再修改。

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "student_permutations")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub exam_assignment_id: i64,
    pub student_id: i64,
    #[sea_orm(column_type = "Text")]
    pub question_order: String,
    #[sea_orm(column_type = "Text")]
    pub option_order: String,
    pub algorithm_version: i32,
    pub exam_fingerprint: String,
    pub created_at: i64,
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

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn into_stored(
        self,
    ) -> crate::errors::Result<crate::models::permutations::entities::StoredPermutation> {
        use crate::engine::StudentPermutation;
        use crate::models::permutations::entities::StoredPermutation;
        use chrono::{DateTime, Utc};

        Ok(StoredPermutation {
            id: self.id,
            permutation: StudentPermutation {
                exam_assignment_id: self.exam_assignment_id,
                student_id: self.student_id,
                question_order: serde_json::from_str(&self.question_order)?,
                option_order: serde_json::from_str(&self.option_order)?,
                algorithm_version: self.algorithm_version as u32,
                exam_fingerprint: self.exam_fingerprint,
            },
            created_at: DateTime::<Utc>::from_timestamp(self.created_at, 0).unwrap_or_default(),
        })
    }
}
