use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// 试卷与班级的关联
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/assignment.ts")]
pub struct ExamAssignment {
    pub id: i64,
    pub class_id: i64,
    pub exam_id: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
}
