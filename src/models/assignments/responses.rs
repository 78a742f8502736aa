use super::entities::ExamAssignment;
use serde::Serialize;
use ts_rs::TS;

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/assignment.ts")]
pub struct AssignmentListResponse {
    pub items: Vec<ExamAssignment>,
}

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/assignment.ts")]
pub struct RosterFailure {
    pub student_id: i64,
    pub error: String,
}

/// 批量生成排列的结果
#[derive(Debug, Clone, Default, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/assignment.ts")]
pub struct RosterGenerationReport {
    pub roster_size: usize,
    pub created: usize,
    pub existing: usize,
    pub failed: Vec<RosterFailure>,
}

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/assignment.ts")]
pub struct CreateAssignmentResponse {
    pub assignment: ExamAssignment,
    pub generation: RosterGenerationReport,
}
