use serde::Deserialize;
use ts_rs::TS;

// 关联试卷到班级
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/assignment.ts")]
pub struct CreateAssignmentRequest {
    pub class_id: i64,
    pub exam_id: i64,
}

// 关联列表筛选
#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/assignment.ts")]
pub struct AssignmentListQuery {
    pub class_id: Option<i64>,
    pub exam_id: Option<i64>,
}
