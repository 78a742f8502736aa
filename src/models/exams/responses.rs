use super::entities::Exam;
use crate::engine::CanonicalExam;
use crate::models::common::PaginatedResponse;
use serde::Serialize;
use ts_rs::TS;

// 试卷列表响应
pub type ExamListResponse = PaginatedResponse<Exam>;

// 试卷详情（含规范题目）
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/exam.ts")]
pub struct ExamDetailResponse {
    pub exam: Exam,
    pub canonical: CanonicalExam,
    pub fingerprint: String,
    // 已有排列引用时结构不可再修改
    pub locked: bool,
}
