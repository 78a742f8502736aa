use super::entities::{CorrectionAudit, CorrectionRecord};
use crate::engine::CorrectionResult;
use serde::Serialize;
use ts_rs::TS;

/// 批改记录及推导出的逐题结果
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/correction.ts")]
pub struct CorrectionResponse {
    pub record: CorrectionRecord,
    pub result: CorrectionResult,
}

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/correction.ts")]
pub struct CorrectionListResponse {
    pub exam_assignment_id: i64,
    pub items: Vec<CorrectionRecord>,
}

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/correction.ts")]
pub struct CorrectionHistoryResponse {
    pub exam_assignment_id: i64,
    pub student_id: i64,
    pub items: Vec<CorrectionAudit>,
}

/// 扫描件提交结果
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/correction.ts")]
pub struct ScanResponse {
    // 保存在扫描目录下的文件名
    pub stored_image: String,
    pub record: CorrectionRecord,
    pub result: CorrectionResult,
}
