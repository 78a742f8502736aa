use crate::engine::Detection;
use serde::Deserialize;
use ts_rs::TS;

// 提交识别结果
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/correction.ts")]
pub struct SubmitCorrectionRequest {
    pub raw_detections: Vec<Detection>,
    pub corrected_by: i64,
    // 覆盖已有批改，写入审计
    #[serde(default)]
    pub force: bool,
    pub reason: Option<String>,
}
