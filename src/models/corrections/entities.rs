use crate::engine::Detection;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// 已接受的批改记录
///
/// 逐题结果不落库，读取时由排列、试卷与 `raw_detections` 重新推导。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/correction.ts")]
pub struct CorrectionRecord {
    pub id: i64,
    pub exam_assignment_id: i64,
    pub student_id: i64,
    pub raw_detections: Vec<Detection>,
    pub score: u32,
    pub total: u32,
    pub grade: f64,
    pub needs_review: bool,
    pub corrected_by: i64,
    pub corrected_at: chrono::DateTime<chrono::Utc>,
    // 每次强制重批加一
    pub revision: i32,
}

/// 强制重批审计记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/correction.ts")]
pub struct CorrectionAudit {
    pub id: i64,
    pub correction_id: i64,
    pub exam_assignment_id: i64,
    pub student_id: i64,
    pub revision: i32,
    pub previous_raw_detections: Vec<Detection>,
    pub previous_score: u32,
    pub previous_total: u32,
    pub previous_corrected_by: i64,
    pub previous_corrected_at: chrono::DateTime<chrono::Utc>,
    pub new_raw_detections: Vec<Detection>,
    pub new_score: u32,
    pub new_total: u32,
    pub changed_by: i64,
    pub changed_at: chrono::DateTime<chrono::Utc>,
    pub reason: Option<String>,
}

/// 待写入的批改数据（用于存储层）
#[derive(Debug, Clone, PartialEq)]
pub struct NewCorrection {
    pub exam_assignment_id: i64,
    pub student_id: i64,
    pub raw_detections: Vec<Detection>,
    pub score: u32,
    pub total: u32,
    pub grade: f64,
    pub needs_review: bool,
    pub corrected_by: i64,
    pub corrected_at: i64,
}

/// 插入结果：写入成功，或唯一键上已有记录
#[derive(Debug, Clone, PartialEq)]
pub enum CorrectionInsert {
    Created(CorrectionRecord),
    Existing(CorrectionRecord),
}
