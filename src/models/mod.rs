//! 数据模型定义
//!
//! API 请求/响应结构与业务实体，均导出 TypeScript 类型。

pub mod assignments;
pub mod classes;
pub mod common;
pub mod corrections;
pub mod exams;
pub mod permutations;

pub use common::{ApiResponse, PaginatedResponse, PaginationInfo, PaginationQuery};

use actix_web::http::StatusCode;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::errors::ExamSystemError;

/// 程序启动时间
#[derive(Debug, Clone)]
pub struct AppStartTime {
    pub start_datetime: chrono::DateTime<chrono::Utc>,
}

/// 业务错误码
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/api.ts")]
pub enum ErrorCode {
    Success = 0,

    // 通用错误
    BadRequest = 1000,
    NotFound = 1004,
    Conflict = 1009,
    PayloadTooLarge = 1013,
    InternalServerError = 1500,

    // 试卷
    ExamNotFound = 2000,
    ExamInvalid = 2001,
    ExamLocked = 2002,

    // 班级与学生
    ClassNotFound = 3000,
    ClassAlreadyExists = 3001,
    StudentNotFound = 3002,

    // 试卷关联与排列
    AssignmentNotFound = 4000,
    AssignmentAlreadyExists = 4001,
    AssignmentHasCorrections = 4002,
    PermutationNotFound = 4010,
    PermutationLocked = 4011,

    // 批改
    CorrectionNotFound = 5000,
    CorrectionAlreadyExists = 5001,
    ReconciliationFailed = 5002,
    DetectionFailed = 5003,

    // 文件
    FileTypeNotAllowed = 6000,
    FileSizeExceeded = 6001,
    FileUploadFailed = 6002,
}

impl ExamSystemError {
    /// 默认映射的业务错误码，服务层可按场景改用更具体的错误码
    pub fn error_code(&self) -> ErrorCode {
        match self {
            ExamSystemError::Validation(_) => ErrorCode::BadRequest,
            ExamSystemError::NotFound(_) => ErrorCode::NotFound,
            ExamSystemError::Conflict(_) => ErrorCode::Conflict,
            ExamSystemError::Reconciliation(_) => ErrorCode::ReconciliationFailed,
            ExamSystemError::Detection(_) => ErrorCode::DetectionFailed,
            _ => ErrorCode::InternalServerError,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ExamSystemError::Validation(_) => StatusCode::BAD_REQUEST,
            ExamSystemError::NotFound(_) => StatusCode::NOT_FOUND,
            ExamSystemError::Conflict(_) => StatusCode::CONFLICT,
            ExamSystemError::Reconciliation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ExamSystemError::Detection(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_mapping() {
        assert_eq!(
            ExamSystemError::validation("x").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ExamSystemError::conflict("x").status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ExamSystemError::reconciliation("x").status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ExamSystemError::detection("x").error_code(),
            ErrorCode::DetectionFailed
        );
        assert_eq!(
            ExamSystemError::database_operation("x").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
