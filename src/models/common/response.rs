use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::errors::ExamSystemError;
use crate::models::ErrorCode;
use actix_web::HttpResponse;

// 统一的API响应结构
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/api.ts")]
pub struct ApiResponse<T: TS> {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl<T: TS> ApiResponse<T> {
    pub fn success(data: T, message: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::Success as i32,
            message: message.into(),
            data: Some(data),
            timestamp: chrono::Utc::now(),
        }
    }

    pub fn error(code: ErrorCode, data: T, message: impl Into<String>) -> Self {
        Self {
            code: code as i32,
            message: message.into(),
            data: Some(data),
            timestamp: chrono::Utc::now(),
        }
    }
}

impl ApiResponse<()> {
    pub fn success_empty(message: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::Success as i32,
            message: message.into(),
            data: None,
            timestamp: chrono::Utc::now(),
        }
    }

    pub fn error_empty(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code: code as i32,
            message: message.into(),
            data: None,
            timestamp: chrono::Utc::now(),
        }
    }
}

impl ApiResponse<()> {
    /// 按错误类型生成对应状态码的响应
    pub fn from_error(err: &ExamSystemError) -> HttpResponse {
        Self::from_error_with(err.error_code(), err)
    }

    /// 使用指定的业务错误码
    pub fn from_error_with(code: ErrorCode, err: &ExamSystemError) -> HttpResponse {
        HttpResponse::build(err.status_code()).json(Self::error_empty(code, err.message()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_envelope() {
        let resp = ApiResponse::success(vec![1, 2], "ok");
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["code"], 0);
        assert_eq!(json["data"], serde_json::json!([1, 2]));
    }

    #[test]
    fn test_empty_error_omits_data() {
        let resp = ApiResponse::error_empty(ErrorCode::Conflict, "already exists");
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["code"], ErrorCode::Conflict as i32);
        assert!(json.get("data").is_none());
    }

    #[test]
    fn test_from_error_status() {
        let resp = ApiResponse::from_error(&ExamSystemError::not_found("exam 3"));
        assert_eq!(resp.status(), actix_web::http::StatusCode::NOT_FOUND);
    }
}
