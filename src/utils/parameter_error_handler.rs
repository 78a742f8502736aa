use actix_web::error::{InternalError, JsonPayloadError, QueryPayloadError};
use actix_web::{Error, HttpRequest, HttpResponse};
use tracing::debug;

use crate::models::{ApiResponse, ErrorCode};

// JSON 请求体解析失败时返回统一的错误响应
pub fn json_error_handler(err: JsonPayloadError, req: &HttpRequest) -> Error {
    debug!("JSON payload rejected on {}: {}", req.path(), err);

    let (code, status_message) = match &err {
        JsonPayloadError::OverflowKnownLength { .. } | JsonPayloadError::Overflow { .. } => {
            (ErrorCode::PayloadTooLarge, "Request body too large".to_string())
        }
        JsonPayloadError::ContentType => (
            ErrorCode::BadRequest,
            "Content-Type must be application/json".to_string(),
        ),
        _ => (ErrorCode::BadRequest, format!("Invalid JSON body: {err}")),
    };

    let response = if code == ErrorCode::PayloadTooLarge {
        HttpResponse::PayloadTooLarge().json(ApiResponse::error_empty(code, status_message))
    } else {
        HttpResponse::BadRequest().json(ApiResponse::error_empty(code, status_message))
    };
    InternalError::from_response(err, response).into()
}

// 查询参数解析失败
pub fn query_error_handler(err: QueryPayloadError, req: &HttpRequest) -> Error {
    debug!("Query string rejected on {}: {}", req.path(), err);

    let response = HttpResponse::BadRequest().json(ApiResponse::error_empty(
        ErrorCode::BadRequest,
        format!("Invalid query parameters: {err}"),
    ));
    InternalError::from_response(err, response).into()
}
