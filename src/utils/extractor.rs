//! 路径参数提取器
//!
//! 解析失败时返回统一的 400 响应，而不是 actix 默认的纯文本错误。

use actix_web::dev::Payload;
use actix_web::error::InternalError;
use actix_web::{Error, FromRequest, HttpRequest, HttpResponse};
use futures_util::future::{Ready, ready};

use crate::models::{ApiResponse, ErrorCode};

fn parse_positive_i64(req: &HttpRequest, name: &str) -> Result<i64, Error> {
    let raw = req.match_info().get(name).unwrap_or_default();
    match raw.parse::<i64>() {
        Ok(value) if value > 0 => Ok(value),
        _ => {
            let message = format!("Invalid path parameter {name}: {raw:?}");
            let response = HttpResponse::BadRequest()
                .json(ApiResponse::error_empty(ErrorCode::BadRequest, message.clone()));
            Err(InternalError::from_response(message, response).into())
        }
    }
}

macro_rules! define_safe_i64_extractor {
    ($(#[$meta:meta])* $name:ident, $param:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub struct $name(pub i64);

        impl FromRequest for $name {
            type Error = Error;
            type Future = Ready<Result<Self, Self::Error>>;

            fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
                ready(parse_positive_i64(req, $param).map($name))
            }
        }
    };
}

define_safe_i64_extractor!(
    /// 路径中的 `{id}`
    SafeIDI64,
    "id"
);
define_safe_i64_extractor!(
    /// 路径中的 `{student_id}`
    SafeStudentIdI64,
    "student_id"
);

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[actix_web::test]
    async fn test_extracts_positive_id() {
        let (req, mut payload) = TestRequest::default()
            .param("id", "42")
            .to_http_parts();
        let id = SafeIDI64::from_request(&req, &mut payload).await.unwrap();
        assert_eq!(id.0, 42);
    }

    #[actix_web::test]
    async fn test_rejects_invalid_id() {
        for raw in ["0", "-3", "abc", ""] {
            let (req, mut payload) = TestRequest::default()
                .param("student_id", raw)
                .to_http_parts();
            assert!(SafeStudentIdI64::from_request(&req, &mut payload).await.is_err());
        }
    }
}
