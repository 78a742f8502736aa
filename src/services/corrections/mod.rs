pub mod detail;
pub mod scan;
pub mod statistics;
pub mod submit;

use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::errors::ExamSystemError;
use crate::models::corrections::requests::SubmitCorrectionRequest;
use crate::models::{ApiResponse, ErrorCode};
use crate::stores::ExamEngine;

pub struct CorrectionService {
    engine: Option<Arc<ExamEngine>>,
}

impl CorrectionService {
    pub fn new_lazy() -> Self {
        Self { engine: None }
    }

    pub(crate) fn get_engine(&self, request: &HttpRequest) -> Arc<ExamEngine> {
        if let Some(engine) = &self.engine {
            engine.clone()
        } else {
            request
                .app_data::<actix_web::web::Data<Arc<ExamEngine>>>()
                .expect("Exam engine not found in app data")
                .get_ref()
                .clone()
        }
    }

    // 提交识别结果（JSON）
    pub async fn submit_correction(
        &self,
        request: &HttpRequest,
        assignment_id: i64,
        student_id: i64,
        body: SubmitCorrectionRequest,
    ) -> ActixResult<HttpResponse> {
        submit::submit_correction(self, request, assignment_id, student_id, body).await
    }

    // 上传答题卡图片并批改
    pub async fn scan(&self, request: &HttpRequest, payload: Multipart) -> ActixResult<HttpResponse> {
        scan::scan(self, request, payload).await
    }

    pub async fn get_correction(
        &self,
        request: &HttpRequest,
        assignment_id: i64,
        student_id: i64,
    ) -> ActixResult<HttpResponse> {
        detail::get_correction(self, request, assignment_id, student_id).await
    }

    pub async fn list_corrections(
        &self,
        request: &HttpRequest,
        assignment_id: i64,
    ) -> ActixResult<HttpResponse> {
        detail::list_corrections(self, request, assignment_id).await
    }

    // 强制重批审计历史
    pub async fn correction_history(
        &self,
        request: &HttpRequest,
        assignment_id: i64,
        student_id: i64,
    ) -> ActixResult<HttpResponse> {
        detail::correction_history(self, request, assignment_id, student_id).await
    }

    pub async fn statistics(
        &self,
        request: &HttpRequest,
        assignment_id: i64,
    ) -> ActixResult<HttpResponse> {
        statistics::get_statistics(self, request, assignment_id).await
    }

    pub async fn export(
        &self,
        request: &HttpRequest,
        assignment_id: i64,
    ) -> ActixResult<HttpResponse> {
        statistics::export_corrections(self, request, assignment_id).await
    }
}

fn correction_error(err: &ExamSystemError) -> HttpResponse {
    let code = match err {
        ExamSystemError::Conflict(_) => ErrorCode::CorrectionAlreadyExists,
        _ => err.error_code(),
    };
    if !err.is_client_error() {
        tracing::error!("Correction operation failed: {}", err);
    }
    ApiResponse::from_error_with(code, err)
}
