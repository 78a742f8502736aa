pub mod detail;
pub mod generate;
pub mod views;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::errors::ExamSystemError;
use crate::models::{ApiResponse, ErrorCode};
use crate::stores::ExamEngine;

pub struct PermutationService {
    engine: Option<Arc<ExamEngine>>,
}

impl PermutationService {
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

    // 为班级当前名单生成排列
    pub async fn generate_for_roster(
        &self,
        request: &HttpRequest,
        assignment_id: i64,
    ) -> ActixResult<HttpResponse> {
        generate::generate_for_roster(self, request, assignment_id).await
    }

    pub async fn list_permutations(
        &self,
        request: &HttpRequest,
        assignment_id: i64,
    ) -> ActixResult<HttpResponse> {
        detail::list_permutations(self, request, assignment_id).await
    }

    pub async fn get_permutation(
        &self,
        request: &HttpRequest,
        assignment_id: i64,
        student_id: i64,
    ) -> ActixResult<HttpResponse> {
        detail::get_permutation(self, request, assignment_id, student_id).await
    }

    // 显式重置排列
    pub async fn reset_permutation(
        &self,
        request: &HttpRequest,
        assignment_id: i64,
        student_id: i64,
    ) -> ActixResult<HttpResponse> {
        detail::reset_permutation(self, request, assignment_id, student_id).await
    }

    pub async fn personalized_exam(
        &self,
        request: &HttpRequest,
        assignment_id: i64,
        student_id: i64,
    ) -> ActixResult<HttpResponse> {
        views::personalized_exam(self, request, assignment_id, student_id).await
    }

    pub async fn answer_key(
        &self,
        request: &HttpRequest,
        assignment_id: i64,
        student_id: i64,
    ) -> ActixResult<HttpResponse> {
        views::answer_key(self, request, assignment_id, student_id).await
    }
}

fn permutation_error(err: &ExamSystemError) -> HttpResponse {
    let code = match err {
        ExamSystemError::Conflict(_) => ErrorCode::PermutationLocked,
        _ => err.error_code(),
    };
    if !err.is_client_error() {
        tracing::error!("Permutation operation failed: {}", err);
    }
    ApiResponse::from_error_with(code, err)
}
