pub mod detail;
pub mod link;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::errors::ExamSystemError;
use crate::models::assignments::requests::{AssignmentListQuery, CreateAssignmentRequest};
use crate::models::{ApiResponse, ErrorCode};
use crate::stores::ExamEngine;

pub struct AssignmentService {
    engine: Option<Arc<ExamEngine>>,
}

impl AssignmentService {
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

    // 关联试卷到班级并为名单生成排列
    pub async fn link(
        &self,
        request: &HttpRequest,
        body: CreateAssignmentRequest,
    ) -> ActixResult<HttpResponse> {
        link::link(self, request, body).await
    }

    pub async fn list_assignments(
        &self,
        request: &HttpRequest,
        query: AssignmentListQuery,
    ) -> ActixResult<HttpResponse> {
        detail::list_assignments(self, request, query).await
    }

    pub async fn get_assignment(
        &self,
        request: &HttpRequest,
        assignment_id: i64,
    ) -> ActixResult<HttpResponse> {
        detail::get_assignment(self, request, assignment_id).await
    }

    // 解除关联，已有批改时拒绝
    pub async fn unlink(
        &self,
        request: &HttpRequest,
        assignment_id: i64,
    ) -> ActixResult<HttpResponse> {
        link::unlink(self, request, assignment_id).await
    }
}

fn assignment_error(err: &ExamSystemError) -> HttpResponse {
    let code = match err {
        ExamSystemError::NotFound(_) => ErrorCode::AssignmentNotFound,
        _ => err.error_code(),
    };
    if !err.is_client_error() {
        tracing::error!("Assignment operation failed: {}", err);
    }
    ApiResponse::from_error_with(code, err)
}
