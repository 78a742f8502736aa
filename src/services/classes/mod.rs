pub mod create;
pub mod students;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::errors::ExamSystemError;
use crate::models::classes::requests::{CreateClassRequest, CreateStudentRequest};
use crate::models::{ApiResponse, ErrorCode};
use crate::storage::Storage;

pub struct ClassService {
    storage: Option<Arc<dyn Storage>>,
}

impl ClassService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> Arc<dyn Storage> {
        if let Some(storage) = &self.storage {
            storage.clone()
        } else {
            request
                .app_data::<actix_web::web::Data<Arc<dyn Storage>>>()
                .expect("Storage not found in app data")
                .get_ref()
                .clone()
        }
    }

    pub async fn create_class(
        &self,
        request: &HttpRequest,
        class_data: CreateClassRequest,
    ) -> ActixResult<HttpResponse> {
        create::create_class(self, request, class_data).await
    }

    // 添加学生到班级
    pub async fn add_student(
        &self,
        request: &HttpRequest,
        class_id: i64,
        student: CreateStudentRequest,
    ) -> ActixResult<HttpResponse> {
        students::add_student(self, request, class_id, student).await
    }

    // 班级名单
    pub async fn list_roster(
        &self,
        request: &HttpRequest,
        class_id: i64,
    ) -> ActixResult<HttpResponse> {
        students::list_roster(self, request, class_id).await
    }
}

fn class_error(err: &ExamSystemError) -> HttpResponse {
    let code = match err {
        ExamSystemError::NotFound(_) => ErrorCode::ClassNotFound,
        ExamSystemError::Conflict(_) => ErrorCode::ClassAlreadyExists,
        _ => err.error_code(),
    };
    if !err.is_client_error() {
        tracing::error!("Class operation failed: {}", err);
    }
    ApiResponse::from_error_with(code, err)
}
