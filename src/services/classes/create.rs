use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use super::{ClassService, class_error};
use crate::errors::ExamSystemError;
use crate::models::ApiResponse;
use crate::models::classes::requests::CreateClassRequest;

pub async fn create_class(
    service: &ClassService,
    request: &HttpRequest,
    mut class_data: CreateClassRequest,
) -> ActixResult<HttpResponse> {
    class_data.class_name = class_data.class_name.trim().to_string();
    if class_data.class_name.is_empty() {
        return Ok(class_error(&ExamSystemError::validation(
            "class_name must not be empty",
        )));
    }

    let storage = service.get_storage(request);
    match storage.create_class(class_data).await {
        Ok(class) => {
            info!("Class {} created with id {}", class.class_name, class.id);
            Ok(HttpResponse::Created().json(ApiResponse::success(class, "Class created successfully")))
        }
        Err(e) => Ok(class_error(&e)),
    }
}
