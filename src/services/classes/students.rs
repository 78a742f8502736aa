use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use super::{ClassService, class_error};
use crate::errors::{ExamSystemError, Result};
use crate::models::classes::entities::Class;
use crate::models::classes::requests::CreateStudentRequest;
use crate::models::classes::responses::RosterResponse;
use crate::models::{ApiResponse, ErrorCode};
use crate::storage::Storage;

async fn require_class(storage: &dyn Storage, class_id: i64) -> Result<Class> {
    storage
        .get_class_by_id(class_id)
        .await?
        .ok_or_else(|| ExamSystemError::not_found(format!("class {class_id} not found")))
}

pub async fn add_student(
    service: &ClassService,
    request: &HttpRequest,
    class_id: i64,
    mut student: CreateStudentRequest,
) -> ActixResult<HttpResponse> {
    student.name = student.name.trim().to_string();
    if student.name.is_empty() {
        return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(
            ErrorCode::BadRequest,
            "Student name must not be empty",
        )));
    }

    let storage = service.get_storage(request);
    if let Err(e) = require_class(storage.as_ref(), class_id).await {
        return Ok(class_error(&e));
    }

    match storage.create_student(class_id, student).await {
        Ok(student) => {
            info!("Student {} added to class {}", student.id, class_id);
            Ok(HttpResponse::Created().json(ApiResponse::success(student, "Student added successfully")))
        }
        Err(e) => Ok(class_error(&e)),
    }
}

pub async fn list_roster(
    service: &ClassService,
    request: &HttpRequest,
    class_id: i64,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);
    if let Err(e) = require_class(storage.as_ref(), class_id).await {
        return Ok(class_error(&e));
    }

    match storage.list_students_by_class(class_id).await {
        Ok(items) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            RosterResponse { class_id, items },
            "Roster retrieved successfully",
        ))),
        Err(e) => Ok(class_error(&e)),
    }
}
