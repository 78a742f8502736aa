use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::{AssignmentService, assignment_error};
use crate::errors::ExamSystemError;
use crate::models::ApiResponse;
use crate::models::assignments::requests::AssignmentListQuery;
use crate::models::assignments::responses::AssignmentListResponse;

pub async fn list_assignments(
    service: &AssignmentService,
    request: &HttpRequest,
    query: AssignmentListQuery,
) -> ActixResult<HttpResponse> {
    let engine = service.get_engine(request);
    match engine.storage.list_assignments(query).await {
        Ok(items) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            AssignmentListResponse { items },
            "Assignment list retrieved successfully",
        ))),
        Err(e) => Ok(assignment_error(&e)),
    }
}

pub async fn get_assignment(
    service: &AssignmentService,
    request: &HttpRequest,
    assignment_id: i64,
) -> ActixResult<HttpResponse> {
    let engine = service.get_engine(request);
    match engine.storage.get_assignment_by_id(assignment_id).await {
        Ok(Some(assignment)) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            assignment,
            "Assignment retrieved successfully",
        ))),
        Ok(None) => Ok(assignment_error(&ExamSystemError::not_found(format!(
            "exam assignment {assignment_id} not found"
        )))),
        Err(e) => Ok(assignment_error(&e)),
    }
}
