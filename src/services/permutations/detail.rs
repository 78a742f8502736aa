use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::{PermutationService, permutation_error};
use crate::errors::ExamSystemError;
use crate::models::permutations::responses::PermutationListResponse;
use crate::models::{ApiResponse, ErrorCode};

pub async fn list_permutations(
    service: &PermutationService,
    request: &HttpRequest,
    assignment_id: i64,
) -> ActixResult<HttpResponse> {
    let engine = service.get_engine(request);
    match engine.randomization.list_for_assignment(assignment_id).await {
        Ok(items) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            PermutationListResponse {
                exam_assignment_id: assignment_id,
                items,
            },
            "Permutations retrieved successfully",
        ))),
        Err(e) => Ok(permutation_error(&e)),
    }
}

// 首次访问时生成
pub async fn get_permutation(
    service: &PermutationService,
    request: &HttpRequest,
    assignment_id: i64,
    student_id: i64,
) -> ActixResult<HttpResponse> {
    let engine = service.get_engine(request);
    match engine
        .randomization
        .get_or_create_for_student(assignment_id, student_id)
        .await
    {
        Ok((_, stored)) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            stored,
            "Permutation retrieved successfully",
        ))),
        Err(e) => Ok(permutation_error(&e)),
    }
}

pub async fn reset_permutation(
    service: &PermutationService,
    request: &HttpRequest,
    assignment_id: i64,
    student_id: i64,
) -> ActixResult<HttpResponse> {
    let engine = service.get_engine(request);
    match engine.randomization.reset(assignment_id, student_id).await {
        Ok(()) => Ok(HttpResponse::Ok().json(ApiResponse::success_empty(
            "Permutation reset successfully",
        ))),
        Err(e @ ExamSystemError::NotFound(_)) => Ok(ApiResponse::from_error_with(
            ErrorCode::PermutationNotFound,
            &e,
        )),
        Err(e) => Ok(permutation_error(&e)),
    }
}
