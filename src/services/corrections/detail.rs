use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::{CorrectionService, correction_error};
use crate::errors::ExamSystemError;
use crate::models::corrections::responses::{CorrectionHistoryResponse, CorrectionListResponse};
use crate::models::{ApiResponse, ErrorCode};

pub async fn get_correction(
    service: &CorrectionService,
    request: &HttpRequest,
    assignment_id: i64,
    student_id: i64,
) -> ActixResult<HttpResponse> {
    let engine = service.get_engine(request);
    match engine.corrections.get(assignment_id, student_id).await {
        Ok(response) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            response,
            "Correction retrieved successfully",
        ))),
        Err(e @ ExamSystemError::NotFound(_)) => Ok(ApiResponse::from_error_with(
            ErrorCode::CorrectionNotFound,
            &e,
        )),
        Err(e) => Ok(correction_error(&e)),
    }
}

pub async fn list_corrections(
    service: &CorrectionService,
    request: &HttpRequest,
    assignment_id: i64,
) -> ActixResult<HttpResponse> {
    let engine = service.get_engine(request);
    match engine.corrections.list(assignment_id).await {
        Ok(items) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            CorrectionListResponse {
                exam_assignment_id: assignment_id,
                items,
            },
            "Corrections retrieved successfully",
        ))),
        Err(e) => Ok(correction_error(&e)),
    }
}

pub async fn correction_history(
    service: &CorrectionService,
    request: &HttpRequest,
    assignment_id: i64,
    student_id: i64,
) -> ActixResult<HttpResponse> {
    let engine = service.get_engine(request);
    match engine.corrections.history(assignment_id, student_id).await {
        Ok(items) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            CorrectionHistoryResponse {
                exam_assignment_id: assignment_id,
                student_id,
                items,
            },
            "Correction history retrieved successfully",
        ))),
        Err(e) => Ok(correction_error(&e)),
    }
}
