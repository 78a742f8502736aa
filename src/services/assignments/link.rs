use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use super::{AssignmentService, assignment_error};
use crate::errors::ExamSystemError;
use crate::models::assignments::requests::CreateAssignmentRequest;
use crate::models::assignments::responses::CreateAssignmentResponse;
use crate::models::{ApiResponse, ErrorCode};
use crate::stores::AssignmentContext;

pub async fn link(
    service: &AssignmentService,
    request: &HttpRequest,
    body: CreateAssignmentRequest,
) -> ActixResult<HttpResponse> {
    let engine = service.get_engine(request);
    let storage = engine.storage.clone();

    match storage.get_class_by_id(body.class_id).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            return Ok(ApiResponse::from_error_with(
                ErrorCode::ClassNotFound,
                &ExamSystemError::not_found(format!("class {} not found", body.class_id)),
            ));
        }
        Err(e) => return Ok(assignment_error(&e)),
    }

    let exam = match storage.get_canonical_exam(body.exam_id).await {
        Ok(Some(exam)) => exam,
        Ok(None) => {
            return Ok(ApiResponse::from_error_with(
                ErrorCode::ExamNotFound,
                &ExamSystemError::not_found(format!("exam {} not found", body.exam_id)),
            ));
        }
        Err(e) => return Ok(assignment_error(&e)),
    };
    // 结构不完整的试卷不得关联
    if let Err(e) = exam.validate() {
        return Ok(ApiResponse::from_error_with(ErrorCode::ExamInvalid, &e));
    }

    let assignment = match storage.create_assignment(body.class_id, body.exam_id).await {
        Ok(assignment) => assignment,
        Err(e @ ExamSystemError::Conflict(_)) => {
            return Ok(ApiResponse::from_error_with(
                ErrorCode::AssignmentAlreadyExists,
                &e,
            ));
        }
        Err(e) => return Ok(assignment_error(&e)),
    };
    info!(
        "Exam {} linked to class {} as assignment {}",
        assignment.exam_id, assignment.class_id, assignment.id
    );

    let context = AssignmentContext { assignment, exam };
    match engine.randomization.generate_for_roster(&context).await {
        Ok(generation) => Ok(HttpResponse::Created().json(ApiResponse::success(
            CreateAssignmentResponse {
                assignment: context.assignment,
                generation,
            },
            "Exam linked successfully",
        ))),
        Err(e) => Ok(assignment_error(&e)),
    }
}

pub async fn unlink(
    service: &AssignmentService,
    request: &HttpRequest,
    assignment_id: i64,
) -> ActixResult<HttpResponse> {
    let engine = service.get_engine(request);
    match engine.randomization.unlink(assignment_id).await {
        Ok(()) => Ok(HttpResponse::Ok().json(ApiResponse::success_empty(
            "Exam assignment removed successfully",
        ))),
        Err(e @ ExamSystemError::Conflict(_)) => Ok(ApiResponse::from_error_with(
            ErrorCode::AssignmentHasCorrections,
            &e,
        )),
        Err(e) => Ok(assignment_error(&e)),
    }
}
