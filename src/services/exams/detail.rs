use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::{ExamService, exam_error};
use crate::errors::{ExamSystemError, Result};
use crate::models::ApiResponse;
use crate::models::exams::responses::ExamDetailResponse;
use crate::storage::Storage;

pub(crate) async fn load_detail(storage: &dyn Storage, exam_id: i64) -> Result<ExamDetailResponse> {
    let exam = storage
        .get_exam_by_id(exam_id)
        .await?
        .ok_or_else(|| ExamSystemError::not_found(format!("exam {exam_id} not found")))?;
    let canonical = storage
        .get_canonical_exam(exam_id)
        .await?
        .ok_or_else(|| ExamSystemError::not_found(format!("exam {exam_id} not found")))?;
    let locked = storage.count_permutations_for_exam(exam_id).await? > 0;

    Ok(ExamDetailResponse {
        exam,
        fingerprint: canonical.fingerprint(),
        canonical,
        locked,
    })
}

pub async fn get_exam(
    service: &ExamService,
    request: &HttpRequest,
    exam_id: i64,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);
    match load_detail(storage.as_ref(), exam_id).await {
        Ok(detail) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            detail,
            "Exam retrieved successfully",
        ))),
        Err(e) => Ok(exam_error(&e)),
    }
}
