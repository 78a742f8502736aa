use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::{info, warn};

use super::detail::load_detail;
use super::{ExamService, exam_error, validate_questions};
use crate::errors::ExamSystemError;
use crate::models::ApiResponse;
use crate::models::exams::requests::ReplaceQuestionsRequest;

pub async fn replace_questions(
    service: &ExamService,
    request: &HttpRequest,
    exam_id: i64,
    body: ReplaceQuestionsRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);

    let exam = match storage.get_exam_by_id(exam_id).await {
        Ok(Some(exam)) => exam,
        Ok(None) => {
            return Ok(exam_error(&ExamSystemError::not_found(format!(
                "exam {exam_id} not found"
            ))));
        }
        Err(e) => return Ok(exam_error(&e)),
    };

    if let Err(e) = validate_questions(exam_id, &exam.title, &body.questions) {
        return Ok(exam_error(&e));
    }

    let question_count = body.questions.len();
    match storage.replace_exam_questions(exam_id, body.questions).await {
        Ok(Some(_)) => {
            info!("Exam {} questions replaced ({} questions)", exam_id, question_count);
            match load_detail(storage.as_ref(), exam_id).await {
                Ok(detail) => Ok(HttpResponse::Ok().json(ApiResponse::success(
                    detail,
                    "Exam questions replaced successfully",
                ))),
                Err(e) => Ok(exam_error(&e)),
            }
        }
        Ok(None) => Ok(exam_error(&ExamSystemError::not_found(format!(
            "exam {exam_id} not found"
        )))),
        Err(e) => {
            if matches!(e, ExamSystemError::Conflict(_)) {
                warn!("Refused to edit exam {} after permutations were generated", exam_id);
            }
            Ok(exam_error(&e))
        }
    }
}
