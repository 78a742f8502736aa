use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use super::{ExamService, exam_error, validate_questions};
use crate::models::ApiResponse;
use crate::models::exams::requests::CreateExamRequest;

pub async fn create_exam(
    service: &ExamService,
    request: &HttpRequest,
    exam: CreateExamRequest,
) -> ActixResult<HttpResponse> {
    if let Err(e) = validate_questions(0, &exam.title, &exam.questions) {
        return Ok(exam_error(&e));
    }

    let storage = service.get_storage(request);
    let question_count = exam.questions.len();
    match storage.create_exam(exam).await {
        Ok(created) => {
            info!(
                "Exam {} ({}) created with {} questions",
                created.id, created.title, question_count
            );
            Ok(HttpResponse::Created().json(ApiResponse::success(created, "Exam created successfully")))
        }
        Err(e) => Ok(exam_error(&e)),
    }
}
