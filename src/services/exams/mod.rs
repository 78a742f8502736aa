pub mod create;
pub mod detail;
pub mod list;
pub mod questions;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::errors::{ExamSystemError, Result};
use crate::models::exams::requests::{
    CreateExamRequest, ExamQueryParams, QuestionInput, ReplaceQuestionsRequest,
    preview_canonical,
};
use crate::models::{ApiResponse, ErrorCode};
use crate::storage::Storage;

pub struct ExamService {
    storage: Option<Arc<dyn Storage>>,
}

impl ExamService {
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

    pub async fn create_exam(
        &self,
        request: &HttpRequest,
        exam: CreateExamRequest,
    ) -> ActixResult<HttpResponse> {
        create::create_exam(self, request, exam).await
    }

    pub async fn list_exams(
        &self,
        request: &HttpRequest,
        query: ExamQueryParams,
    ) -> ActixResult<HttpResponse> {
        list::list_exams(self, request, query).await
    }

    pub async fn get_exam(&self, request: &HttpRequest, exam_id: i64) -> ActixResult<HttpResponse> {
        detail::get_exam(self, request, exam_id).await
    }

    // 替换题目，已生成排列后拒绝
    pub async fn replace_questions(
        &self,
        request: &HttpRequest,
        exam_id: i64,
        body: ReplaceQuestionsRequest,
    ) -> ActixResult<HttpResponse> {
        questions::replace_questions(self, request, exam_id, body).await
    }
}

/// 写入前校验题目结构
fn validate_questions(exam_id: i64, title: &str, questions: &[QuestionInput]) -> Result<()> {
    if title.trim().is_empty() {
        return Err(ExamSystemError::validation("exam title must not be empty"));
    }
    preview_canonical(exam_id, title, questions).validate()
}

fn exam_error(err: &ExamSystemError) -> HttpResponse {
    let code = match err {
        ExamSystemError::NotFound(_) => ErrorCode::ExamNotFound,
        ExamSystemError::Validation(_) => ErrorCode::ExamInvalid,
        ExamSystemError::Conflict(_) => ErrorCode::ExamLocked,
        _ => err.error_code(),
    };
    if !err.is_client_error() {
        tracing::error!("Exam operation failed: {}", err);
    }
    ApiResponse::from_error_with(code, err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::exams::requests::OptionInput;

    fn question(correct: Option<usize>) -> QuestionInput {
        QuestionInput {
            text: "Q".to_string(),
            options: (0..3)
                .map(|i| OptionInput {
                    text: format!("O{i}"),
                    is_correct: Some(i) == correct,
                })
                .collect(),
        }
    }

    #[test]
    fn test_validate_questions() {
        assert!(validate_questions(0, "Final", &[question(Some(1))]).is_ok());
        assert!(validate_questions(0, "  ", &[question(Some(1))]).is_err());
        assert!(validate_questions(0, "Final", &[]).is_err());
        assert!(matches!(
            validate_questions(0, "Final", &[question(Some(0)), question(None)]),
            Err(ExamSystemError::Validation(_))
        ));
    }
}
