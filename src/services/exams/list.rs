use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::{ExamService, exam_error};
use crate::models::ApiResponse;
use crate::models::exams::requests::{ExamListQuery, ExamQueryParams};

pub async fn list_exams(
    service: &ExamService,
    request: &HttpRequest,
    query: ExamQueryParams,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);

    let list_query = ExamListQuery {
        page: Some(query.pagination.page),
        size: Some(query.pagination.size),
        search: query.search.filter(|s| !s.trim().is_empty()),
    };

    match storage.list_exams_with_pagination(list_query).await {
        Ok(response) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            response,
            "Exam list retrieved successfully",
        ))),
        Err(e) => Ok(exam_error(&e)),
    }
}
