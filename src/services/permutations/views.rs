use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::{PermutationService, permutation_error};
use crate::models::ApiResponse;

// 渲染器输入，顺序只取自已保存的排列
pub async fn personalized_exam(
    service: &PermutationService,
    request: &HttpRequest,
    assignment_id: i64,
    student_id: i64,
) -> ActixResult<HttpResponse> {
    let engine = service.get_engine(request);
    match engine
        .randomization
        .personalized_exam(assignment_id, student_id)
        .await
    {
        Ok(view) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            view,
            "Personalized exam retrieved successfully",
        ))),
        Err(e) => Ok(permutation_error(&e)),
    }
}

pub async fn answer_key(
    service: &PermutationService,
    request: &HttpRequest,
    assignment_id: i64,
    student_id: i64,
) -> ActixResult<HttpResponse> {
    let engine = service.get_engine(request);
    match engine
        .randomization
        .answer_key(assignment_id, student_id)
        .await
    {
        Ok(key) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            key,
            "Answer key retrieved successfully",
        ))),
        Err(e) => Ok(permutation_error(&e)),
    }
}
