use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::{PermutationService, permutation_error};
use crate::models::ApiResponse;

pub async fn generate_for_roster(
    service: &PermutationService,
    request: &HttpRequest,
    assignment_id: i64,
) -> ActixResult<HttpResponse> {
    let engine = service.get_engine(request);
    match engine
        .randomization
        .generate_for_assignment(assignment_id)
        .await
    {
        Ok(report) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            report,
            "Permutations generated for roster",
        ))),
        Err(e) => Ok(permutation_error(&e)),
    }
}
