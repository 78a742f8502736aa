use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::{CorrectionService, correction_error};
use crate::models::ApiResponse;

pub async fn get_statistics(
    service: &CorrectionService,
    request: &HttpRequest,
    assignment_id: i64,
) -> ActixResult<HttpResponse> {
    let engine = service.get_engine(request);
    match engine
        .corrections
        .aggregate_for_assignment(assignment_id)
        .await
    {
        Ok(stats) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            stats,
            "Statistics retrieved successfully",
        ))),
        Err(e) => Ok(correction_error(&e)),
    }
}

pub async fn export_corrections(
    service: &CorrectionService,
    request: &HttpRequest,
    assignment_id: i64,
) -> ActixResult<HttpResponse> {
    let engine = service.get_engine(request);
    match engine.corrections.export_csv(assignment_id).await {
        Ok(data) => Ok(HttpResponse::Ok()
            .content_type("text/csv; charset=utf-8")
            .insert_header(ContentDisposition {
                disposition: DispositionType::Attachment,
                parameters: vec![DispositionParam::Filename(format!(
                    "assignment_{assignment_id}_corrections.csv"
                ))],
            })
            .body(data)),
        Err(e) => Ok(correction_error(&e)),
    }
}
