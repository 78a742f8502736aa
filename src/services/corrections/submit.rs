use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::{CorrectionService, correction_error};
use crate::models::ApiResponse;
use crate::models::corrections::requests::SubmitCorrectionRequest;

pub async fn submit_correction(
    service: &CorrectionService,
    request: &HttpRequest,
    assignment_id: i64,
    student_id: i64,
    body: SubmitCorrectionRequest,
) -> ActixResult<HttpResponse> {
    let engine = service.get_engine(request);

    let outcome = if body.force {
        engine
            .corrections
            .force_resubmit(
                assignment_id,
                student_id,
                body.raw_detections,
                body.corrected_by,
                body.reason,
            )
            .await
    } else {
        engine
            .corrections
            .submit(assignment_id, student_id, body.raw_detections, body.corrected_by)
            .await
    };

    match outcome {
        Ok(response) => Ok(HttpResponse::Created().json(ApiResponse::success(
            response,
            "Correction stored successfully",
        ))),
        Err(e) => Ok(correction_error(&e)),
    }
}
