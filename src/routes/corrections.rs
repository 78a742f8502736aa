use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::models::corrections::requests::SubmitCorrectionRequest;
use crate::services::CorrectionService;
use crate::utils::{SafeIDI64, SafeStudentIdI64};

// 懒加载的全局 CORRECTION_SERVICE 实例
static CORRECTION_SERVICE: Lazy<CorrectionService> = Lazy::new(CorrectionService::new_lazy);

pub async fn submit_correction(
    req: HttpRequest,
    assignment_id: SafeIDI64,
    student_id: SafeStudentIdI64,
    body: web::Json<SubmitCorrectionRequest>,
) -> ActixResult<HttpResponse> {
    CORRECTION_SERVICE
        .submit_correction(&req, assignment_id.0, student_id.0, body.into_inner())
        .await
}

pub async fn get_correction(
    req: HttpRequest,
    assignment_id: SafeIDI64,
    student_id: SafeStudentIdI64,
) -> ActixResult<HttpResponse> {
    CORRECTION_SERVICE
        .get_correction(&req, assignment_id.0, student_id.0)
        .await
}

pub async fn correction_history(
    req: HttpRequest,
    assignment_id: SafeIDI64,
    student_id: SafeStudentIdI64,
) -> ActixResult<HttpResponse> {
    CORRECTION_SERVICE
        .correction_history(&req, assignment_id.0, student_id.0)
        .await
}

pub async fn list_corrections(
    req: HttpRequest,
    assignment_id: SafeIDI64,
) -> ActixResult<HttpResponse> {
    CORRECTION_SERVICE
        .list_corrections(&req, assignment_id.0)
        .await
}

pub async fn statistics(req: HttpRequest, assignment_id: SafeIDI64) -> ActixResult<HttpResponse> {
    CORRECTION_SERVICE.statistics(&req, assignment_id.0).await
}

pub async fn export(req: HttpRequest, assignment_id: SafeIDI64) -> ActixResult<HttpResponse> {
    CORRECTION_SERVICE.export(&req, assignment_id.0).await
}

pub async fn scan(
    req: HttpRequest,
    payload: actix_multipart::Multipart,
) -> ActixResult<HttpResponse> {
    CORRECTION_SERVICE.scan(&req, payload).await
}

// 配置路由
pub fn configure_corrections_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/api/v1/corrections").route("/scan", web::post().to(scan)));
}
