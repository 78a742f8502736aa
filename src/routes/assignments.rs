use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use super::{corrections, permutations};
use crate::models::assignments::requests::{AssignmentListQuery, CreateAssignmentRequest};
use crate::services::AssignmentService;
use crate::utils::SafeIDI64;

// 懒加载的全局 ASSIGNMENT_SERVICE 实例
static ASSIGNMENT_SERVICE: Lazy<AssignmentService> = Lazy::new(AssignmentService::new_lazy);

// HTTP处理程序
pub async fn link(
    req: HttpRequest,
    body: web::Json<CreateAssignmentRequest>,
) -> ActixResult<HttpResponse> {
    ASSIGNMENT_SERVICE.link(&req, body.into_inner()).await
}

pub async fn list_assignments(
    req: HttpRequest,
    query: web::Query<AssignmentListQuery>,
) -> ActixResult<HttpResponse> {
    ASSIGNMENT_SERVICE
        .list_assignments(&req, query.into_inner())
        .await
}

pub async fn get_assignment(
    req: HttpRequest,
    assignment_id: SafeIDI64,
) -> ActixResult<HttpResponse> {
    ASSIGNMENT_SERVICE.get_assignment(&req, assignment_id.0).await
}

pub async fn unlink(req: HttpRequest, assignment_id: SafeIDI64) -> ActixResult<HttpResponse> {
    ASSIGNMENT_SERVICE.unlink(&req, assignment_id.0).await
}

// 配置路由
pub fn configure_assignments_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/assignments")
            .service(
                web::resource("")
                    .route(web::get().to(list_assignments))
                    // 关联后立即为当前名单生成排列
                    .route(web::post().to(link)),
            )
            .service(
                web::resource("/{id}")
                    .route(web::get().to(get_assignment))
                    // 存在批改记录时拒绝
                    .route(web::delete().to(unlink)),
            )
            .service(
                web::resource("/{id}/permutations")
                    .route(web::get().to(permutations::list_permutations)),
            )
            .service(
                web::resource("/{id}/permutations/generate")
                    .route(web::post().to(permutations::generate_for_roster)),
            )
            .service(
                web::resource("/{id}/students/{student_id}/permutation")
                    .route(web::get().to(permutations::get_permutation))
                    .route(web::delete().to(permutations::reset_permutation)),
            )
            .service(
                web::resource("/{id}/students/{student_id}/exam")
                    .route(web::get().to(permutations::personalized_exam)),
            )
            .service(
                web::resource("/{id}/students/{student_id}/answer-key")
                    .route(web::get().to(permutations::answer_key)),
            )
            .service(
                web::resource("/{id}/students/{student_id}/correction")
                    .route(web::get().to(corrections::get_correction))
                    .route(web::post().to(corrections::submit_correction)),
            )
            .service(
                web::resource("/{id}/students/{student_id}/correction/history")
                    .route(web::get().to(corrections::correction_history)),
            )
            .service(
                web::resource("/{id}/corrections")
                    .route(web::get().to(corrections::list_corrections)),
            )
            .service(
                web::resource("/{id}/corrections/export")
                    .route(web::get().to(corrections::export)),
            )
            .service(
                web::resource("/{id}/statistics").route(web::get().to(corrections::statistics)),
            ),
    );
}
