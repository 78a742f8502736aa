use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::models::exams::requests::{CreateExamRequest, ExamQueryParams, ReplaceQuestionsRequest};
use crate::services::ExamService;
use crate::utils::SafeIDI64;

// 懒加载的全局 EXAM_SERVICE 实例
static EXAM_SERVICE: Lazy<ExamService> = Lazy::new(ExamService::new_lazy);

// HTTP处理程序
pub async fn list_exams(
    req: HttpRequest,
    query: web::Query<ExamQueryParams>,
) -> ActixResult<HttpResponse> {
    EXAM_SERVICE.list_exams(&req, query.into_inner()).await
}

pub async fn create_exam(
    req: HttpRequest,
    exam_data: web::Json<CreateExamRequest>,
) -> ActixResult<HttpResponse> {
    EXAM_SERVICE.create_exam(&req, exam_data.into_inner()).await
}

pub async fn get_exam(req: HttpRequest, exam_id: SafeIDI64) -> ActixResult<HttpResponse> {
    EXAM_SERVICE.get_exam(&req, exam_id.0).await
}

pub async fn replace_questions(
    req: HttpRequest,
    exam_id: SafeIDI64,
    body: web::Json<ReplaceQuestionsRequest>,
) -> ActixResult<HttpResponse> {
    EXAM_SERVICE
        .replace_questions(&req, exam_id.0, body.into_inner())
        .await
}

// 配置路由
pub fn configure_exams_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/exams")
            .service(
                web::resource("")
                    .route(web::get().to(list_exams))
                    .route(web::post().to(create_exam)),
            )
            .service(web::resource("/{id}").route(web::get().to(get_exam)))
            .service(
                // 已生成排列的试卷不可再修改
                web::resource("/{id}/questions").route(web::put().to(replace_questions)),
            ),
    );
}
