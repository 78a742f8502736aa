//! 排列相关的处理程序，挂载在 `/api/v1/assignments` 下

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use once_cell::sync::Lazy;

use crate::services::PermutationService;
use crate::utils::{SafeIDI64, SafeStudentIdI64};

// 懒加载的全局 PERMUTATION_SERVICE 实例
static PERMUTATION_SERVICE: Lazy<PermutationService> = Lazy::new(PermutationService::new_lazy);

pub async fn generate_for_roster(
    req: HttpRequest,
    assignment_id: SafeIDI64,
) -> ActixResult<HttpResponse> {
    PERMUTATION_SERVICE
        .generate_for_roster(&req, assignment_id.0)
        .await
}

pub async fn list_permutations(
    req: HttpRequest,
    assignment_id: SafeIDI64,
) -> ActixResult<HttpResponse> {
    PERMUTATION_SERVICE
        .list_permutations(&req, assignment_id.0)
        .await
}

pub async fn get_permutation(
    req: HttpRequest,
    assignment_id: SafeIDI64,
    student_id: SafeStudentIdI64,
) -> ActixResult<HttpResponse> {
    PERMUTATION_SERVICE
        .get_permutation(&req, assignment_id.0, student_id.0)
        .await
}

pub async fn reset_permutation(
    req: HttpRequest,
    assignment_id: SafeIDI64,
    student_id: SafeStudentIdI64,
) -> ActixResult<HttpResponse> {
    PERMUTATION_SERVICE
        .reset_permutation(&req, assignment_id.0, student_id.0)
        .await
}

pub async fn personalized_exam(
    req: HttpRequest,
    assignment_id: SafeIDI64,
    student_id: SafeStudentIdI64,
) -> ActixResult<HttpResponse> {
    PERMUTATION_SERVICE
        .personalized_exam(&req, assignment_id.0, student_id.0)
        .await
}

pub async fn answer_key(
    req: HttpRequest,
    assignment_id: SafeIDI64,
    student_id: SafeStudentIdI64,
) -> ActixResult<HttpResponse> {
    PERMUTATION_SERVICE
        .answer_key(&req, assignment_id.0, student_id.0)
        .await
}
