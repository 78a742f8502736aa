use super::entities::StoredPermutation;
use serde::Serialize;
use ts_rs::TS;

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/permutation.ts")]
pub struct PermutationListResponse {
    pub exam_assignment_id: i64,
    pub items: Vec<StoredPermutation>,
}
