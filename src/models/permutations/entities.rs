use crate::engine::StudentPermutation;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// 已持久化的排列
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/permutation.ts")]
pub struct StoredPermutation {
    pub id: i64,
    pub permutation: StudentPermutation,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// 插入结果：由本次调用创建，或读回已存在的记录
#[derive(Debug, Clone, PartialEq)]
pub enum PermutationInsert {
    Created(StoredPermutation),
    Existing(StoredPermutation),
}

impl PermutationInsert {
    pub fn into_inner(self) -> StoredPermutation {
        match self {
            PermutationInsert::Created(p) | PermutationInsert::Existing(p) => p,
        }
    }

    pub fn was_created(&self) -> bool {
        matches!(self, PermutationInsert::Created(_))
    }
}
