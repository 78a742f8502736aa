//! 排列存储操作

use super::{SeaOrmStorage, is_unique_violation};
use crate::engine::StudentPermutation;
use crate::entity::correction_records::{
    Column as CorrectionColumn, Entity as CorrectionRecords,
};
use crate::entity::student_permutations::{ActiveModel, Column, Entity as StudentPermutations};
use crate::errors::{ExamSystemError, Result};
use crate::models::permutations::entities::{PermutationInsert, StoredPermutation};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use tracing::debug;

impl SeaOrmStorage {
    /// 原子插入排列
    ///
    /// 依赖 (exam_assignment_id, student_id) 唯一索引：插入失败于唯一约束时，
    /// 丢弃本次生成的值并读回已存在的记录。
    pub async fn insert_permutation_if_absent_impl(
        &self,
        permutation: &StudentPermutation,
    ) -> Result<PermutationInsert> {
        let model = ActiveModel {
            exam_assignment_id: Set(permutation.exam_assignment_id),
            student_id: Set(permutation.student_id),
            question_order: Set(serde_json::to_string(&permutation.question_order)?),
            option_order: Set(serde_json::to_string(&permutation.option_order)?),
            algorithm_version: Set(permutation.algorithm_version as i32),
            exam_fingerprint: Set(permutation.exam_fingerprint.clone()),
            created_at: Set(chrono::Utc::now().timestamp()),
            ..Default::default()
        };

        match model.insert(&self.db).await {
            Ok(inserted) => Ok(PermutationInsert::Created(inserted.into_stored()?)),
            Err(e) if is_unique_violation(&e) => {
                debug!(
                    "Permutation for assignment {} student {} already stored, reading back",
                    permutation.exam_assignment_id, permutation.student_id
                );
                let existing = self
                    .get_permutation_impl(permutation.exam_assignment_id, permutation.student_id)
                    .await?
                    .ok_or_else(|| {
                        ExamSystemError::database_operation(format!(
                            "permutation for assignment {} student {} vanished after unique conflict",
                            permutation.exam_assignment_id, permutation.student_id
                        ))
                    })?;
                Ok(PermutationInsert::Existing(existing))
            }
            Err(e) => Err(ExamSystemError::database_operation(format!(
                "保存排列失败: {e}"
            ))),
        }
    }

    pub async fn get_permutation_impl(
        &self,
        assignment_id: i64,
        student_id: i64,
    ) -> Result<Option<StoredPermutation>> {
        let result = StudentPermutations::find()
            .filter(Column::ExamAssignmentId.eq(assignment_id))
            .filter(Column::StudentId.eq(student_id))
            .one(&self.db)
            .await
            .map_err(|e| ExamSystemError::database_operation(format!("查询排列失败: {e}")))?;

        result.map(|m| m.into_stored()).transpose()
    }

    pub async fn list_permutations_for_assignment_impl(
        &self,
        assignment_id: i64,
    ) -> Result<Vec<StoredPermutation>> {
        let models = StudentPermutations::find()
            .filter(Column::ExamAssignmentId.eq(assignment_id))
            .order_by_asc(Column::StudentId)
            .all(&self.db)
            .await
            .map_err(|e| ExamSystemError::database_operation(format!("查询排列列表失败: {e}")))?;

        models.into_iter().map(|m| m.into_stored()).collect()
    }

    /// 删除排列，存在批改记录时拒绝
    pub async fn delete_permutation_impl(&self, assignment_id: i64, student_id: i64) -> Result<bool> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| ExamSystemError::database_operation(format!("开启事务失败: {e}")))?;

        let corrections = CorrectionRecords::find()
            .filter(CorrectionColumn::ExamAssignmentId.eq(assignment_id))
            .filter(CorrectionColumn::StudentId.eq(student_id))
            .count(&txn)
            .await
            .map_err(|e| ExamSystemError::database_operation(format!("查询批改记录失败: {e}")))?;
        if corrections > 0 {
            return Err(ExamSystemError::conflict(format!(
                "permutation for assignment {assignment_id} student {student_id} is referenced by a correction record"
            )));
        }

        let result = StudentPermutations::delete_many()
            .filter(Column::ExamAssignmentId.eq(assignment_id))
            .filter(Column::StudentId.eq(student_id))
            .exec(&txn)
            .await
            .map_err(|e| ExamSystemError::database_operation(format!("删除排列失败: {e}")))?;

        txn.commit()
            .await
            .map_err(|e| ExamSystemError::database_operation(format!("提交事务失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }
}
