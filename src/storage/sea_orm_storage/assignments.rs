//! 试卷关联存储操作

use super::{SeaOrmStorage, is_unique_violation};
use crate::entity::correction_records::{
    Column as CorrectionColumn, Entity as CorrectionRecords,
};
use crate::entity::exam_assignments::{ActiveModel, Column, Entity as ExamAssignments};
use crate::entity::student_permutations::{
    Column as PermutationColumn, Entity as StudentPermutations,
};
use crate::errors::{ExamSystemError, Result};
use crate::models::assignments::{entities::ExamAssignment, requests::AssignmentListQuery};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};

impl SeaOrmStorage {
    /// 创建关联，(班级, 试卷) 唯一
    pub async fn create_assignment_impl(
        &self,
        class_id: i64,
        exam_id: i64,
    ) -> Result<ExamAssignment> {
        let model = ActiveModel {
            class_id: Set(class_id),
            exam_id: Set(exam_id),
            created_at: Set(chrono::Utc::now().timestamp()),
            ..Default::default()
        };

        let result = model.insert(&self.db).await.map_err(|e| {
            if is_unique_violation(&e) {
                ExamSystemError::conflict(format!(
                    "exam {exam_id} is already linked to class {class_id}"
                ))
            } else {
                ExamSystemError::database_operation(format!("创建试卷关联失败: {e}"))
            }
        })?;

        Ok(result.into_assignment())
    }

    pub async fn get_assignment_by_id_impl(
        &self,
        assignment_id: i64,
    ) -> Result<Option<ExamAssignment>> {
        let result = ExamAssignments::find_by_id(assignment_id)
            .one(&self.db)
            .await
            .map_err(|e| ExamSystemError::database_operation(format!("查询试卷关联失败: {e}")))?;

        Ok(result.map(|m| m.into_assignment()))
    }

    pub async fn find_assignment_impl(
        &self,
        class_id: i64,
        exam_id: i64,
    ) -> Result<Option<ExamAssignment>> {
        let result = ExamAssignments::find()
            .filter(Column::ClassId.eq(class_id))
            .filter(Column::ExamId.eq(exam_id))
            .one(&self.db)
            .await
            .map_err(|e| ExamSystemError::database_operation(format!("查询试卷关联失败: {e}")))?;

        Ok(result.map(|m| m.into_assignment()))
    }

    pub async fn list_assignments_impl(
        &self,
        query: AssignmentListQuery,
    ) -> Result<Vec<ExamAssignment>> {
        let mut select = ExamAssignments::find();

        if let Some(class_id) = query.class_id {
            select = select.filter(Column::ClassId.eq(class_id));
        }
        if let Some(exam_id) = query.exam_id {
            select = select.filter(Column::ExamId.eq(exam_id));
        }

        let assignments = select
            .order_by_desc(Column::CreatedAt)
            .order_by_desc(Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| ExamSystemError::database_operation(format!("查询试卷关联列表失败: {e}")))?;

        Ok(assignments.into_iter().map(|m| m.into_assignment()).collect())
    }

    /// 删除关联
    ///
    /// 存在批改记录时拒绝；否则连同排列一起删除。
    pub async fn delete_assignment_impl(&self, assignment_id: i64) -> Result<bool> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| ExamSystemError::database_operation(format!("开启事务失败: {e}")))?;

        let corrections = CorrectionRecords::find()
            .filter(CorrectionColumn::ExamAssignmentId.eq(assignment_id))
            .count(&txn)
            .await
            .map_err(|e| ExamSystemError::database_operation(format!("统计批改记录失败: {e}")))?;
        if corrections > 0 {
            return Err(ExamSystemError::conflict(format!(
                "assignment {assignment_id} has {corrections} correction record(s) and cannot be unlinked"
            )));
        }

        StudentPermutations::delete_many()
            .filter(PermutationColumn::ExamAssignmentId.eq(assignment_id))
            .exec(&txn)
            .await
            .map_err(|e| ExamSystemError::database_operation(format!("删除排列失败: {e}")))?;

        let result = ExamAssignments::delete_by_id(assignment_id)
            .exec(&txn)
            .await
            .map_err(|e| ExamSystemError::database_operation(format!("删除试卷关联失败: {e}")))?;

        txn.commit()
            .await
            .map_err(|e| ExamSystemError::database_operation(format!("提交事务失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{memory_storage, seed_assignment};
    use super::*;
    use crate::engine::{SeedMaterial, generate};

    #[tokio::test]
    async fn test_duplicate_link_conflicts() {
        let storage = memory_storage().await;
        let (assignment, _) = seed_assignment(&storage, &[0], 0).await;

        let err = storage
            .create_assignment_impl(assignment.class_id, assignment.exam_id)
            .await
            .unwrap_err();
        assert!(matches!(err, ExamSystemError::Conflict(_)));

        let found = storage
            .find_assignment_impl(assignment.class_id, assignment.exam_id)
            .await
            .unwrap();
        assert_eq!(found, Some(assignment));
    }

    #[tokio::test]
    async fn test_list_filters() {
        let storage = memory_storage().await;
        let (first, _) = seed_assignment(&storage, &[0], 0).await;
        let (second, _) = seed_assignment(&storage, &[1], 0).await;

        let all = storage
            .list_assignments_impl(AssignmentListQuery::default())
            .await
            .unwrap();
        assert_eq!(all.len(), 2);

        let by_class = storage
            .list_assignments_impl(AssignmentListQuery {
                class_id: Some(second.class_id),
                exam_id: None,
            })
            .await
            .unwrap();
        assert_eq!(by_class, vec![second]);

        let by_exam = storage
            .list_assignments_impl(AssignmentListQuery {
                class_id: None,
                exam_id: Some(first.exam_id),
            })
            .await
            .unwrap();
        assert_eq!(by_exam, vec![first]);
    }

    #[tokio::test]
    async fn test_unlink_cascades_permutations() {
        let storage = memory_storage().await;
        let (assignment, roster) = seed_assignment(&storage, &[0, 1], 2).await;
        let exam = storage
            .get_canonical_exam_impl(assignment.exam_id)
            .await
            .unwrap()
            .unwrap();
        for student in &roster {
            let permutation = generate(&exam, &SeedMaterial::new(assignment.id, student.id)).unwrap();
            storage
                .insert_permutation_if_absent_impl(&permutation)
                .await
                .unwrap();
        }

        assert!(storage.delete_assignment_impl(assignment.id).await.unwrap());
        assert!(
            storage
                .list_permutations_for_assignment_impl(assignment.id)
                .await
                .unwrap()
                .is_empty()
        );
        assert!(!storage.delete_assignment_impl(assignment.id).await.unwrap());
    }
}
