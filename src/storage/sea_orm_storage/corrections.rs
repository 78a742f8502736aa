//! 批改存储操作

use super::{SeaOrmStorage, is_unique_violation};
use crate::entity::correction_audits::{
    ActiveModel as AuditActiveModel, Column as AuditColumn, Entity as CorrectionAudits,
};
use crate::entity::correction_records::{ActiveModel, Column, Entity as CorrectionRecords};
use crate::errors::{ExamSystemError, Result};
use crate::models::corrections::entities::{
    CorrectionAudit, CorrectionInsert, CorrectionRecord, NewCorrection,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};

impl SeaOrmStorage {
    /// 原子插入批改记录，唯一键冲突时返回已存在的记录
    pub async fn insert_correction_if_absent_impl(
        &self,
        correction: NewCorrection,
    ) -> Result<CorrectionInsert> {
        let model = ActiveModel {
            exam_assignment_id: Set(correction.exam_assignment_id),
            student_id: Set(correction.student_id),
            raw_detections: Set(serde_json::to_string(&correction.raw_detections)?),
            score: Set(correction.score as i32),
            total: Set(correction.total as i32),
            grade: Set(correction.grade),
            needs_review: Set(correction.needs_review),
            corrected_by: Set(correction.corrected_by),
            corrected_at: Set(correction.corrected_at),
            revision: Set(1),
            ..Default::default()
        };

        match model.insert(&self.db).await {
            Ok(inserted) => Ok(CorrectionInsert::Created(inserted.into_record()?)),
            Err(e) if is_unique_violation(&e) => {
                let existing = self
                    .get_correction_impl(correction.exam_assignment_id, correction.student_id)
                    .await?
                    .ok_or_else(|| {
                        ExamSystemError::database_operation(format!(
                            "correction for assignment {} student {} vanished after unique conflict",
                            correction.exam_assignment_id, correction.student_id
                        ))
                    })?;
                Ok(CorrectionInsert::Existing(existing))
            }
            Err(e) => Err(ExamSystemError::database_operation(format!(
                "保存批改记录失败: {e}"
            ))),
        }
    }

    pub async fn get_correction_impl(
        &self,
        assignment_id: i64,
        student_id: i64,
    ) -> Result<Option<CorrectionRecord>> {
        let result = CorrectionRecords::find()
            .filter(Column::ExamAssignmentId.eq(assignment_id))
            .filter(Column::StudentId.eq(student_id))
            .one(&self.db)
            .await
            .map_err(|e| ExamSystemError::database_operation(format!("查询批改记录失败: {e}")))?;

        result.map(|m| m.into_record()).transpose()
    }

    pub async fn list_corrections_for_assignment_impl(
        &self,
        assignment_id: i64,
    ) -> Result<Vec<CorrectionRecord>> {
        let models = CorrectionRecords::find()
            .filter(Column::ExamAssignmentId.eq(assignment_id))
            .order_by_asc(Column::StudentId)
            .all(&self.db)
            .await
            .map_err(|e| {
                ExamSystemError::database_operation(format!("查询批改记录列表失败: {e}"))
            })?;

        models.into_iter().map(|m| m.into_record()).collect()
    }

    /// 覆盖批改记录
    ///
    /// 旧值与新值写入审计表，与记录更新处于同一事务。
    pub async fn overwrite_correction_impl(
        &self,
        correction_id: i64,
        correction: NewCorrection,
        reason: Option<String>,
    ) -> Result<(CorrectionRecord, CorrectionAudit)> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| ExamSystemError::database_operation(format!("开启事务失败: {e}")))?;

        let previous = CorrectionRecords::find_by_id(correction_id)
            .one(&txn)
            .await
            .map_err(|e| ExamSystemError::database_operation(format!("查询批改记录失败: {e}")))?
            .ok_or_else(|| {
                ExamSystemError::not_found(format!("correction {correction_id} not found"))
            })?;

        let new_raw = serde_json::to_string(&correction.raw_detections)?;
        let revision = previous.revision + 1;

        let audit = AuditActiveModel {
            correction_id: Set(previous.id),
            exam_assignment_id: Set(previous.exam_assignment_id),
            student_id: Set(previous.student_id),
            revision: Set(revision),
            previous_raw_detections: Set(previous.raw_detections.clone()),
            previous_score: Set(previous.score),
            previous_total: Set(previous.total),
            previous_corrected_by: Set(previous.corrected_by),
            previous_corrected_at: Set(previous.corrected_at),
            new_raw_detections: Set(new_raw.clone()),
            new_score: Set(correction.score as i32),
            new_total: Set(correction.total as i32),
            changed_by: Set(correction.corrected_by),
            changed_at: Set(correction.corrected_at),
            reason: Set(reason),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(|e| ExamSystemError::database_operation(format!("写入批改审计失败: {e}")))?;

        let mut model: ActiveModel = previous.into();
        model.raw_detections = Set(new_raw);
        model.score = Set(correction.score as i32);
        model.total = Set(correction.total as i32);
        model.grade = Set(correction.grade);
        model.needs_review = Set(correction.needs_review);
        model.corrected_by = Set(correction.corrected_by);
        model.corrected_at = Set(correction.corrected_at);
        model.revision = Set(revision);
        let updated = model
            .update(&txn)
            .await
            .map_err(|e| ExamSystemError::database_operation(format!("更新批改记录失败: {e}")))?;

        txn.commit()
            .await
            .map_err(|e| ExamSystemError::database_operation(format!("提交事务失败: {e}")))?;

        Ok((updated.into_record()?, audit.into_audit()?))
    }

    pub async fn list_correction_audits_impl(
        &self,
        assignment_id: i64,
        student_id: i64,
    ) -> Result<Vec<CorrectionAudit>> {
        let models = CorrectionAudits::find()
            .filter(AuditColumn::ExamAssignmentId.eq(assignment_id))
            .filter(AuditColumn::StudentId.eq(student_id))
            .order_by_asc(AuditColumn::Revision)
            .all(&self.db)
            .await
            .map_err(|e| ExamSystemError::database_operation(format!("查询批改审计失败: {e}")))?;

        models.into_iter().map(|m| m.into_audit()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{memory_storage, seed_assignment};
    use super::*;
    use crate::engine::{Detection, SeedMaterial, generate};

    fn new_correction(assignment_id: i64, student_id: i64, score: u32, by: i64) -> NewCorrection {
        NewCorrection {
            exam_assignment_id: assignment_id,
            student_id,
            raw_detections: vec![Detection::Single { slot: 0 }, Detection::NoMark],
            score,
            total: 2,
            grade: score as f64 * 5.0,
            needs_review: false,
            corrected_by: by,
            corrected_at: 1_700_000_000 + score as i64,
        }
    }

    #[tokio::test]
    async fn test_second_insert_returns_existing() {
        let storage = memory_storage().await;
        let (assignment, roster) = seed_assignment(&storage, &[0, 1], 1).await;

        let created = storage
            .insert_correction_if_absent_impl(new_correction(assignment.id, roster[0].id, 1, 7))
            .await
            .unwrap();
        let CorrectionInsert::Created(record) = created else {
            panic!("first insert should create");
        };
        assert_eq!(record.revision, 1);
        assert_eq!(record.raw_detections.len(), 2);

        let again = storage
            .insert_correction_if_absent_impl(new_correction(assignment.id, roster[0].id, 2, 8))
            .await
            .unwrap();
        assert_eq!(again, CorrectionInsert::Existing(record));
    }

    #[tokio::test]
    async fn test_overwrite_keeps_audit_trail() {
        let storage = memory_storage().await;
        let (assignment, roster) = seed_assignment(&storage, &[0, 1], 1).await;
        let CorrectionInsert::Created(original) = storage
            .insert_correction_if_absent_impl(new_correction(assignment.id, roster[0].id, 1, 7))
            .await
            .unwrap()
        else {
            panic!("first insert should create");
        };

        let mut replacement = new_correction(assignment.id, roster[0].id, 2, 9);
        replacement.raw_detections = vec![Detection::Single { slot: 0 }, Detection::Single { slot: 1 }];
        let (updated, audit) = storage
            .overwrite_correction_impl(original.id, replacement, Some("rescanned".to_string()))
            .await
            .unwrap();

        assert_eq!(updated.id, original.id);
        assert_eq!(updated.score, 2);
        assert_eq!(updated.revision, 2);
        assert_eq!(audit.previous_score, 1);
        assert_eq!(audit.previous_corrected_by, 7);
        assert_eq!(audit.previous_raw_detections, original.raw_detections);
        assert_eq!(audit.new_score, 2);
        assert_eq!(audit.changed_by, 9);

        let history = storage
            .list_correction_audits_impl(assignment.id, roster[0].id)
            .await
            .unwrap();
        assert_eq!(history, vec![audit]);

        let err = storage
            .overwrite_correction_impl(999, new_correction(assignment.id, roster[0].id, 0, 1), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ExamSystemError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_correction_blocks_reset_and_unlink() {
        let storage = memory_storage().await;
        let (assignment, roster) = seed_assignment(&storage, &[0, 1], 1).await;
        let exam = storage
            .get_canonical_exam_impl(assignment.exam_id)
            .await
            .unwrap()
            .unwrap();
        let permutation = generate(&exam, &SeedMaterial::new(assignment.id, roster[0].id)).unwrap();
        storage
            .insert_permutation_if_absent_impl(&permutation)
            .await
            .unwrap();
        storage
            .insert_correction_if_absent_impl(new_correction(assignment.id, roster[0].id, 1, 7))
            .await
            .unwrap();

        let err = storage
            .delete_permutation_impl(assignment.id, roster[0].id)
            .await
            .unwrap_err();
        assert!(matches!(err, ExamSystemError::Conflict(_)));
        assert!(
            storage
                .get_permutation_impl(assignment.id, roster[0].id)
                .await
                .unwrap()
                .is_some()
        );

        let err = storage.delete_assignment_impl(assignment.id).await.unwrap_err();
        assert!(matches!(err, ExamSystemError::Conflict(_)));
        assert_eq!(
            storage
                .list_corrections_for_assignment_impl(assignment.id)
                .await
                .unwrap()
                .len(),
            1
        );
    }
}
