//! 排列存储
//!
//! 每个 (考试关联, 学生) 恰好一份排列：首次需要时生成，之后只读。
//! 删除只能通过显式的 `reset`，且已有批改记录时拒绝。

use futures_util::{StreamExt, stream};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::{AssignmentContext, EngineLocks, EngineSettings, ensure_enrolled, load_assignment};
use crate::cache::{CacheResult, ObjectCache, get_json, insert_json};
use crate::engine::view::{self, AnswerKey, PersonalizedExam};
use crate::engine::{CanonicalExam, SeedMaterial, generate};
use crate::errors::{ExamSystemError, Result};
use crate::models::assignments::responses::{RosterFailure, RosterGenerationReport};
use crate::models::permutations::entities::{PermutationInsert, StoredPermutation};
use crate::storage::Storage;

fn cache_key(exam_assignment_id: i64, student_id: i64) -> String {
    format!("permutation:{exam_assignment_id}:{student_id}")
}

// 已保存的排列须与当前试卷结构一致，否则不能继续使用
fn check_structure(stored: &StoredPermutation, exam: &CanonicalExam) -> Result<()> {
    stored.permutation.validate_against(exam).inspect_err(|e| {
        warn!(
            "Stored permutation {} no longer matches exam {}: {}",
            stored.id, exam.exam_id, e
        )
    })
}

pub struct RandomizationStore {
    storage: Arc<dyn Storage>,
    cache: Arc<dyn ObjectCache>,
    locks: Arc<EngineLocks>,
    salt: String,
    cache_ttl: u64,
    roster_concurrency: usize,
}

impl RandomizationStore {
    pub fn new(
        storage: Arc<dyn Storage>,
        cache: Arc<dyn ObjectCache>,
        locks: Arc<EngineLocks>,
        settings: &EngineSettings,
    ) -> Self {
        Self {
            storage,
            cache,
            locks,
            salt: settings.algorithm_salt.clone(),
            cache_ttl: settings.cache_ttl,
            roster_concurrency: settings.roster_concurrency.max(1),
        }
    }

    /// 获取排列，不存在时生成并原子写入
    ///
    /// 并发调用同一个键时只会保存一份，所有调用者拿到同一个值。
    pub async fn get_or_create(
        &self,
        exam_assignment_id: i64,
        student_id: i64,
        exam: &CanonicalExam,
    ) -> Result<StoredPermutation> {
        self.obtain(exam_assignment_id, student_id, exam)
            .await
            .map(PermutationInsert::into_inner)
    }

    async fn obtain(
        &self,
        exam_assignment_id: i64,
        student_id: i64,
        exam: &CanonicalExam,
    ) -> Result<PermutationInsert> {
        let _guard = self
            .locks
            .permutations
            .lock((exam_assignment_id, student_id))
            .await;
        let key = cache_key(exam_assignment_id, student_id);

        match get_json::<StoredPermutation>(self.cache.as_ref(), &key).await {
            CacheResult::Found(stored) => {
                check_structure(&stored, exam)?;
                return Ok(PermutationInsert::Existing(stored));
            }
            CacheResult::Invalid(e) => {
                warn!("Discarding unreadable cached permutation {}: {}", key, e);
            }
            CacheResult::NotFound => {}
        }

        if let Some(stored) = self
            .storage
            .get_permutation(exam_assignment_id, student_id)
            .await?
        {
            check_structure(&stored, exam)?;
            insert_json(self.cache.as_ref(), key, &stored, self.cache_ttl).await;
            return Ok(PermutationInsert::Existing(stored));
        }

        exam.validate()?;
        let seed = SeedMaterial::with_salt(exam_assignment_id, student_id, self.salt.clone());
        let permutation = generate(exam, &seed)?;

        let outcome = self.storage.insert_permutation_if_absent(&permutation).await?;
        let stored = match &outcome {
            PermutationInsert::Created(stored) => {
                info!(
                    "Permutation created for assignment {} student {} (algorithm v{}, {} questions)",
                    exam_assignment_id,
                    student_id,
                    stored.permutation.algorithm_version,
                    stored.permutation.question_order.len()
                );
                stored
            }
            PermutationInsert::Existing(stored) => {
                debug!(
                    "Lost permutation race for assignment {} student {}, using stored value",
                    exam_assignment_id, student_id
                );
                stored
            }
        };
        insert_json(self.cache.as_ref(), key, stored, self.cache_ttl).await;

        Ok(outcome)
    }

    /// 解析关联与学生后获取排列
    pub async fn get_or_create_for_student(
        &self,
        exam_assignment_id: i64,
        student_id: i64,
    ) -> Result<(AssignmentContext, StoredPermutation)> {
        let context = load_assignment(self.storage.as_ref(), exam_assignment_id).await?;
        ensure_enrolled(self.storage.as_ref(), &context, student_id).await?;
        let stored = self
            .get_or_create(exam_assignment_id, student_id, &context.exam)
            .await?;
        Ok((context, stored))
    }

    /// 列出关联下已生成的排列（供批量渲染）
    pub async fn list_for_assignment(
        &self,
        exam_assignment_id: i64,
    ) -> Result<Vec<StoredPermutation>> {
        if self
            .storage
            .get_assignment_by_id(exam_assignment_id)
            .await?
            .is_none()
        {
            return Err(ExamSystemError::not_found(format!(
                "exam assignment {exam_assignment_id} not found"
            )));
        }
        self.storage
            .list_permutations_for_assignment(exam_assignment_id)
            .await
    }

    /// 删除排列，之后的 `get_or_create` 会重新生成
    pub async fn reset(&self, exam_assignment_id: i64, student_id: i64) -> Result<()> {
        let key = (exam_assignment_id, student_id);
        let _correction = self.locks.corrections.lock(key).await;
        let _permutation = self.locks.permutations.lock(key).await;

        let deleted = self
            .storage
            .delete_permutation(exam_assignment_id, student_id)
            .await
            .inspect_err(|e| {
                warn!(
                    "Permutation reset refused for assignment {} student {}: {}",
                    exam_assignment_id, student_id, e
                );
            })?;
        if !deleted {
            return Err(ExamSystemError::not_found(format!(
                "no permutation stored for student {student_id} in assignment {exam_assignment_id}"
            )));
        }

        self.cache
            .remove(&cache_key(exam_assignment_id, student_id))
            .await;
        warn!(
            "Permutation reset for assignment {} student {}; it will be regenerated on next request",
            exam_assignment_id, student_id
        );
        Ok(())
    }

    /// 删除考试关联及其全部排列，已有批改记录时拒绝
    pub async fn unlink(&self, exam_assignment_id: i64) -> Result<()> {
        let permutations = self
            .storage
            .list_permutations_for_assignment(exam_assignment_id)
            .await?;

        if !self.storage.delete_assignment(exam_assignment_id).await? {
            return Err(ExamSystemError::not_found(format!(
                "exam assignment {exam_assignment_id} not found"
            )));
        }

        for stored in &permutations {
            self.cache
                .remove(&cache_key(exam_assignment_id, stored.permutation.student_id))
                .await;
        }
        warn!(
            "Exam assignment {} unlinked, {} permutations removed",
            exam_assignment_id,
            permutations.len()
        );
        Ok(())
    }

    /// 为班级当前名单生成排列，学生之间并行
    pub async fn generate_for_roster(
        &self,
        context: &AssignmentContext,
    ) -> Result<RosterGenerationReport> {
        let exam_assignment_id = context.assignment.id;
        let roster = self
            .storage
            .list_students_by_class(context.assignment.class_id)
            .await?;

        let outcomes: Vec<(i64, Result<PermutationInsert>)> =
            stream::iter(roster.iter().map(|student| student.id))
                .map(|student_id| async move {
                    let outcome = self
                        .obtain(exam_assignment_id, student_id, &context.exam)
                        .await;
                    (student_id, outcome)
                })
                .buffer_unordered(self.roster_concurrency)
                .collect()
                .await;

        let mut report = RosterGenerationReport {
            roster_size: roster.len(),
            ..Default::default()
        };
        for (student_id, outcome) in outcomes {
            match outcome {
                Ok(PermutationInsert::Created(_)) => report.created += 1,
                Ok(PermutationInsert::Existing(_)) => report.existing += 1,
                Err(e) => {
                    warn!(
                        "Permutation generation failed for assignment {} student {}: {}",
                        exam_assignment_id, student_id, e
                    );
                    report.failed.push(RosterFailure {
                        student_id,
                        error: e.to_string(),
                    });
                }
            }
        }
        report.failed.sort_by_key(|f| f.student_id);

        info!(
            "Roster generation for assignment {}: {} created, {} existing, {} failed",
            exam_assignment_id,
            report.created,
            report.existing,
            report.failed.len()
        );
        Ok(report)
    }

    /// 按关联 ID 生成整班排列
    pub async fn generate_for_assignment(
        &self,
        exam_assignment_id: i64,
    ) -> Result<RosterGenerationReport> {
        let context = load_assignment(self.storage.as_ref(), exam_assignment_id).await?;
        self.generate_for_roster(&context).await
    }

    /// 学生看到的试卷顺序
    pub async fn personalized_exam(
        &self,
        exam_assignment_id: i64,
        student_id: i64,
    ) -> Result<PersonalizedExam> {
        let (context, stored) = self
            .get_or_create_for_student(exam_assignment_id, student_id)
            .await?;
        view::personalized_exam(&stored.permutation, &context.exam)
    }

    /// 学生专属答案
    pub async fn answer_key(&self, exam_assignment_id: i64, student_id: i64) -> Result<AnswerKey> {
        let (context, stored) = self
            .get_or_create_for_student(exam_assignment_id, student_id)
            .await?;
        view::answer_key(&stored.permutation, &context.exam)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Detection;
    use crate::models::corrections::entities::NewCorrection;
    use crate::storage::sea_orm_storage::tests::seed_assignment;
    use crate::stores::tests::test_engine;

    #[tokio::test]
    async fn test_get_or_create_is_idempotent() {
        let (engine, storage) = test_engine().await;
        let (assignment, students) = seed_assignment(&storage, &[0, 1, 2, 3], 1).await;

        let (_, first) = engine
            .randomization
            .get_or_create_for_student(assignment.id, students[0].id)
            .await
            .unwrap();
        let (_, second) = engine
            .randomization
            .get_or_create_for_student(assignment.id, students[0].id)
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(
            engine
                .randomization
                .list_for_assignment(assignment.id)
                .await
                .unwrap()
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn test_existing_permutation_rejected_for_changed_answer_key() {
        let (engine, storage) = test_engine().await;
        let (assignment, students) = seed_assignment(&storage, &[0, 1], 1).await;
        let context = load_assignment(engine.storage.as_ref(), assignment.id)
            .await
            .unwrap();
        let student_id = students[0].id;

        engine
            .randomization
            .get_or_create(assignment.id, student_id, &context.exam)
            .await
            .unwrap();

        let mut rekeyed = context.exam.clone();
        rekeyed.questions[0].options[0].is_correct = false;
        rekeyed.questions[0].options[2].is_correct = true;

        // 第一次命中缓存，清掉缓存后命中存储
        for _ in 0..2 {
            let err = engine
                .randomization
                .get_or_create(assignment.id, student_id, &rekeyed)
                .await
                .unwrap_err();
            assert!(matches!(err, ExamSystemError::Reconciliation(_)));
            engine
                .randomization
                .cache
                .remove(&cache_key(assignment.id, student_id))
                .await;
        }
    }

    #[tokio::test]
    async fn test_concurrent_get_or_create_stores_one_value() {
        let (engine, storage) = test_engine().await;
        let (assignment, students) = seed_assignment(&storage, &[0, 1, 2, 3, 0, 1], 1).await;
        let context = load_assignment(engine.storage.as_ref(), assignment.id)
            .await
            .unwrap();
        let student_id = students[0].id;

        let calls = (0..8).map(|_| {
            engine
                .randomization
                .get_or_create(assignment.id, student_id, &context.exam)
        });
        let results = futures_util::future::join_all(calls).await;

        let first = results[0].as_ref().unwrap();
        for result in &results {
            assert_eq!(result.as_ref().unwrap(), first);
        }
        let stored = storage
            .get_permutation(assignment.id, student_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(&stored, first);
    }

    #[tokio::test]
    async fn test_unknown_student_or_foreign_class() {
        let (engine, storage) = test_engine().await;
        let (assignment, _) = seed_assignment(&storage, &[0], 1).await;
        let (_, outsiders) = seed_assignment(&storage, &[0], 1).await;

        let err = engine
            .randomization
            .get_or_create_for_student(assignment.id, 9999)
            .await
            .unwrap_err();
        assert!(matches!(err, ExamSystemError::NotFound(_)));

        let err = engine
            .randomization
            .get_or_create_for_student(assignment.id, outsiders[0].id)
            .await
            .unwrap_err();
        assert!(matches!(err, ExamSystemError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_reset_regenerates_identically() {
        let (engine, storage) = test_engine().await;
        let (assignment, students) = seed_assignment(&storage, &[0, 1, 2, 3, 1], 1).await;
        let student_id = students[0].id;

        let (_, before) = engine
            .randomization
            .get_or_create_for_student(assignment.id, student_id)
            .await
            .unwrap();
        engine
            .randomization
            .reset(assignment.id, student_id)
            .await
            .unwrap();
        assert!(
            storage
                .get_permutation(assignment.id, student_id)
                .await
                .unwrap()
                .is_none()
        );

        let (_, after) = engine
            .randomization
            .get_or_create_for_student(assignment.id, student_id)
            .await
            .unwrap();
        assert_eq!(before.permutation, after.permutation);
    }

    #[tokio::test]
    async fn test_reset_without_permutation_is_not_found() {
        let (engine, storage) = test_engine().await;
        let (assignment, students) = seed_assignment(&storage, &[0], 1).await;
        let err = engine
            .randomization
            .reset(assignment.id, students[0].id)
            .await
            .unwrap_err();
        assert!(matches!(err, ExamSystemError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_reset_blocked_by_correction() {
        let (engine, storage) = test_engine().await;
        let (assignment, students) = seed_assignment(&storage, &[0, 1], 1).await;
        let student_id = students[0].id;

        let (_, stored) = engine
            .randomization
            .get_or_create_for_student(assignment.id, student_id)
            .await
            .unwrap();
        storage
            .insert_correction_if_absent(NewCorrection {
                exam_assignment_id: assignment.id,
                student_id,
                raw_detections: vec![Detection::NoMark, Detection::NoMark],
                score: 0,
                total: 2,
                grade: 0.0,
                needs_review: false,
                corrected_by: 1,
                corrected_at: chrono::Utc::now().timestamp(),
            })
            .await
            .unwrap();

        let err = engine
            .randomization
            .reset(assignment.id, student_id)
            .await
            .unwrap_err();
        assert!(matches!(err, ExamSystemError::Conflict(_)));

        let (_, still) = engine
            .randomization
            .get_or_create_for_student(assignment.id, student_id)
            .await
            .unwrap();
        assert_eq!(still, stored);
    }

    #[tokio::test]
    async fn test_generate_for_roster() {
        let (engine, storage) = test_engine().await;
        let (assignment, students) = seed_assignment(&storage, &[0, 1, 2], 6).await;

        engine
            .randomization
            .get_or_create_for_student(assignment.id, students[2].id)
            .await
            .unwrap();
        let report = engine
            .randomization
            .generate_for_assignment(assignment.id)
            .await
            .unwrap();

        assert_eq!(report.roster_size, 6);
        assert_eq!(report.created, 5);
        assert_eq!(report.existing, 1);
        assert!(report.failed.is_empty());

        let again = engine
            .randomization
            .generate_for_assignment(assignment.id)
            .await
            .unwrap();
        assert_eq!(again.created, 0);
        assert_eq!(again.existing, 6);
    }

    #[tokio::test]
    async fn test_views_read_stored_order() {
        let (engine, storage) = test_engine().await;
        let (assignment, students) = seed_assignment(&storage, &[3, 2, 1, 0], 1).await;
        let student_id = students[0].id;

        let view = engine
            .randomization
            .personalized_exam(assignment.id, student_id)
            .await
            .unwrap();
        let key = engine
            .randomization
            .answer_key(assignment.id, student_id)
            .await
            .unwrap();
        let stored = storage
            .get_permutation(assignment.id, student_id)
            .await
            .unwrap()
            .unwrap();

        let exam = load_assignment(engine.storage.as_ref(), assignment.id)
            .await
            .unwrap()
            .exam;

        assert_eq!(view.questions.len(), 4);
        assert_eq!(key.entries.len(), 4);
        for (position, question) in view.questions.iter().enumerate() {
            let canonical_q = stored.permutation.question_order[position];
            let canonical_o = stored.permutation.option_order[&canonical_q][0];
            assert_eq!(question.question_id, key.entries[position].question_id);
            assert_eq!(
                question.options[0].option_id,
                exam.questions[canonical_q].options[canonical_o].option_id
            );
        }
    }

    #[tokio::test]
    async fn test_unlink_removes_permutations() {
        let (engine, storage) = test_engine().await;
        let (assignment, _) = seed_assignment(&storage, &[0, 1], 3).await;
        engine
            .randomization
            .generate_for_assignment(assignment.id)
            .await
            .unwrap();

        engine.randomization.unlink(assignment.id).await.unwrap();
        assert!(
            storage
                .get_assignment_by_id(assignment.id)
                .await
                .unwrap()
                .is_none()
        );
        assert!(matches!(
            engine.randomization.unlink(assignment.id).await,
            Err(ExamSystemError::NotFound(_))
        ));
    }
}
