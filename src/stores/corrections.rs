//! 批改存储与成绩汇总
//!
//! 每个 (考试关联, 学生) 至多一份已接受的批改。重复提交返回冲突，
//! 只有显式的强制重批会覆盖，并把旧结果写入审计表。

use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

use super::{AssignmentContext, EngineLocks, EngineSettings, ensure_enrolled, load_assignment};
use crate::engine::statistics::{self, AssignmentStatistics};
use crate::engine::{CanonicalExam, CorrectionResult, Detection, StudentPermutation, reconcile};
use crate::errors::{ExamSystemError, Result};
use crate::models::corrections::entities::{
    CorrectionAudit, CorrectionInsert, CorrectionRecord, NewCorrection,
};
use crate::models::corrections::responses::CorrectionResponse;
use crate::stores::RandomizationStore;
use crate::storage::Storage;

pub struct CorrectionStore {
    storage: Arc<dyn Storage>,
    randomization: Arc<RandomizationStore>,
    locks: Arc<EngineLocks>,
    grade_scale: f64,
}

/// 对账失败时记录日志，整卷不计分
fn score_sheet(
    permutation: &StudentPermutation,
    exam: &CanonicalExam,
    raw_detections: &[Detection],
) -> Result<CorrectionResult> {
    reconcile(permutation, exam, raw_detections).inspect_err(|e| {
        warn!(
            "Reconciliation failed for assignment {} student {}: {}",
            permutation.exam_assignment_id, permutation.student_id, e
        );
    })
}

impl CorrectionStore {
    pub fn new(
        storage: Arc<dyn Storage>,
        randomization: Arc<RandomizationStore>,
        locks: Arc<EngineLocks>,
        settings: &EngineSettings,
    ) -> Self {
        Self {
            storage,
            randomization,
            locks,
            grade_scale: settings.grade_scale,
        }
    }

    fn new_correction(
        &self,
        permutation: &StudentPermutation,
        raw_detections: Vec<Detection>,
        result: &CorrectionResult,
        corrected_by: i64,
    ) -> NewCorrection {
        NewCorrection {
            exam_assignment_id: permutation.exam_assignment_id,
            student_id: permutation.student_id,
            raw_detections,
            score: result.score,
            total: result.total,
            grade: result.grade(self.grade_scale),
            needs_review: result.needs_review,
            corrected_by,
            corrected_at: chrono::Utc::now().timestamp(),
        }
    }

    fn duplicate(existing: &CorrectionRecord) -> ExamSystemError {
        warn!(
            "Duplicate correction rejected for assignment {} student {} (existing revision {} at {})",
            existing.exam_assignment_id,
            existing.student_id,
            existing.revision,
            existing.corrected_at.to_rfc3339()
        );
        ExamSystemError::conflict(format!(
            "student {} in assignment {} was already corrected at {}",
            existing.student_id,
            existing.exam_assignment_id,
            existing.corrected_at.to_rfc3339()
        ))
    }

    /// 提交识别结果并保存批改
    ///
    /// 排列不存在时先生成；已有批改时返回 `Conflict`。
    pub async fn submit(
        &self,
        exam_assignment_id: i64,
        student_id: i64,
        raw_detections: Vec<Detection>,
        corrected_by: i64,
    ) -> Result<CorrectionResponse> {
        let context = load_assignment(self.storage.as_ref(), exam_assignment_id).await?;
        ensure_enrolled(self.storage.as_ref(), &context, student_id).await?;

        let _guard = self
            .locks
            .corrections
            .lock((exam_assignment_id, student_id))
            .await;

        if let Some(existing) = self
            .storage
            .get_correction(exam_assignment_id, student_id)
            .await?
        {
            return Err(Self::duplicate(&existing));
        }

        let stored = self
            .randomization
            .get_or_create(exam_assignment_id, student_id, &context.exam)
            .await?;
        let result = score_sheet(&stored.permutation, &context.exam, &raw_detections)?;
        let correction =
            self.new_correction(&stored.permutation, raw_detections, &result, corrected_by);

        match self.storage.insert_correction_if_absent(correction).await? {
            CorrectionInsert::Created(record) => {
                info!(
                    "Correction stored for assignment {} student {}: {}/{}{}",
                    exam_assignment_id,
                    student_id,
                    record.score,
                    record.total,
                    if record.needs_review { " (needs review)" } else { "" }
                );
                Ok(CorrectionResponse { record, result })
            }
            CorrectionInsert::Existing(existing) => Err(Self::duplicate(&existing)),
        }
    }

    /// 强制重批：覆盖已有记录并写入审计，不存在时直接创建
    pub async fn force_resubmit(
        &self,
        exam_assignment_id: i64,
        student_id: i64,
        raw_detections: Vec<Detection>,
        corrected_by: i64,
        reason: Option<String>,
    ) -> Result<CorrectionResponse> {
        let context = load_assignment(self.storage.as_ref(), exam_assignment_id).await?;
        ensure_enrolled(self.storage.as_ref(), &context, student_id).await?;

        let _guard = self
            .locks
            .corrections
            .lock((exam_assignment_id, student_id))
            .await;

        let stored = self
            .randomization
            .get_or_create(exam_assignment_id, student_id, &context.exam)
            .await?;
        let result = score_sheet(&stored.permutation, &context.exam, &raw_detections)?;
        let correction =
            self.new_correction(&stored.permutation, raw_detections, &result, corrected_by);

        let existing = match self
            .storage
            .get_correction(exam_assignment_id, student_id)
            .await?
        {
            Some(existing) => existing,
            None => match self
                .storage
                .insert_correction_if_absent(correction.clone())
                .await?
            {
                CorrectionInsert::Created(record) => {
                    info!(
                        "Forced correction created first record for assignment {} student {}: {}/{}",
                        exam_assignment_id, student_id, record.score, record.total
                    );
                    return Ok(CorrectionResponse { record, result });
                }
                CorrectionInsert::Existing(existing) => existing,
            },
        };

        let (record, audit) = self
            .storage
            .overwrite_correction(existing.id, correction, reason)
            .await?;
        warn!(
            "Forced re-correction for assignment {} student {} by {}: score {}/{} -> {}/{} (revision {})",
            exam_assignment_id,
            student_id,
            corrected_by,
            audit.previous_score,
            audit.previous_total,
            audit.new_score,
            audit.new_total,
            record.revision
        );

        Ok(CorrectionResponse { record, result })
    }

    /// 由保存的识别结果重新推导逐题结果
    async fn hydrate(
        &self,
        context: &AssignmentContext,
        record: &CorrectionRecord,
    ) -> Result<CorrectionResult> {
        let stored = self
            .storage
            .get_permutation(record.exam_assignment_id, record.student_id)
            .await?
            .ok_or_else(|| {
                ExamSystemError::reconciliation(format!(
                    "correction {} has no stored permutation for student {}",
                    record.id, record.student_id
                ))
            })?;
        score_sheet(&stored.permutation, &context.exam, &record.raw_detections)
    }

    pub async fn get(&self, exam_assignment_id: i64, student_id: i64) -> Result<CorrectionResponse> {
        let context = load_assignment(self.storage.as_ref(), exam_assignment_id).await?;
        let record = self
            .storage
            .get_correction(exam_assignment_id, student_id)
            .await?
            .ok_or_else(|| {
                ExamSystemError::not_found(format!(
                    "no correction for student {student_id} in assignment {exam_assignment_id}"
                ))
            })?;
        let result = self.hydrate(&context, &record).await?;
        Ok(CorrectionResponse { record, result })
    }

    pub async fn list(&self, exam_assignment_id: i64) -> Result<Vec<CorrectionRecord>> {
        load_assignment(self.storage.as_ref(), exam_assignment_id).await?;
        self.storage
            .list_corrections_for_assignment(exam_assignment_id)
            .await
    }

    /// 强制重批的审计历史，按修订号升序
    pub async fn history(
        &self,
        exam_assignment_id: i64,
        student_id: i64,
    ) -> Result<Vec<CorrectionAudit>> {
        load_assignment(self.storage.as_ref(), exam_assignment_id).await?;
        self.storage
            .list_correction_audits(exam_assignment_id, student_id)
            .await
    }

    /// 关联下所有批改及其逐题结果，按学生 ID 排序
    async fn graded_sheets(
        &self,
        context: &AssignmentContext,
    ) -> Result<Vec<(CorrectionRecord, CorrectionResult)>> {
        let exam_assignment_id = context.assignment.id;
        let permutations: HashMap<i64, StudentPermutation> = self
            .storage
            .list_permutations_for_assignment(exam_assignment_id)
            .await?
            .into_iter()
            .map(|stored| (stored.permutation.student_id, stored.permutation))
            .collect();

        let mut records = self
            .storage
            .list_corrections_for_assignment(exam_assignment_id)
            .await?;
        records.sort_by_key(|r| r.student_id);

        records
            .into_iter()
            .map(|record| {
                let permutation = permutations.get(&record.student_id).ok_or_else(|| {
                    ExamSystemError::reconciliation(format!(
                        "correction {} has no stored permutation for student {}",
                        record.id, record.student_id
                    ))
                })?;
                let result = score_sheet(permutation, &context.exam, &record.raw_detections)?;
                Ok((record, result))
            })
            .collect()
    }

    /// 班级与逐题统计，读取时推导
    pub async fn aggregate_for_assignment(
        &self,
        exam_assignment_id: i64,
    ) -> Result<AssignmentStatistics> {
        let context = load_assignment(self.storage.as_ref(), exam_assignment_id).await?;
        let roster: Vec<i64> = self
            .storage
            .list_students_by_class(context.assignment.class_id)
            .await?
            .into_iter()
            .map(|s| s.id)
            .collect();

        let sheets: Vec<(i64, CorrectionResult)> = self
            .graded_sheets(&context)
            .await?
            .into_iter()
            .map(|(record, result)| (record.student_id, result))
            .collect();

        Ok(statistics::aggregate(
            exam_assignment_id,
            &context.exam,
            &roster,
            &sheets,
            self.grade_scale,
        ))
    }

    /// 导出批改结果为 CSV，逐题列为学生卷面上的作答字母
    pub async fn export_csv(&self, exam_assignment_id: i64) -> Result<Vec<u8>> {
        let context = load_assignment(self.storage.as_ref(), exam_assignment_id).await?;
        let students: HashMap<i64, _> = self
            .storage
            .list_students_by_class(context.assignment.class_id)
            .await?
            .into_iter()
            .map(|s| (s.id, s))
            .collect();
        let sheets = self.graded_sheets(&context).await?;

        let mut wtr = csv::Writer::from_writer(vec![]);

        let mut header: Vec<String> = [
            "student_id",
            "name",
            "registration",
            "score",
            "total",
            "percentage",
            "grade",
            "needs_review",
            "revision",
            "corrected_by",
            "corrected_at",
        ]
        .iter()
        .map(|h| h.to_string())
        .collect();
        header.extend((1..=context.exam.question_count()).map(|n| format!("q{n}")));
        wtr.write_record(&header)?;

        for (record, result) in &sheets {
            let student = students.get(&record.student_id);
            let mut row = vec![
                record.student_id.to_string(),
                student.map(|s| s.name.clone()).unwrap_or_default(),
                student
                    .and_then(|s| s.registration.clone())
                    .unwrap_or_default(),
                record.score.to_string(),
                record.total.to_string(),
                format!("{:.2}", result.percentage),
                format!("{:.2}", record.grade),
                record.needs_review.to_string(),
                record.revision.to_string(),
                record.corrected_by.to_string(),
                record.corrected_at.to_rfc3339(),
            ];
            row.extend(
                result
                    .questions
                    .iter()
                    .map(|q| q.detected_answer.clone().unwrap_or_default()),
            );
            wtr.write_record(&row)?;
        }

        wtr.into_inner()
            .map_err(|e| ExamSystemError::serialization(format!("CSV 写入失败: {e}")))
    }
}
