//! 答题卡对账
//!
//! 把按显示位置给出的识别结果映射回规范题目/选项，再判定对错。

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::exam::CanonicalExam;
use super::permutation::{StudentPermutation, slot_label};
use crate::errors::{ExamSystemError, Result};

/// 单个显示位置的识别结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "kind", rename_all = "snake_case")]
#[ts(export, export_to = "../frontend/src/types/generated/engine.ts")]
pub enum Detection {
    /// 未涂
    NoMark,
    /// 涂了一个显示选项位
    Single { slot: usize },
    /// 多涂或无法判定，`slots` 为识别到的显示选项位（可为空）
    Ambiguous {
        #[serde(default)]
        slots: Vec<usize>,
    },
}

/// 单题判定状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "../frontend/src/types/generated/engine.ts")]
pub enum QuestionStatus {
    Correct,
    Wrong,
    Blank,
    /// 按错误计分，但需人工复核
    Ambiguous,
}

impl std::fmt::Display for QuestionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QuestionStatus::Correct => write!(f, "correct"),
            QuestionStatus::Wrong => write!(f, "wrong"),
            QuestionStatus::Blank => write!(f, "blank"),
            QuestionStatus::Ambiguous => write!(f, "ambiguous"),
        }
    }
}

/// 单题对账结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/engine.ts")]
pub struct QuestionResult {
    // 学生卷面上的题号（从 1 开始）
    pub question_number: usize,
    pub canonical_question_index: usize,
    pub question_id: i64,
    pub detected_slot: Option<usize>,
    pub detected_option_index: Option<usize>,
    pub detected_option_id: Option<i64>,
    // 学生卷面上的字母，如 "B"；多涂时为 "A,C"
    pub detected_answer: Option<String>,
    // 正确选项在学生卷面上的字母，多选题以逗号分隔
    pub correct_answer: String,
    pub status: QuestionStatus,
    pub is_correct: bool,
}

/// 整卷对账结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/engine.ts")]
pub struct CorrectionResult {
    pub questions: Vec<QuestionResult>,
    pub score: u32,
    pub total: u32,
    pub percentage: f64,
    pub needs_review: bool,
}

impl CorrectionResult {
    /// 按给定满分折算成绩（原系统为 10 分制）
    pub fn grade(&self, scale: f64) -> f64 {
        grade_for(self.score, self.total, scale)
    }

    pub fn count(&self, status: QuestionStatus) -> usize {
        self.questions.iter().filter(|q| q.status == status).count()
    }
}

pub fn grade_for(score: u32, total: u32, scale: f64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (score as f64 / total as f64 * scale * 100.0).round() / 100.0
}

fn join_labels(slots: &[usize]) -> String {
    slots
        .iter()
        .map(|&s| slot_label(s))
        .collect::<Vec<_>>()
        .join(",")
}

/// 对账
///
/// 识别结果长度与排列不一致、选项位越界、排列与试卷结构不符时返回
/// `Reconciliation` 错误，整卷不计分。
pub fn reconcile(
    permutation: &StudentPermutation,
    exam: &CanonicalExam,
    raw_detections: &[Detection],
) -> Result<CorrectionResult> {
    let expected = permutation.question_order.len();
    if raw_detections.len() != expected {
        return Err(ExamSystemError::reconciliation(format!(
            "expected {expected} detections for student {} in assignment {}, got {}",
            permutation.student_id,
            permutation.exam_assignment_id,
            raw_detections.len()
        )));
    }
    permutation.validate_against(exam)?;

    let mut questions = Vec::with_capacity(expected);
    for (position, detection) in raw_detections.iter().enumerate() {
        let canonical_q = permutation.question_order[position];
        let question = &exam.questions[canonical_q];
        let order = &permutation.option_order[&canonical_q];
        let option_count = order.len();

        let check_slot = |slot: usize| -> Result<()> {
            if slot >= option_count {
                return Err(ExamSystemError::reconciliation(format!(
                    "slot {slot} at display position {position} (canonical question {canonical_q}) \
                     is out of range 0..{option_count}"
                )));
            }
            Ok(())
        };

        let mut correct_slots: Vec<usize> = question
            .correct_options()
            .into_iter()
            .filter_map(|o| permutation.display_slot_of(canonical_q, o))
            .collect();
        correct_slots.sort_unstable();

        let (status, detected_slot, detected_option_index, detected_answer) = match detection {
            Detection::NoMark => (QuestionStatus::Blank, None, None, None),
            Detection::Ambiguous { slots } => {
                for &slot in slots {
                    check_slot(slot)?;
                }
                let answer = (!slots.is_empty()).then(|| join_labels(slots));
                (QuestionStatus::Ambiguous, None, None, answer)
            }
            Detection::Single { slot } => {
                check_slot(*slot)?;
                let canonical_opt = order[*slot];
                let status = if question.options[canonical_opt].is_correct {
                    QuestionStatus::Correct
                } else {
                    QuestionStatus::Wrong
                };
                (
                    status,
                    Some(*slot),
                    Some(canonical_opt),
                    Some(slot_label(*slot)),
                )
            }
        };

        questions.push(QuestionResult {
            question_number: position + 1,
            canonical_question_index: canonical_q,
            question_id: question.question_id,
            detected_slot,
            detected_option_index,
            detected_option_id: detected_option_index.map(|o| question.options[o].option_id),
            detected_answer,
            correct_answer: join_labels(&correct_slots),
            status,
            is_correct: status == QuestionStatus::Correct,
        });
    }

    let score = questions
        .iter()
        .filter(|q| q.status == QuestionStatus::Correct)
        .count() as u32;
    let total = expected as u32;
    let needs_review = questions
        .iter()
        .any(|q| q.status == QuestionStatus::Ambiguous);

    Ok(CorrectionResult {
        questions,
        score,
        total,
        percentage: score as f64 / total as f64 * 100.0,
        needs_review,
    })
}
