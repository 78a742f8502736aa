//! 规范试卷（教师编写的原始顺序）

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use ts_rs::TS;

use crate::errors::{ExamSystemError, Result};

/// 规范试卷：题目与选项均按作者编写的原始顺序排列
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/engine.ts")]
pub struct CanonicalExam {
    pub exam_id: i64,
    pub title: String,
    // 下标即规范题号 0..N-1
    pub questions: Vec<CanonicalQuestion>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/engine.ts")]
pub struct CanonicalQuestion {
    pub question_id: i64,
    pub text: String,
    // 下标即规范选项号 0..M_q-1
    pub options: Vec<CanonicalOption>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/engine.ts")]
pub struct CanonicalOption {
    pub option_id: i64,
    pub text: String,
    pub is_correct: bool,
}

impl CanonicalQuestion {
    /// 正确选项的规范下标
    pub fn correct_options(&self) -> Vec<usize> {
        self.options
            .iter()
            .enumerate()
            .filter(|(_, o)| o.is_correct)
            .map(|(i, _)| i)
            .collect()
    }
}

impl CanonicalExam {
    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    /// 每道题的选项数，按规范题号排列
    pub fn option_counts(&self) -> Vec<usize> {
        self.questions.iter().map(|q| q.options.len()).collect()
    }

    /// 校验试卷结构
    ///
    /// 至少一道题；每道题至少一个选项且至少一个正确选项。
    /// 不满足时不得关联到班级，也不得生成排列。
    pub fn validate(&self) -> Result<()> {
        if self.questions.is_empty() {
            return Err(ExamSystemError::validation(format!(
                "exam {} has no questions",
                self.exam_id
            )));
        }

        for (index, question) in self.questions.iter().enumerate() {
            if question.options.is_empty() {
                return Err(ExamSystemError::validation(format!(
                    "question {} (canonical index {index}) of exam {} has no options",
                    question.question_id, self.exam_id
                )));
            }
            if !question.options.iter().any(|o| o.is_correct) {
                return Err(ExamSystemError::validation(format!(
                    "question {} (canonical index {index}) of exam {} has no correct option",
                    question.question_id, self.exam_id
                )));
            }
        }

        Ok(())
    }

    /// 试卷结构指纹
    ///
    /// 只覆盖题目数、各题选项数与正确标记；文本修改不影响指纹。
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(b"examsys.exam-structure.v1");
        hasher.update((self.questions.len() as u64).to_be_bytes());
        for question in &self.questions {
            hasher.update((question.options.len() as u64).to_be_bytes());
            for option in &question.options {
                hasher.update([u8::from(option.is_correct)]);
            }
        }
        format!("sha256:{}", hex::encode(hasher.finalize()))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// 构造测试试卷，`correct[q]` 为第 q 题正确选项的规范下标
    pub(crate) fn exam_with(option_counts: &[usize], correct: &[usize]) -> CanonicalExam {
        CanonicalExam {
            exam_id: 1,
            title: "Sample".to_string(),
            questions: option_counts
                .iter()
                .zip(correct)
                .enumerate()
                .map(|(q, (&count, &right))| CanonicalQuestion {
                    question_id: 100 + q as i64,
                    text: format!("Question {}", q + 1),
                    options: (0..count)
                        .map(|o| CanonicalOption {
                            option_id: 1000 + (q * 10 + o) as i64,
                            text: format!("Option {o}"),
                            is_correct: o == right,
                        })
                        .collect(),
                })
                .collect(),
        }
    }

    #[test]
    fn test_valid_exam() {
        let exam = exam_with(&[4, 4, 1], &[1, 3, 0]);
        assert!(exam.validate().is_ok());
        assert_eq!(exam.option_counts(), vec![4, 4, 1]);
        assert_eq!(exam.questions[1].correct_options(), vec![3]);
    }

    #[test]
    fn test_empty_exam_rejected() {
        let exam = exam_with(&[], &[]);
        let err = exam.validate().unwrap_err();
        assert_eq!(err.code(), "E007");
    }

    #[test]
    fn test_question_without_correct_option_rejected() {
        let mut exam = exam_with(&[3, 3], &[0, 2]);
        for option in &mut exam.questions[1].options {
            option.is_correct = false;
        }
        let err = exam.validate().unwrap_err();
        assert!(matches!(err, ExamSystemError::Validation(_)));
        assert!(err.message().contains("no correct option"));
    }

    #[test]
    fn test_question_without_options_rejected() {
        let mut exam = exam_with(&[3, 3], &[0, 2]);
        exam.questions[0].options.clear();
        assert!(exam.validate().is_err());
    }

    #[test]
    fn test_fingerprint_tracks_structure_only() {
        let exam = exam_with(&[4, 3], &[0, 1]);
        let mut renamed = exam.clone();
        renamed.questions[0].text = "Reworded".to_string();
        assert_eq!(exam.fingerprint(), renamed.fingerprint());

        let reshaped = exam_with(&[4, 3], &[0, 2]);
        assert_ne!(exam.fingerprint(), reshaped.fingerprint());
        assert!(exam.fingerprint().starts_with("sha256:"));
    }
}
