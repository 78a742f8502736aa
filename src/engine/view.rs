//! 个性化试卷视图与答案
//!
//! 只从已保存的排列读取顺序，绝不在此重新生成。

use serde::Serialize;
use ts_rs::TS;

use super::exam::CanonicalExam;
use super::permutation::{StudentPermutation, slot_label};
use crate::errors::Result;

#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/engine.ts")]
pub struct PersonalizedOption {
    pub label: String,
    pub option_id: i64,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/engine.ts")]
pub struct PersonalizedQuestion {
    pub number: usize,
    pub question_id: i64,
    pub text: String,
    pub options: Vec<PersonalizedOption>,
}

/// 渲染器输入：学生看到的题目与选项顺序
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/engine.ts")]
pub struct PersonalizedExam {
    pub exam_assignment_id: i64,
    pub student_id: i64,
    pub exam_id: i64,
    pub title: String,
    pub questions: Vec<PersonalizedQuestion>,
}

#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/engine.ts")]
pub struct AnswerKeyEntry {
    pub number: usize,
    pub question_id: i64,
    pub answers: Vec<String>,
}

/// 学生专属答案（题号 → 正确字母）
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/engine.ts")]
pub struct AnswerKey {
    pub exam_assignment_id: i64,
    pub student_id: i64,
    pub entries: Vec<AnswerKeyEntry>,
}

pub fn personalized_exam(
    permutation: &StudentPermutation,
    exam: &CanonicalExam,
) -> Result<PersonalizedExam> {
    permutation.validate_against(exam)?;

    let questions = permutation
        .question_order
        .iter()
        .enumerate()
        .map(|(position, &canonical_q)| {
            let question = &exam.questions[canonical_q];
            let options = permutation.option_order[&canonical_q]
                .iter()
                .enumerate()
                .map(|(slot, &canonical_o)| {
                    let option = &question.options[canonical_o];
                    PersonalizedOption {
                        label: slot_label(slot),
                        option_id: option.option_id,
                        text: option.text.clone(),
                    }
                })
                .collect();
            PersonalizedQuestion {
                number: position + 1,
                question_id: question.question_id,
                text: question.text.clone(),
                options,
            }
        })
        .collect();

    Ok(PersonalizedExam {
        exam_assignment_id: permutation.exam_assignment_id,
        student_id: permutation.student_id,
        exam_id: exam.exam_id,
        title: exam.title.clone(),
        questions,
    })
}

pub fn answer_key(permutation: &StudentPermutation, exam: &CanonicalExam) -> Result<AnswerKey> {
    permutation.validate_against(exam)?;

    let entries = permutation
        .question_order
        .iter()
        .enumerate()
        .map(|(position, &canonical_q)| {
            let question = &exam.questions[canonical_q];
            let answers = permutation.option_order[&canonical_q]
                .iter()
                .enumerate()
                .filter(|(_, canonical_o)| question.options[**canonical_o].is_correct)
                .map(|(slot, _)| slot_label(slot))
                .collect();
            AnswerKeyEntry {
                number: position + 1,
                question_id: question.question_id,
                answers,
            }
        })
        .collect();

    Ok(AnswerKey {
        exam_assignment_id: permutation.exam_assignment_id,
        student_id: permutation.student_id,
        entries,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::exam::tests::exam_with;
    use crate::engine::permutation::{generate, parse_slot_label};
    use crate::engine::reconcile::{Detection, reconcile};
    use crate::engine::seed::SeedMaterial;

    #[test]
    fn test_view_follows_permutation() {
        let exam = exam_with(&[3, 4, 2], &[2, 0, 1]);
        let permutation = generate(&exam, &SeedMaterial::new(4, 12)).unwrap();
        let view = personalized_exam(&permutation, &exam).unwrap();

        assert_eq!(view.questions.len(), 3);
        for (position, question) in view.questions.iter().enumerate() {
            let canonical_q = permutation.question_order[position];
            assert_eq!(question.number, position + 1);
            assert_eq!(question.question_id, exam.questions[canonical_q].question_id);
            for (slot, option) in question.options.iter().enumerate() {
                let canonical_o = permutation.option_order[&canonical_q][slot];
                assert_eq!(option.option_id, exam.questions[canonical_q].options[canonical_o].option_id);
                assert_eq!(option.label, slot_label(slot));
            }
        }
    }

    #[test]
    fn test_answer_key_scores_full_marks() {
        let exam = exam_with(&[4, 4, 5, 3, 2], &[3, 1, 4, 0, 1]);
        let permutation = generate(&exam, &SeedMaterial::new(2, 31)).unwrap();
        let key = answer_key(&permutation, &exam).unwrap();

        let detections: Vec<Detection> = key
            .entries
            .iter()
            .map(|entry| Detection::Single {
                slot: parse_slot_label(&entry.answers[0]).unwrap(),
            })
            .collect();
        let result = reconcile(&permutation, &exam, &detections).unwrap();
        assert_eq!(result.score, 5);
    }

    #[test]
    fn test_view_rejects_mismatched_exam() {
        let exam = exam_with(&[3, 3], &[0, 0]);
        let permutation = generate(&exam, &SeedMaterial::new(1, 1)).unwrap();
        let other = exam_with(&[3], &[0]);
        assert!(personalized_exam(&permutation, &other).is_err());
        assert!(answer_key(&permutation, &other).is_err());
    }
}
