//! 排列生成器
//!
//! `question_order[显示位置] = 规范题号`，
//! `option_order[规范题号][显示选项位] = 规范选项号`。

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use ts_rs::TS;

use super::exam::CanonicalExam;
use super::seed::{SeedMaterial, StreamKind};
use crate::errors::{ExamSystemError, Result};

/// 学生的个性化排列
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/engine.ts")]
pub struct StudentPermutation {
    pub exam_assignment_id: i64,
    pub student_id: i64,
    pub question_order: Vec<usize>,
    pub option_order: BTreeMap<usize, Vec<usize>>,
    pub algorithm_version: u32,
    pub exam_fingerprint: String,
}

/// 根据种子材料为试卷生成排列
///
/// 纯函数：不读取时钟、不访问存储，相同输入得到逐位相同的结果。
pub fn generate(exam: &CanonicalExam, seed: &SeedMaterial) -> Result<StudentPermutation> {
    if exam.questions.is_empty() {
        return Err(ExamSystemError::validation(format!(
            "cannot randomize exam {} without questions",
            exam.exam_id
        )));
    }

    let mut question_order: Vec<usize> = (0..exam.question_count()).collect();
    seed.stream(StreamKind::Questions)
        .shuffle(&mut question_order);

    let option_order = exam
        .questions
        .iter()
        .enumerate()
        .map(|(canonical_q, question)| {
            let mut order: Vec<usize> = (0..question.options.len()).collect();
            seed.stream(StreamKind::Options(canonical_q))
                .shuffle(&mut order);
            (canonical_q, order)
        })
        .collect();

    let permutation = StudentPermutation {
        exam_assignment_id: seed.exam_assignment_id,
        student_id: seed.student_id,
        question_order,
        option_order,
        algorithm_version: seed.algorithm_version,
        exam_fingerprint: exam.fingerprint(),
    };
    permutation.validate_against(exam)?;

    Ok(permutation)
}

/// 检查 `order` 是否为 `0..len` 上的双射
fn is_bijection(order: &[usize], len: usize) -> bool {
    if order.len() != len {
        return false;
    }
    let mut seen = vec![false; len];
    for &value in order {
        if value >= len || seen[value] {
            return false;
        }
        seen[value] = true;
    }
    true
}

impl StudentPermutation {
    /// 校验排列与试卷结构一致
    ///
    /// 生成时记录的结构指纹须与当前试卷相同（正确标记变化也会被拒绝），
    /// 题目顺序须为 `0..N-1` 上的双射，每道题的选项顺序须为 `0..M_q-1` 上的双射。
    pub fn validate_against(&self, exam: &CanonicalExam) -> Result<()> {
        let fingerprint = exam.fingerprint();
        if self.exam_fingerprint != fingerprint {
            return Err(ExamSystemError::reconciliation(format!(
                "permutation of student {} in assignment {} was generated for exam structure {}, exam {} is now {fingerprint}",
                self.student_id, self.exam_assignment_id, self.exam_fingerprint, exam.exam_id
            )));
        }

        let n = exam.question_count();
        if !is_bijection(&self.question_order, n) {
            return Err(ExamSystemError::reconciliation(format!(
                "question order of student {} in assignment {} is not a permutation of 0..{n}: {:?}",
                self.student_id, self.exam_assignment_id, self.question_order
            )));
        }

        if self.option_order.len() != n {
            return Err(ExamSystemError::reconciliation(format!(
                "option order of student {} covers {} questions, exam has {n}",
                self.student_id,
                self.option_order.len()
            )));
        }

        for (canonical_q, question) in exam.questions.iter().enumerate() {
            let m = question.options.len();
            let order = self.option_order.get(&canonical_q).ok_or_else(|| {
                ExamSystemError::reconciliation(format!(
                    "option order missing for canonical question {canonical_q}"
                ))
            })?;
            if !is_bijection(order, m) {
                return Err(ExamSystemError::reconciliation(format!(
                    "option order for canonical question {canonical_q} is not a permutation of 0..{m}: {order:?}"
                )));
            }
        }

        Ok(())
    }

    /// 显示位置上的规范题号
    pub fn canonical_question_at(&self, display_position: usize) -> Option<usize> {
        self.question_order.get(display_position).copied()
    }

    /// 某题显示选项位上的规范选项号
    pub fn canonical_option_at(&self, canonical_question: usize, slot: usize) -> Option<usize> {
        self.option_order
            .get(&canonical_question)
            .and_then(|order| order.get(slot))
            .copied()
    }

    /// 规范题号出现在哪个显示位置
    pub fn display_position_of(&self, canonical_question: usize) -> Option<usize> {
        self.question_order
            .iter()
            .position(|&q| q == canonical_question)
    }

    /// 规范选项出现在哪个显示选项位
    pub fn display_slot_of(&self, canonical_question: usize, canonical_option: usize) -> Option<usize> {
        self.option_order
            .get(&canonical_question)
            .and_then(|order| order.iter().position(|&o| o == canonical_option))
    }
}

/// 显示选项位的字母标签：0 → A，1 → B …，超过 26 个时使用数字
pub fn slot_label(slot: usize) -> String {
    if slot < 26 {
        char::from(b'A' + slot as u8).to_string()
    } else {
        (slot + 1).to_string()
    }
}

/// 字母标签转回显示选项位
pub fn parse_slot_label(label: &str) -> Option<usize> {
    let label = label.trim();
    let mut chars = label.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_alphabetic() => {
            Some((c.to_ascii_uppercase() as u8 - b'A') as usize)
        }
        _ => label
            .parse::<usize>()
            .ok()
            .filter(|&n| n > 26)
            .map(|n| n - 1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::exam::tests::exam_with;
    use rand::Rng;

    fn sorted(values: &[usize]) -> Vec<usize> {
        let mut v = values.to_vec();
        v.sort_unstable();
        v
    }

    #[test]
    fn test_generate_produces_bijections() {
        let exam = exam_with(&[4, 5, 2, 1, 3], &[0, 4, 1, 0, 2]);
        let permutation = generate(&exam, &SeedMaterial::new(11, 5)).unwrap();

        assert_eq!(sorted(&permutation.question_order), vec![0, 1, 2, 3, 4]);
        for (q, count) in exam.option_counts().into_iter().enumerate() {
            assert_eq!(
                sorted(&permutation.option_order[&q]),
                (0..count).collect::<Vec<_>>()
            );
        }
        assert_eq!(permutation.exam_fingerprint, exam.fingerprint());
    }

    #[test]
    fn test_random_exam_shapes_are_bijective() {
        let mut rng = rand::rng();
        for _ in 0..50 {
            let n = rng.random_range(1..30);
            let counts: Vec<usize> = (0..n).map(|_| rng.random_range(1..8)).collect();
            let correct: Vec<usize> = counts.iter().map(|&m| rng.random_range(0..m)).collect();
            let exam = exam_with(&counts, &correct);
            let seed = SeedMaterial::new(rng.random_range(1..10_000), rng.random_range(1..10_000));

            let permutation = generate(&exam, &seed).unwrap();
            assert_eq!(sorted(&permutation.question_order), (0..n).collect::<Vec<_>>());
            for (q, &m) in counts.iter().enumerate() {
                assert_eq!(sorted(&permutation.option_order[&q]), (0..m).collect::<Vec<_>>());
            }
        }
    }

    #[test]
    fn test_generate_is_reproducible() {
        let exam = exam_with(&[4, 4, 4, 4, 4, 4], &[0, 1, 2, 3, 0, 1]);
        let a = generate(&exam, &SeedMaterial::new(3, 77)).unwrap();
        let b = generate(&exam, &SeedMaterial::new(3, 77)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_different_students_usually_differ() {
        let exam = exam_with(&[5; 10], &[0; 10]);
        let orders: std::collections::HashSet<Vec<usize>> = (1..20)
            .map(|student| {
                generate(&exam, &SeedMaterial::new(3, student))
                    .unwrap()
                    .question_order
            })
            .collect();
        assert!(orders.len() > 1);
    }

    #[test]
    fn test_single_option_question_is_identity() {
        let exam = exam_with(&[1, 1], &[0, 0]);
        let permutation = generate(&exam, &SeedMaterial::new(1, 1)).unwrap();
        assert_eq!(permutation.option_order[&0], vec![0]);
        assert_eq!(permutation.option_order[&1], vec![0]);
    }

    #[test]
    fn test_empty_exam_is_rejected() {
        let exam = exam_with(&[], &[]);
        let err = generate(&exam, &SeedMaterial::new(1, 1)).unwrap_err();
        assert!(matches!(err, ExamSystemError::Validation(_)));
    }

    #[test]
    fn test_display_then_invert_round_trip() {
        let exam = exam_with(&[4, 3, 5, 2], &[0, 1, 2, 1]);
        let permutation = generate(&exam, &SeedMaterial::new(9, 9)).unwrap();

        for canonical_q in 0..exam.question_count() {
            let position = permutation.display_position_of(canonical_q).unwrap();
            assert_eq!(permutation.canonical_question_at(position), Some(canonical_q));

            for canonical_o in 0..exam.questions[canonical_q].options.len() {
                let slot = permutation.display_slot_of(canonical_q, canonical_o).unwrap();
                assert_eq!(
                    permutation.canonical_option_at(canonical_q, slot),
                    Some(canonical_o)
                );
            }
        }
    }

    #[test]
    fn test_validate_against_detects_shape_drift() {
        let exam = exam_with(&[4, 3], &[0, 1]);
        let permutation = generate(&exam, &SeedMaterial::new(1, 2)).unwrap();

        let grown = exam_with(&[4, 3, 2], &[0, 1, 0]);
        assert!(matches!(
            permutation.validate_against(&grown),
            Err(ExamSystemError::Reconciliation(_))
        ));

        // 题型不变、只改正确答案
        let rekeyed = exam_with(&[4, 3], &[2, 0]);
        assert_ne!(exam.fingerprint(), rekeyed.fingerprint());
        let err = permutation.validate_against(&rekeyed).unwrap_err();
        assert!(matches!(err, ExamSystemError::Reconciliation(_)));
        assert!(err.message().contains("exam structure"));

        let mut broken = permutation.clone();
        broken.option_order.insert(0, vec![0, 0, 1, 2]);
        assert!(broken.validate_against(&exam).is_err());
    }

    #[test]
    fn test_slot_labels() {
        assert_eq!(slot_label(0), "A");
        assert_eq!(slot_label(3), "D");
        assert_eq!(slot_label(26), "27");
        assert_eq!(parse_slot_label("c"), Some(2));
        assert_eq!(parse_slot_label(" B "), Some(1));
        assert_eq!(parse_slot_label("27"), Some(26));
        assert_eq!(parse_slot_label("?"), None);
        assert_eq!(parse_slot_label(""), None);
    }
}
