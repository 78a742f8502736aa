//! 成绩汇总
//!
//! 所有统计在读取时由已保存的批改结果推导，不单独存储。

use serde::Serialize;
use std::collections::{BTreeSet, HashSet};
use ts_rs::TS;

use super::exam::CanonicalExam;
use super::reconcile::{CorrectionResult, QuestionStatus, grade_for};

/// 单个学生的成绩
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/statistics.ts")]
pub struct StudentScore {
    pub student_id: i64,
    pub score: u32,
    pub total: u32,
    pub percentage: f64,
    pub grade: f64,
    pub needs_review: bool,
}

/// 分数统计
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/statistics.ts")]
pub struct ScoreStats {
    pub mean: f64,
    pub median: f64,
    pub max: u32,
    pub min: u32,
    pub mean_grade: f64,
}

/// 百分比区间
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/statistics.ts")]
pub struct ScoreRange {
    pub range: String,
    pub count: i64,
}

/// 按规范题目统计的作答情况
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/statistics.ts")]
pub struct QuestionStats {
    pub canonical_question_index: usize,
    pub question_id: i64,
    pub correct: i64,
    pub wrong: i64,
    pub blank: i64,
    pub ambiguous: i64,
    pub correct_rate: f64,
}

/// 考试关联的汇总统计
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/statistics.ts")]
pub struct AssignmentStatistics {
    pub exam_assignment_id: i64,
    pub roster_size: i64,
    pub corrected_count: i64,
    pub needs_review_count: i64,
    pub pending_student_ids: Vec<i64>,
    pub score_stats: Option<ScoreStats>,
    pub score_distribution: Vec<ScoreRange>,
    pub question_stats: Vec<QuestionStats>,
    pub students: Vec<StudentScore>,
}

const RANGES: [(&str, f64); 5] = [
    ("90-100", 90.0),
    ("80-89", 80.0),
    ("70-79", 70.0),
    ("60-69", 60.0),
    ("0-59", 0.0),
];

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// 计算百分比分布
pub fn score_distribution(percentages: &[f64]) -> Vec<ScoreRange> {
    let mut counts = [0i64; RANGES.len()];
    for &percentage in percentages {
        let bucket = RANGES
            .iter()
            .position(|(_, floor)| percentage >= *floor)
            .unwrap_or(RANGES.len() - 1);
        counts[bucket] += 1;
    }

    RANGES
        .iter()
        .zip(counts)
        .map(|((range, _), count)| ScoreRange {
            range: range.to_string(),
            count,
        })
        .collect()
}

fn median(sorted: &[u32]) -> f64 {
    let len = sorted.len();
    if len % 2 == 1 {
        sorted[len / 2] as f64
    } else {
        (sorted[len / 2 - 1] as f64 + sorted[len / 2] as f64) / 2.0
    }
}

/// 汇总一次考试关联的批改结果
///
/// `roster` 为当前班级学生；批改过但已不在名单中的学生仍计入成绩。
pub fn aggregate(
    exam_assignment_id: i64,
    exam: &CanonicalExam,
    roster: &[i64],
    sheets: &[(i64, CorrectionResult)],
    grade_scale: f64,
) -> AssignmentStatistics {
    let students: Vec<StudentScore> = sheets
        .iter()
        .map(|(student_id, result)| StudentScore {
            student_id: *student_id,
            score: result.score,
            total: result.total,
            percentage: round2(result.percentage),
            grade: result.grade(grade_scale),
            needs_review: result.needs_review,
        })
        .collect();

    let corrected: HashSet<i64> = students.iter().map(|s| s.student_id).collect();
    let pending_student_ids: Vec<i64> = roster
        .iter()
        .copied()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .filter(|id| !corrected.contains(id))
        .collect();

    let score_stats = if students.is_empty() {
        None
    } else {
        let mut scores: Vec<u32> = students.iter().map(|s| s.score).collect();
        scores.sort_unstable();
        let count = students.len() as f64;
        let sum: u32 = scores.iter().sum();
        let grade_sum: f64 = sheets
            .iter()
            .map(|(_, r)| grade_for(r.score, r.total, grade_scale))
            .sum();
        Some(ScoreStats {
            mean: round2(sum as f64 / count),
            median: median(&scores),
            max: scores[scores.len() - 1],
            min: scores[0],
            mean_grade: round2(grade_sum / count),
        })
    };

    let percentages: Vec<f64> = sheets.iter().map(|(_, r)| r.percentage).collect();

    let mut question_stats: Vec<QuestionStats> = exam
        .questions
        .iter()
        .enumerate()
        .map(|(index, question)| QuestionStats {
            canonical_question_index: index,
            question_id: question.question_id,
            correct: 0,
            wrong: 0,
            blank: 0,
            ambiguous: 0,
            correct_rate: 0.0,
        })
        .collect();
    for (_, result) in sheets {
        for question in &result.questions {
            let Some(stats) = question_stats.get_mut(question.canonical_question_index) else {
                continue;
            };
            match question.status {
                QuestionStatus::Correct => stats.correct += 1,
                QuestionStatus::Wrong => stats.wrong += 1,
                QuestionStatus::Blank => stats.blank += 1,
                QuestionStatus::Ambiguous => stats.ambiguous += 1,
            }
        }
    }
    for stats in &mut question_stats {
        let answered = stats.correct + stats.wrong + stats.blank + stats.ambiguous;
        if answered > 0 {
            stats.correct_rate = round2(stats.correct as f64 / answered as f64 * 100.0);
        }
    }

    AssignmentStatistics {
        exam_assignment_id,
        roster_size: roster.len() as i64,
        corrected_count: students.len() as i64,
        needs_review_count: students.iter().filter(|s| s.needs_review).count() as i64,
        pending_student_ids,
        score_stats,
        score_distribution: score_distribution(&percentages),
        question_stats,
        students,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::exam::tests::exam_with;
    use crate::engine::permutation::generate;
    use crate::engine::reconcile::{Detection, reconcile};
    use crate::engine::seed::SeedMaterial;

    /// 让学生答对前 `right` 个显示位置，其余留空
    fn sheet(exam: &CanonicalExam, student_id: i64, right: usize) -> (i64, CorrectionResult) {
        let permutation = generate(exam, &SeedMaterial::new(1, student_id)).unwrap();
        let detections: Vec<Detection> = (0..exam.question_count())
            .map(|position| {
                if position < right {
                    let q = permutation.question_order[position];
                    let slot = permutation
                        .display_slot_of(q, exam.questions[q].correct_options()[0])
                        .unwrap();
                    Detection::Single { slot }
                } else {
                    Detection::NoMark
                }
            })
            .collect();
        (student_id, reconcile(&permutation, exam, &detections).unwrap())
    }

    #[test]
    fn test_aggregate_scores() {
        let exam = exam_with(&[4; 10], &[0; 10]);
        let sheets = vec![sheet(&exam, 1, 10), sheet(&exam, 2, 7), sheet(&exam, 3, 4)];

        let stats = aggregate(1, &exam, &[1, 2, 3, 4], &sheets, 10.0);

        assert_eq!(stats.roster_size, 4);
        assert_eq!(stats.corrected_count, 3);
        assert_eq!(stats.pending_student_ids, vec![4]);

        let score_stats = stats.score_stats.unwrap();
        assert_eq!(score_stats.max, 10);
        assert_eq!(score_stats.min, 4);
        assert_eq!(score_stats.median, 7.0);
        assert_eq!(score_stats.mean, 7.0);
        assert_eq!(score_stats.mean_grade, 7.0);

        let counts: Vec<i64> = stats.score_distribution.iter().map(|r| r.count).collect();
        assert_eq!(counts, vec![1, 0, 1, 0, 1]);

        let blank_total: i64 = stats.question_stats.iter().map(|q| q.blank).sum();
        let correct_total: i64 = stats.question_stats.iter().map(|q| q.correct).sum();
        assert_eq!(correct_total, 21);
        assert_eq!(blank_total, 9);
    }

    #[test]
    fn test_aggregate_empty() {
        let exam = exam_with(&[4, 4], &[0, 1]);
        let stats = aggregate(9, &exam, &[5, 3], &[], 10.0);

        assert!(stats.score_stats.is_none());
        assert_eq!(stats.pending_student_ids, vec![3, 5]);
        assert!(stats.score_distribution.iter().all(|r| r.count == 0));
        assert!(stats.question_stats.iter().all(|q| q.correct_rate == 0.0));
    }

    #[test]
    fn test_even_median() {
        assert_eq!(median(&[2, 4, 6, 9]), 5.0);
        assert_eq!(median(&[3]), 3.0);
    }

    #[test]
    fn test_distribution_boundaries() {
        let counts: Vec<i64> = score_distribution(&[100.0, 90.0, 89.99, 60.0, 59.9, 0.0])
            .iter()
            .map(|r| r.count)
            .collect();
        assert_eq!(counts, vec![2, 1, 0, 1, 2]);
    }
}
