//! 答题卡识别适配层
//!
//! 识别器只负责把图片转换为按显示位置排列的 [`Detection`] 序列，
//! 不知道排列与正确答案。

mod command;

pub use command::CommandMarkDetector;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::io::Cursor;
use std::path::Path;

use crate::engine::{Detection, parse_slot_label};
use crate::errors::{ExamSystemError, Result};

static QUESTION_COLUMN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[qQ](\d+)$").expect("Invalid question column regex"));

#[async_trait]
pub trait MarkDetector: Send + Sync {
    /// 识别图片中的涂卡结果
    ///
    /// `expected` 为试卷题数；模板上多出的空白列会被裁掉。
    async fn detect(&self, image: &Path, expected: usize) -> Result<Vec<Detection>>;
}

/// 解析单个单元格：空或 `?` 为未涂，一个标签为单选，多个标签为多涂
///
/// 标签之间可用空白或 `| ; , /` 分隔；未分隔的字母按单个字母拆开，
/// 数字标签（第 27 个选项起）必须单独成段。
pub fn parse_cell(raw: &str) -> Result<Detection> {
    let value = raw.trim();
    if value.is_empty() || value == "?" {
        return Ok(Detection::NoMark);
    }

    let unrecognized = || ExamSystemError::detection(format!("unrecognized mark {value:?}"));
    let mut slots = BTreeSet::new();
    for token in value
        .split(|c: char| c.is_whitespace() || matches!(c, '|' | ';' | ',' | '/'))
        .filter(|token| !token.is_empty())
    {
        if token.chars().all(|c| c.is_ascii_digit()) {
            slots.insert(parse_slot_label(token).ok_or_else(unrecognized)?);
            continue;
        }
        for c in token.chars() {
            let slot = c
                .is_ascii_alphabetic()
                .then(|| parse_slot_label(&c.to_string()))
                .flatten()
                .ok_or_else(unrecognized)?;
            slots.insert(slot);
        }
    }

    let mut slots: Vec<usize> = slots.into_iter().collect();
    match slots.len() {
        0 => Ok(Detection::NoMark),
        1 => Ok(Detection::Single { slot: slots.remove(0) }),
        _ => Ok(Detection::Ambiguous { slots }),
    }
}

/// 解析识别器输出的 CSV（表头含 `q1..qN` 列，取第一行数据）
///
/// 题号列必须从 `q1` 连续编号且覆盖全部 `expected` 道题，缺列或重复列视为识别失败。
pub fn parse_detector_csv(data: &[u8], expected: usize) -> Result<Vec<Detection>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(Cursor::new(data));

    let headers = rdr
        .headers()
        .map_err(|e| ExamSystemError::detection(format!("failed to read CSV header: {e}")))?
        .clone();

    let mut columns: BTreeMap<usize, usize> = BTreeMap::new();
    for (index, name) in headers.iter().enumerate() {
        let Some(captures) = QUESTION_COLUMN_RE.captures(name.trim()) else {
            continue;
        };
        let number = captures[1]
            .parse::<usize>()
            .ok()
            .filter(|&n| n > 0)
            .ok_or_else(|| {
                ExamSystemError::detection(format!("invalid question column {name:?}"))
            })?;
        if columns.insert(number, index).is_some() {
            return Err(ExamSystemError::detection(format!(
                "duplicate question column q{number}"
            )));
        }
    }
    if columns.is_empty() {
        return Err(ExamSystemError::detection(
            "detector output has no question columns",
        ));
    }

    // 列号互不相同，最大列号等于列数时即为 1..=N 连续
    let last = columns.keys().next_back().copied().unwrap_or_default();
    if last != columns.len() {
        let missing = (1..=columns.len())
            .find(|n| !columns.contains_key(n))
            .unwrap_or(last);
        return Err(ExamSystemError::detection(format!(
            "detector output is missing column q{missing}"
        )));
    }
    if last < expected {
        return Err(ExamSystemError::detection(format!(
            "detector output has {last} question columns, exam has {expected}"
        )));
    }

    let record = rdr
        .records()
        .next()
        .ok_or_else(|| ExamSystemError::detection("detector output has no data row"))?
        .map_err(|e| ExamSystemError::detection(format!("failed to read CSV row: {e}")))?;

    let mut detections = columns
        .values()
        .map(|&index| parse_cell(record.get(index).unwrap_or_default()))
        .collect::<Result<Vec<_>>>()?;

    // 模板列多于题数且多出部分全部空白时裁掉
    if detections.len() > expected
        && detections[expected..]
            .iter()
            .all(|d| matches!(d, Detection::NoMark))
    {
        detections.truncate(expected);
    }

    Ok(detections)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cell() {
        assert_eq!(parse_cell("").unwrap(), Detection::NoMark);
        assert_eq!(parse_cell(" ? ").unwrap(), Detection::NoMark);
        assert_eq!(parse_cell("b").unwrap(), Detection::Single { slot: 1 });
        assert_eq!(
            parse_cell("CA").unwrap(),
            Detection::Ambiguous { slots: vec![0, 2] }
        );
        assert_eq!(
            parse_cell("A|D").unwrap(),
            Detection::Ambiguous { slots: vec![0, 3] }
        );
        assert!(matches!(
            parse_cell("7"),
            Err(ExamSystemError::Detection(_))
        ));
        assert!(matches!(
            parse_cell("A!"),
            Err(ExamSystemError::Detection(_))
        ));
    }

    #[test]
    fn test_parse_cell_numeric_labels() {
        assert_eq!(parse_cell("27").unwrap(), Detection::Single { slot: 26 });
        assert_eq!(
            parse_cell("B|28").unwrap(),
            Detection::Ambiguous { slots: vec![1, 27] }
        );
        assert!(matches!(
            parse_cell("A27"),
            Err(ExamSystemError::Detection(_))
        ));
    }

    #[test]
    fn test_parse_csv_orders_by_question_number() {
        let csv = b"file,q2,q1,q3\nsheet.png,D,B,\n";
        let detections = parse_detector_csv(csv, 3).unwrap();
        assert_eq!(
            detections,
            vec![
                Detection::Single { slot: 1 },
                Detection::Single { slot: 3 },
                Detection::NoMark,
            ]
        );
    }

    #[test]
    fn test_parse_csv_trims_blank_tail() {
        let csv = b"q1,q2,q3,q4,q5\nA,,AB,,?\n";
        let detections = parse_detector_csv(csv, 3).unwrap();
        assert_eq!(
            detections,
            vec![
                Detection::Single { slot: 0 },
                Detection::NoMark,
                Detection::Ambiguous { slots: vec![0, 1] },
            ]
        );
    }

    #[test]
    fn test_parse_csv_rejects_missing_columns() {
        let err = parse_detector_csv(b"q1,q3\nA,B\n", 3).unwrap_err();
        assert!(matches!(err, ExamSystemError::Detection(_)));
        assert!(err.message().contains("q2"));

        // 模板比试卷短
        let err = parse_detector_csv(b"q1,q2\nA,B\n", 3).unwrap_err();
        assert!(matches!(err, ExamSystemError::Detection(_)));
    }

    #[test]
    fn test_parse_csv_rejects_oversized_column_number() {
        let err = parse_detector_csv(b"q1,q99999999999999999\nA,\n", 1).unwrap_err();
        assert!(matches!(err, ExamSystemError::Detection(_)));

        let err = parse_detector_csv(b"q1,q999999999999999999999999\nA,\n", 1).unwrap_err();
        assert!(matches!(err, ExamSystemError::Detection(_)));
    }

    #[test]
    fn test_parse_csv_rejects_duplicate_columns() {
        let err = parse_detector_csv(b"q1,Q1\nA,B\n", 1).unwrap_err();
        assert!(matches!(err, ExamSystemError::Detection(_)));
    }

    #[test]
    fn test_parse_csv_keeps_marked_tail() {
        let csv = b"q1,q2,q3\nA,B,C\n";
        assert_eq!(parse_detector_csv(csv, 2).unwrap().len(), 3);
    }

    #[test]
    fn test_parse_csv_errors() {
        assert!(parse_detector_csv(b"name,score\nx,1\n", 2).is_err());
        assert!(parse_detector_csv(b"q1,q2\n", 2).is_err());
        assert!(parse_detector_csv(b"q1\nZ9\n", 1).is_err());
    }
}
