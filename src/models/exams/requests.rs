use crate::engine::{CanonicalExam, CanonicalOption, CanonicalQuestion};
use crate::models::common::PaginationQuery;
use serde::Deserialize;
use ts_rs::TS;

// 选项输入，按数组顺序确定规范选项号
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/exam.ts")]
pub struct OptionInput {
    pub text: String,
    #[serde(default)]
    pub is_correct: bool,
}

// 题目输入，按数组顺序确定规范题号
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/exam.ts")]
pub struct QuestionInput {
    pub text: String,
    pub options: Vec<OptionInput>,
}

// 创建试卷请求
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/exam.ts")]
pub struct CreateExamRequest {
    pub title: String,
    pub description: Option<String>,
    pub questions: Vec<QuestionInput>,
}

// 替换题目请求
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/exam.ts")]
pub struct ReplaceQuestionsRequest {
    pub questions: Vec<QuestionInput>,
}

// 试卷查询参数（来自HTTP请求）
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/exam.ts")]
pub struct ExamQueryParams {
    #[serde(flatten)]
    #[ts(flatten)]
    pub pagination: PaginationQuery,
    pub search: Option<String>,
}

// 试卷列表查询参数（用于存储层）
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/exam.ts")]
pub struct ExamListQuery {
    pub page: Option<i64>,
    pub size: Option<i64>,
    pub search: Option<String>,
}

/// 在写入前组装一份未分配 ID 的规范试卷，用于结构校验
pub fn preview_canonical(exam_id: i64, title: &str, questions: &[QuestionInput]) -> CanonicalExam {
    CanonicalExam {
        exam_id,
        title: title.to_string(),
        questions: questions
            .iter()
            .map(|q| CanonicalQuestion {
                question_id: 0,
                text: q.text.clone(),
                options: q
                    .options
                    .iter()
                    .map(|o| CanonicalOption {
                        option_id: 0,
                        text: o.text.clone(),
                        is_correct: o.is_correct,
                    })
                    .collect(),
            })
            .collect(),
    }
}
