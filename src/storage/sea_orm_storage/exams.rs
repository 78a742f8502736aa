//! 试卷存储操作

use super::SeaOrmStorage;
use crate::engine::{CanonicalExam, CanonicalQuestion};
use crate::entity::exam_assignments::{Column as AssignmentColumn, Entity as ExamAssignments};
use crate::entity::exams::{ActiveModel, Column, Entity as Exams};
use crate::entity::question_options::{
    ActiveModel as OptionActiveModel, Column as OptionColumn, Entity as QuestionOptions,
};
use crate::entity::questions::{
    ActiveModel as QuestionActiveModel, Column as QuestionColumn, Entity as Questions,
};
use crate::entity::student_permutations::{
    Column as PermutationColumn, Entity as StudentPermutations,
};
use crate::errors::{ExamSystemError, Result};
use crate::models::{
    PaginatedResponse, PaginationInfo, PaginationQuery,
    exams::{
        entities::Exam,
        requests::{CreateExamRequest, ExamListQuery, QuestionInput},
        responses::ExamListResponse,
    },
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use std::collections::HashMap;

/// 按数组顺序写入题目与选项，position 即规范下标
async fn insert_questions<C: ConnectionTrait>(
    conn: &C,
    exam_id: i64,
    questions: Vec<QuestionInput>,
) -> Result<()> {
    for (position, question) in questions.into_iter().enumerate() {
        let inserted = QuestionActiveModel {
            exam_id: Set(exam_id),
            position: Set(position as i32),
            text: Set(question.text),
            ..Default::default()
        }
        .insert(conn)
        .await
        .map_err(|e| ExamSystemError::database_operation(format!("创建题目失败: {e}")))?;

        for (option_position, option) in question.options.into_iter().enumerate() {
            OptionActiveModel {
                question_id: Set(inserted.id),
                position: Set(option_position as i32),
                text: Set(option.text),
                is_correct: Set(option.is_correct),
                ..Default::default()
            }
            .insert(conn)
            .await
            .map_err(|e| ExamSystemError::database_operation(format!("创建选项失败: {e}")))?;
        }
    }
    Ok(())
}

/// 统计引用该试卷的排列数
async fn count_permutations<C: ConnectionTrait>(conn: &C, exam_id: i64) -> Result<u64> {
    let assignment_ids: Vec<i64> = ExamAssignments::find()
        .select_only()
        .column(AssignmentColumn::Id)
        .filter(AssignmentColumn::ExamId.eq(exam_id))
        .into_tuple()
        .all(conn)
        .await
        .map_err(|e| ExamSystemError::database_operation(format!("查询试卷关联失败: {e}")))?;

    if assignment_ids.is_empty() {
        return Ok(0);
    }

    StudentPermutations::find()
        .filter(PermutationColumn::ExamAssignmentId.is_in(assignment_ids))
        .count(conn)
        .await
        .map_err(|e| ExamSystemError::database_operation(format!("统计排列失败: {e}")))
}

impl SeaOrmStorage {
    /// 创建试卷
    pub async fn create_exam_impl(&self, req: CreateExamRequest) -> Result<Exam> {
        let now = chrono::Utc::now().timestamp();
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| ExamSystemError::database_operation(format!("开启事务失败: {e}")))?;

        let exam = ActiveModel {
            title: Set(req.title),
            description: Set(req.description),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(|e| ExamSystemError::database_operation(format!("创建试卷失败: {e}")))?;

        insert_questions(&txn, exam.id, req.questions).await?;

        txn.commit()
            .await
            .map_err(|e| ExamSystemError::database_operation(format!("提交事务失败: {e}")))?;

        Ok(exam.into_exam())
    }

    /// 通过 ID 获取试卷
    pub async fn get_exam_by_id_impl(&self, exam_id: i64) -> Result<Option<Exam>> {
        let result = Exams::find_by_id(exam_id)
            .one(&self.db)
            .await
            .map_err(|e| ExamSystemError::database_operation(format!("查询试卷失败: {e}")))?;

        Ok(result.map(|m| m.into_exam()))
    }

    /// 按规范顺序加载试卷结构
    pub async fn get_canonical_exam_impl(&self, exam_id: i64) -> Result<Option<CanonicalExam>> {
        let Some(exam) = Exams::find_by_id(exam_id)
            .one(&self.db)
            .await
            .map_err(|e| ExamSystemError::database_operation(format!("查询试卷失败: {e}")))?
        else {
            return Ok(None);
        };

        let questions = Questions::find()
            .filter(QuestionColumn::ExamId.eq(exam_id))
            .order_by_asc(QuestionColumn::Position)
            .all(&self.db)
            .await
            .map_err(|e| ExamSystemError::database_operation(format!("查询题目失败: {e}")))?;

        let question_ids: Vec<i64> = questions.iter().map(|q| q.id).collect();
        let options = if question_ids.is_empty() {
            Vec::new()
        } else {
            QuestionOptions::find()
                .filter(OptionColumn::QuestionId.is_in(question_ids))
                .order_by_asc(OptionColumn::QuestionId)
                .order_by_asc(OptionColumn::Position)
                .all(&self.db)
                .await
                .map_err(|e| ExamSystemError::database_operation(format!("查询选项失败: {e}")))?
        };

        let mut grouped: HashMap<i64, Vec<_>> = HashMap::new();
        for option in options {
            grouped
                .entry(option.question_id)
                .or_default()
                .push(option.into_canonical());
        }

        Ok(Some(CanonicalExam {
            exam_id: exam.id,
            title: exam.title,
            questions: questions
                .into_iter()
                .map(|q| CanonicalQuestion {
                    question_id: q.id,
                    options: grouped.remove(&q.id).unwrap_or_default(),
                    text: q.text,
                })
                .collect(),
        }))
    }

    /// 分页列出试卷
    pub async fn list_exams_with_pagination_impl(
        &self,
        query: ExamListQuery,
    ) -> Result<ExamListResponse> {
        let (page, size) = PaginationQuery::clamp(query.page, query.size);

        let mut select = Exams::find();

        if let Some(ref search) = query.search
            && !search.trim().is_empty()
        {
            select = select.filter(Column::Title.contains(search.trim()));
        }

        select = select.order_by_desc(Column::CreatedAt);

        let paginator = select.paginate(&self.db, size);
        let total = paginator
            .num_items()
            .await
            .map_err(|e| ExamSystemError::database_operation(format!("查询试卷总数失败: {e}")))?;

        let exams = paginator
            .fetch_page(page - 1)
            .await
            .map_err(|e| ExamSystemError::database_operation(format!("查询试卷列表失败: {e}")))?;

        Ok(PaginatedResponse::new(
            exams.into_iter().map(|m| m.into_exam()).collect(),
            PaginationInfo::new(page, size, total),
        ))
    }

    /// 替换题目
    ///
    /// 检查与写入在同一事务内完成，排列一旦引用该试卷即拒绝修改。
    pub async fn replace_exam_questions_impl(
        &self,
        exam_id: i64,
        questions: Vec<QuestionInput>,
    ) -> Result<Option<Exam>> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| ExamSystemError::database_operation(format!("开启事务失败: {e}")))?;

        let Some(exam) = Exams::find_by_id(exam_id)
            .one(&txn)
            .await
            .map_err(|e| ExamSystemError::database_operation(format!("查询试卷失败: {e}")))?
        else {
            return Ok(None);
        };

        let referenced = count_permutations(&txn, exam_id).await?;
        if referenced > 0 {
            return Err(ExamSystemError::conflict(format!(
                "exam {exam_id} is referenced by {referenced} student permutation(s) and can no longer be edited"
            )));
        }

        // 选项随题目级联删除
        Questions::delete_many()
            .filter(QuestionColumn::ExamId.eq(exam_id))
            .exec(&txn)
            .await
            .map_err(|e| ExamSystemError::database_operation(format!("删除题目失败: {e}")))?;

        insert_questions(&txn, exam_id, questions).await?;

        let mut model: ActiveModel = exam.into();
        model.updated_at = Set(chrono::Utc::now().timestamp());
        let updated = model
            .update(&txn)
            .await
            .map_err(|e| ExamSystemError::database_operation(format!("更新试卷失败: {e}")))?;

        txn.commit()
            .await
            .map_err(|e| ExamSystemError::database_operation(format!("提交事务失败: {e}")))?;

        Ok(Some(updated.into_exam()))
    }

    pub async fn count_permutations_for_exam_impl(&self, exam_id: i64) -> Result<u64> {
        count_permutations(&self.db, exam_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{memory_storage, question, seed_assignment};
    use super::*;
    use crate::engine::{SeedMaterial, generate};

    #[tokio::test]
    async fn test_create_and_load_canonical_order() {
        let storage = memory_storage().await;
        let exam = storage
            .create_exam_impl(CreateExamRequest {
                title: "Quiz".to_string(),
                description: Some("chapter 1".to_string()),
                questions: vec![question(2, 3), question(0, 5), question(1, 2)],
            })
            .await
            .unwrap();

        let canonical = storage
            .get_canonical_exam_impl(exam.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(canonical.option_counts(), vec![3, 5, 2]);
        assert_eq!(canonical.questions[0].correct_options(), vec![2]);
        assert_eq!(canonical.questions[2].correct_options(), vec![1]);
        assert!(canonical.validate().is_ok());

        assert!(storage.get_canonical_exam_impl(999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_exams_with_search() {
        let storage = memory_storage().await;
        for title in ["Algebra", "Geometry", "Algebra II"] {
            storage
                .create_exam_impl(CreateExamRequest {
                    title: title.to_string(),
                    description: None,
                    questions: vec![question(0, 2)],
                })
                .await
                .unwrap();
        }

        let all = storage
            .list_exams_with_pagination_impl(ExamListQuery {
                page: None,
                size: None,
                search: None,
            })
            .await
            .unwrap();
        assert_eq!(all.pagination.total, 3);

        let algebra = storage
            .list_exams_with_pagination_impl(ExamListQuery {
                page: Some(1),
                size: Some(10),
                search: Some("Algebra".to_string()),
            })
            .await
            .unwrap();
        assert_eq!(algebra.items.len(), 2);
    }

    #[tokio::test]
    async fn test_replace_questions_before_and_after_permutations() {
        let storage = memory_storage().await;
        let (assignment, roster) = seed_assignment(&storage, &[0, 1], 1).await;

        let replaced = storage
            .replace_exam_questions_impl(assignment.exam_id, vec![question(3, 4); 3])
            .await
            .unwrap()
            .unwrap();
        assert_eq!(replaced.id, assignment.exam_id);
        let canonical = storage
            .get_canonical_exam_impl(assignment.exam_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(canonical.question_count(), 3);

        let permutation = generate(&canonical, &SeedMaterial::new(assignment.id, roster[0].id)).unwrap();
        storage
            .insert_permutation_if_absent_impl(&permutation)
            .await
            .unwrap();
        assert_eq!(
            storage
                .count_permutations_for_exam_impl(assignment.exam_id)
                .await
                .unwrap(),
            1
        );

        let err = storage
            .replace_exam_questions_impl(assignment.exam_id, vec![question(0, 2)])
            .await
            .unwrap_err();
        assert!(matches!(err, ExamSystemError::Conflict(_)));

        // 结构未被修改
        let canonical = storage
            .get_canonical_exam_impl(assignment.exam_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(canonical.question_count(), 3);
    }
}
