use std::sync::Arc;

use crate::engine::{CanonicalExam, StudentPermutation};
use crate::models::{
    assignments::{entities::ExamAssignment, requests::AssignmentListQuery},
    classes::{
        entities::{Class, Student},
        requests::{CreateClassRequest, CreateStudentRequest},
    },
    corrections::entities::{CorrectionAudit, CorrectionInsert, CorrectionRecord, NewCorrection},
    exams::{
        entities::Exam,
        requests::{CreateExamRequest, ExamListQuery, QuestionInput},
        responses::ExamListResponse,
    },
    permutations::entities::{PermutationInsert, StoredPermutation},
};

use crate::errors::Result;

pub mod sea_orm_storage;

#[async_trait::async_trait]
pub trait Storage: Send + Sync {
    /// 试卷管理方法
    // 创建试卷（含题目与选项）
    async fn create_exam(&self, exam: CreateExamRequest) -> Result<Exam>;
    // 通过ID获取试卷
    async fn get_exam_by_id(&self, exam_id: i64) -> Result<Option<Exam>>;
    // 按规范顺序加载试卷结构
    async fn get_canonical_exam(&self, exam_id: i64) -> Result<Option<CanonicalExam>>;
    // 列出试卷
    async fn list_exams_with_pagination(&self, query: ExamListQuery) -> Result<ExamListResponse>;
    // 替换题目，已有排列引用时返回 Conflict
    async fn replace_exam_questions(
        &self,
        exam_id: i64,
        questions: Vec<QuestionInput>,
    ) -> Result<Option<Exam>>;
    // 统计引用该试卷的排列数
    async fn count_permutations_for_exam(&self, exam_id: i64) -> Result<u64>;

    /// 班级与学生管理方法
    // 创建班级
    async fn create_class(&self, class: CreateClassRequest) -> Result<Class>;
    // 通过ID获取班级
    async fn get_class_by_id(&self, class_id: i64) -> Result<Option<Class>>;
    // 添加学生到班级
    async fn create_student(&self, class_id: i64, student: CreateStudentRequest) -> Result<Student>;
    // 通过ID获取学生
    async fn get_student_by_id(&self, student_id: i64) -> Result<Option<Student>>;
    // 列出班级学生
    async fn list_students_by_class(&self, class_id: i64) -> Result<Vec<Student>>;

    /// 试卷关联方法
    // 创建关联，重复时返回 Conflict
    async fn create_assignment(&self, class_id: i64, exam_id: i64) -> Result<ExamAssignment>;
    // 通过ID获取关联
    async fn get_assignment_by_id(&self, assignment_id: i64) -> Result<Option<ExamAssignment>>;
    // 通过班级与试卷查找关联
    async fn find_assignment(&self, class_id: i64, exam_id: i64)
    -> Result<Option<ExamAssignment>>;
    // 列出关联
    async fn list_assignments(&self, query: AssignmentListQuery) -> Result<Vec<ExamAssignment>>;
    // 删除关联及其排列，存在批改记录时返回 Conflict
    async fn delete_assignment(&self, assignment_id: i64) -> Result<bool>;

    /// 排列存储方法
    // 原子插入；唯一键冲突时读回已存在的记录
    async fn insert_permutation_if_absent(
        &self,
        permutation: &StudentPermutation,
    ) -> Result<PermutationInsert>;
    // 获取排列
    async fn get_permutation(
        &self,
        assignment_id: i64,
        student_id: i64,
    ) -> Result<Option<StoredPermutation>>;
    // 列出关联下所有排列
    async fn list_permutations_for_assignment(
        &self,
        assignment_id: i64,
    ) -> Result<Vec<StoredPermutation>>;
    // 删除排列，存在批改记录时返回 Conflict
    async fn delete_permutation(&self, assignment_id: i64, student_id: i64) -> Result<bool>;

    /// 批改存储方法
    // 原子插入；唯一键冲突时返回已存在的记录
    async fn insert_correction_if_absent(&self, correction: NewCorrection)
    -> Result<CorrectionInsert>;
    // 获取批改记录
    async fn get_correction(
        &self,
        assignment_id: i64,
        student_id: i64,
    ) -> Result<Option<CorrectionRecord>>;
    // 列出关联下所有批改记录
    async fn list_corrections_for_assignment(
        &self,
        assignment_id: i64,
    ) -> Result<Vec<CorrectionRecord>>;
    // 覆盖批改记录并写入审计（同一事务）
    async fn overwrite_correction(
        &self,
        correction_id: i64,
        correction: NewCorrection,
        reason: Option<String>,
    ) -> Result<(CorrectionRecord, CorrectionAudit)>;
    // 列出某学生的审计历史
    async fn list_correction_audits(
        &self,
        assignment_id: i64,
        student_id: i64,
    ) -> Result<Vec<CorrectionAudit>>;
}

pub async fn create_storage() -> Result<Arc<dyn Storage>> {
    let storage = sea_orm_storage::SeaOrmStorage::new_async().await?;
    Ok(Arc::new(storage))
}
