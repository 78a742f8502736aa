//! SeaORM 存储实现
//!
//! 统一的数据库存储层，支持 SQLite、PostgreSQL 和 MySQL。

mod assignments;
mod classes;
mod corrections;
mod exams;
mod permutations;

use crate::config::AppConfig;
use crate::errors::{ExamSystemError, Result};
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr, SqlErr};
use std::time::Duration;
use tracing::info;

/// SeaORM 存储实现
#[derive(Clone)]
pub struct SeaOrmStorage {
    pub(crate) db: DatabaseConnection,
}

impl SeaOrmStorage {
    /// 按全局配置创建存储实例
    pub async fn new_async() -> Result<Self> {
        let config = AppConfig::get();
        Self::connect(
            &config.database.url,
            config.database.pool_size,
            config.database.timeout,
        )
        .await
    }

    /// 连接数据库并运行迁移
    pub async fn connect(url: &str, pool_size: u32, timeout: u64) -> Result<Self> {
        let db_url = Self::build_database_url(url)?;

        // 根据数据库类型选择连接方式
        let db = if db_url.starts_with("sqlite:") {
            Self::connect_sqlite(&db_url, pool_size, timeout).await?
        } else {
            Self::connect_generic(&db_url, pool_size, timeout).await?
        };

        // 运行迁移
        Migrator::up(&db, None)
            .await
            .map_err(|e| ExamSystemError::database_operation(format!("数据库迁移失败: {e}")))?;

        info!("SeaORM 存储初始化完成，数据库: {}", db_url);

        Ok(Self { db })
    }

    /// SQLite 专用连接（WAL + pragma 优化）
    async fn connect_sqlite(url: &str, pool_size: u32, timeout: u64) -> Result<DatabaseConnection> {
        use sea_orm::SqlxSqliteConnector;
        use sea_orm::sqlx::sqlite::{
            SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous,
        };
        use std::str::FromStr;

        let opt = SqliteConnectOptions::from_str(url)
            .map_err(|e| ExamSystemError::database_config(format!("SQLite URL 解析失败: {e}")))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(5))
            .foreign_keys(true)
            .pragma("cache_size", "-64000")
            .pragma("temp_store", "memory");

        // 内存数据库每个连接各自独立，只能使用单个常驻连接
        let in_memory = url.contains(":memory:");
        let mut pool = SqlitePoolOptions::new()
            .max_connections(if in_memory { 1 } else { pool_size })
            .min_connections(1)
            .test_before_acquire(true)
            .acquire_timeout(Duration::from_secs(timeout));
        pool = if in_memory {
            pool.idle_timeout(None).max_lifetime(None)
        } else {
            pool.idle_timeout(Duration::from_secs(300))
        };

        let pool = pool
            .connect_with(opt)
            .await
            .map_err(|e| ExamSystemError::database_connection(format!("SQLite 连接失败: {e}")))?;

        Ok(SqlxSqliteConnector::from_sqlx_sqlite_pool(pool))
    }

    /// 通用连接（PostgreSQL、MySQL 等）
    async fn connect_generic(url: &str, pool_size: u32, timeout: u64) -> Result<DatabaseConnection> {
        let mut opt = ConnectOptions::new(url);
        opt.max_connections(pool_size)
            .min_connections(5)
            .connect_timeout(Duration::from_secs(timeout))
            .acquire_timeout(Duration::from_secs(timeout))
            .idle_timeout(Duration::from_secs(600))
            .max_lifetime(Duration::from_secs(1800))
            .sqlx_logging(false)
            .sqlx_logging_level(tracing::log::LevelFilter::Debug);

        Database::connect(opt)
            .await
            .map_err(|e| ExamSystemError::database_connection(format!("无法连接到数据库: {e}")))
    }

    /// 从 URL 自动推断数据库类型并构建连接 URL
    fn build_database_url(url: &str) -> Result<String> {
        if url.starts_with("sqlite:") {
            Ok(url.to_string())
        } else if url == ":memory:" {
            Ok("sqlite::memory:".to_string())
        } else if url.ends_with(".db") || url.ends_with(".sqlite") {
            Ok(format!("sqlite://{url}?mode=rwc"))
        } else if url.starts_with("postgres://")
            || url.starts_with("postgresql://")
            || url.starts_with("mysql://")
            || url.starts_with("mariadb://")
        {
            Ok(url.to_string())
        } else {
            Err(ExamSystemError::database_config(format!(
                "无法从 URL 推断数据库类型: {url}. 支持: sqlite://, postgres://, mysql://, 或 .db/.sqlite 文件路径"
            )))
        }
    }
}

/// 是否为唯一约束冲突
pub(crate) fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

// Storage trait 实现
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
use crate::storage::Storage;
use async_trait::async_trait;

#[async_trait]
impl Storage for SeaOrmStorage {
    // 试卷模块
    async fn create_exam(&self, exam: CreateExamRequest) -> Result<Exam> {
        self.create_exam_impl(exam).await
    }

    async fn get_exam_by_id(&self, exam_id: i64) -> Result<Option<Exam>> {
        self.get_exam_by_id_impl(exam_id).await
    }

    async fn get_canonical_exam(&self, exam_id: i64) -> Result<Option<CanonicalExam>> {
        self.get_canonical_exam_impl(exam_id).await
    }

    async fn list_exams_with_pagination(&self, query: ExamListQuery) -> Result<ExamListResponse> {
        self.list_exams_with_pagination_impl(query).await
    }

    async fn replace_exam_questions(
        &self,
        exam_id: i64,
        questions: Vec<QuestionInput>,
    ) -> Result<Option<Exam>> {
        self.replace_exam_questions_impl(exam_id, questions).await
    }

    async fn count_permutations_for_exam(&self, exam_id: i64) -> Result<u64> {
        self.count_permutations_for_exam_impl(exam_id).await
    }

    // 班级模块
    async fn create_class(&self, class: CreateClassRequest) -> Result<Class> {
        self.create_class_impl(class).await
    }

    async fn get_class_by_id(&self, class_id: i64) -> Result<Option<Class>> {
        self.get_class_by_id_impl(class_id).await
    }

    async fn create_student(&self, class_id: i64, student: CreateStudentRequest) -> Result<Student> {
        self.create_student_impl(class_id, student).await
    }

    async fn get_student_by_id(&self, student_id: i64) -> Result<Option<Student>> {
        self.get_student_by_id_impl(student_id).await
    }

    async fn list_students_by_class(&self, class_id: i64) -> Result<Vec<Student>> {
        self.list_students_by_class_impl(class_id).await
    }

    // 关联模块
    async fn create_assignment(&self, class_id: i64, exam_id: i64) -> Result<ExamAssignment> {
        self.create_assignment_impl(class_id, exam_id).await
    }

    async fn get_assignment_by_id(&self, assignment_id: i64) -> Result<Option<ExamAssignment>> {
        self.get_assignment_by_id_impl(assignment_id).await
    }

    async fn find_assignment(
        &self,
        class_id: i64,
        exam_id: i64,
    ) -> Result<Option<ExamAssignment>> {
        self.find_assignment_impl(class_id, exam_id).await
    }

    async fn list_assignments(&self, query: AssignmentListQuery) -> Result<Vec<ExamAssignment>> {
        self.list_assignments_impl(query).await
    }

    async fn delete_assignment(&self, assignment_id: i64) -> Result<bool> {
        self.delete_assignment_impl(assignment_id).await
    }

    // 排列模块
    async fn insert_permutation_if_absent(
        &self,
        permutation: &StudentPermutation,
    ) -> Result<PermutationInsert> {
        self.insert_permutation_if_absent_impl(permutation).await
    }

    async fn get_permutation(
        &self,
        assignment_id: i64,
        student_id: i64,
    ) -> Result<Option<StoredPermutation>> {
        self.get_permutation_impl(assignment_id, student_id).await
    }

    async fn list_permutations_for_assignment(
        &self,
        assignment_id: i64,
    ) -> Result<Vec<StoredPermutation>> {
        self.list_permutations_for_assignment_impl(assignment_id)
            .await
    }

    async fn delete_permutation(&self, assignment_id: i64, student_id: i64) -> Result<bool> {
        self.delete_permutation_impl(assignment_id, student_id).await
    }

    // 批改模块
    async fn insert_correction_if_absent(
        &self,
        correction: NewCorrection,
    ) -> Result<CorrectionInsert> {
        self.insert_correction_if_absent_impl(correction).await
    }

    async fn get_correction(
        &self,
        assignment_id: i64,
        student_id: i64,
    ) -> Result<Option<CorrectionRecord>> {
        self.get_correction_impl(assignment_id, student_id).await
    }

    async fn list_corrections_for_assignment(
        &self,
        assignment_id: i64,
    ) -> Result<Vec<CorrectionRecord>> {
        self.list_corrections_for_assignment_impl(assignment_id)
            .await
    }

    async fn overwrite_correction(
        &self,
        correction_id: i64,
        correction: NewCorrection,
        reason: Option<String>,
    ) -> Result<(CorrectionRecord, CorrectionAudit)> {
        self.overwrite_correction_impl(correction_id, correction, reason)
            .await
    }

    async fn list_correction_audits(
        &self,
        assignment_id: i64,
        student_id: i64,
    ) -> Result<Vec<CorrectionAudit>> {
        self.list_correction_audits_impl(assignment_id, student_id)
            .await
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::exams::requests::OptionInput;

    /// 已迁移的内存数据库
    pub(crate) async fn memory_storage() -> SeaOrmStorage {
        SeaOrmStorage::connect("sqlite::memory:", 1, 5).await.unwrap()
    }

    pub(crate) fn question(correct: usize, options: usize) -> QuestionInput {
        QuestionInput {
            text: format!("Question with {options} options"),
            options: (0..options)
                .map(|o| OptionInput {
                    text: format!("Option {o}"),
                    is_correct: o == correct,
                })
                .collect(),
        }
    }

    /// 创建试卷、班级、`students` 名学生和关联，返回 (关联, 学生)
    pub(crate) async fn seed_assignment(
        storage: &SeaOrmStorage,
        correct: &[usize],
        students: usize,
    ) -> (ExamAssignment, Vec<Student>) {
        let exam = storage
            .create_exam_impl(CreateExamRequest {
                title: "Midterm".to_string(),
                description: None,
                questions: correct.iter().map(|&c| question(c, 4)).collect(),
            })
            .await
            .unwrap();
        let class = storage
            .create_class_impl(CreateClassRequest {
                class_name: format!("Class for exam {}", exam.id),
                description: None,
            })
            .await
            .unwrap();
        let mut roster = Vec::new();
        for i in 0..students {
            roster.push(
                storage
                    .create_student_impl(
                        class.id,
                        CreateStudentRequest {
                            name: format!("Student {i}"),
                            registration: Some(format!("R{i:03}")),
                        },
                    )
                    .await
                    .unwrap(),
            );
        }
        let assignment = storage
            .create_assignment_impl(class.id, exam.id)
            .await
            .unwrap();
        (assignment, roster)
    }

    #[test]
    fn test_build_database_url() {
        assert_eq!(
            SeaOrmStorage::build_database_url("data.db").unwrap(),
            "sqlite://data.db?mode=rwc"
        );
        assert_eq!(
            SeaOrmStorage::build_database_url(":memory:").unwrap(),
            "sqlite::memory:"
        );
        assert!(SeaOrmStorage::build_database_url("postgres://localhost/exam").is_ok());
        assert!(SeaOrmStorage::build_database_url("ftp://nowhere").is_err());
    }

    #[tokio::test]
    async fn test_migrations_run_on_memory_database() {
        let storage = memory_storage().await;
        let (assignment, roster) = seed_assignment(&storage, &[0, 1], 2).await;
        assert_eq!(roster.len(), 2);
        assert!(assignment.id > 0);
    }
}
