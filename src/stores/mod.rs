//! 排列与批改的有状态部分
//!
//! 纯计算在 `engine` 中完成；这里负责按键加锁、缓存与存储边界上的原子写入。
//! 锁顺序固定为先批改键、后排列键。

pub mod corrections;
pub mod randomization;

pub use corrections::CorrectionStore;
pub use randomization::RandomizationStore;

use std::sync::Arc;

use crate::cache::ObjectCache;
use crate::config::AppConfig;
use crate::detector::{CommandMarkDetector, MarkDetector};
use crate::engine::CanonicalExam;
use crate::engine::seed::DEFAULT_ALGORITHM_SALT;
use crate::errors::{ExamSystemError, Result};
use crate::models::assignments::entities::ExamAssignment;
use crate::models::classes::entities::Student;
use crate::storage::Storage;
use crate::utils::KeyedLocks;

/// (exam_assignment_id, student_id)
pub type StudentKey = (i64, i64);

#[derive(Default)]
pub struct EngineLocks {
    pub corrections: KeyedLocks<StudentKey>,
    pub permutations: KeyedLocks<StudentKey>,
}

/// 引擎运行参数
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub algorithm_salt: String,
    pub roster_concurrency: usize,
    pub cache_ttl: u64,
    pub grade_scale: f64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            algorithm_salt: DEFAULT_ALGORITHM_SALT.to_string(),
            roster_concurrency: 4,
            cache_ttl: 0,
            grade_scale: 10.0,
        }
    }
}

impl EngineSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            algorithm_salt: config.randomization.algorithm_salt.clone(),
            roster_concurrency: config.randomization.roster_concurrency.max(1),
            cache_ttl: config.cache.default_ttl,
            grade_scale: config.grading.grade_scale,
        }
    }
}

/// 已解析的考试关联及其规范试卷
#[derive(Debug, Clone)]
pub struct AssignmentContext {
    pub assignment: ExamAssignment,
    pub exam: CanonicalExam,
}

/// 共享给各 HTTP 服务的引擎状态
pub struct ExamEngine {
    pub storage: Arc<dyn Storage>,
    pub randomization: Arc<RandomizationStore>,
    pub corrections: CorrectionStore,
    pub detector: Arc<dyn MarkDetector>,
    pub settings: EngineSettings,
}

impl ExamEngine {
    pub fn new(
        storage: Arc<dyn Storage>,
        cache: Arc<dyn ObjectCache>,
        detector: Arc<dyn MarkDetector>,
        settings: EngineSettings,
    ) -> Self {
        let locks = Arc::new(EngineLocks::default());
        let randomization = Arc::new(RandomizationStore::new(
            storage.clone(),
            cache,
            locks.clone(),
            &settings,
        ));
        let corrections =
            CorrectionStore::new(storage.clone(), randomization.clone(), locks, &settings);

        Self {
            storage,
            randomization,
            corrections,
            detector,
            settings,
        }
    }

    /// 按全局配置组装，识别器使用外部命令
    pub fn from_config(storage: Arc<dyn Storage>, cache: Arc<dyn ObjectCache>) -> Self {
        let config = AppConfig::get();
        Self::new(
            storage,
            cache,
            Arc::new(CommandMarkDetector::from_config(&config.detector)),
            EngineSettings::from_config(config),
        )
    }
}

/// 读取考试关联与规范试卷
pub async fn load_assignment(
    storage: &dyn Storage,
    exam_assignment_id: i64,
) -> Result<AssignmentContext> {
    let assignment = storage
        .get_assignment_by_id(exam_assignment_id)
        .await?
        .ok_or_else(|| {
            ExamSystemError::not_found(format!("exam assignment {exam_assignment_id} not found"))
        })?;
    let exam = storage
        .get_canonical_exam(assignment.exam_id)
        .await?
        .ok_or_else(|| ExamSystemError::not_found(format!("exam {} not found", assignment.exam_id)))?;

    Ok(AssignmentContext { assignment, exam })
}

/// 确认学生属于关联的班级
pub async fn ensure_enrolled(
    storage: &dyn Storage,
    context: &AssignmentContext,
    student_id: i64,
) -> Result<Student> {
    let student = storage
        .get_student_by_id(student_id)
        .await?
        .ok_or_else(|| ExamSystemError::not_found(format!("student {student_id} not found")))?;
    if student.class_id != context.assignment.class_id {
        return Err(ExamSystemError::not_found(format!(
            "student {student_id} is not enrolled in class {}",
            context.assignment.class_id
        )));
    }
    Ok(student)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::cache::object_cache::moka::MokaCacheWrapper;
    use crate::engine::Detection;
    use crate::storage::sea_orm_storage::SeaOrmStorage;
    use crate::storage::sea_orm_storage::tests::memory_storage;
    use async_trait::async_trait;
    use std::path::Path;
    use std::time::Duration;

    /// 返回固定识别结果的识别器
    pub(crate) struct FixedDetector(pub Vec<Detection>);

    #[async_trait]
    impl MarkDetector for FixedDetector {
        async fn detect(&self, _image: &Path, _expected: usize) -> Result<Vec<Detection>> {
            Ok(self.0.clone())
        }
    }

    pub(crate) async fn test_engine() -> (ExamEngine, Arc<SeaOrmStorage>) {
        let storage = Arc::new(memory_storage().await);
        let cache = Arc::new(MokaCacheWrapper::with_capacity(1000, Duration::from_secs(60)));
        let engine = ExamEngine::new(
            storage.clone(),
            cache,
            Arc::new(FixedDetector(Vec::new())),
            EngineSettings::default(),
        );
        (engine, storage)
    }

    #[tokio::test]
    async fn test_load_assignment_not_found() {
        let (engine, _) = test_engine().await;
        let err = load_assignment(engine.storage.as_ref(), 404).await.unwrap_err();
        assert!(matches!(err, ExamSystemError::NotFound(_)));
    }
}
