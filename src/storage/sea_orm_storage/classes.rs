//! 班级与学生存储操作

use super::{SeaOrmStorage, is_unique_violation};
use crate::entity::classes::{ActiveModel, Entity as Classes};
use crate::entity::students::{
    ActiveModel as StudentActiveModel, Column as StudentColumn, Entity as Students,
};
use crate::errors::{ExamSystemError, Result};
use crate::models::classes::{
    entities::{Class, Student},
    requests::{CreateClassRequest, CreateStudentRequest},
};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};

impl SeaOrmStorage {
    /// 创建班级
    pub async fn create_class_impl(&self, req: CreateClassRequest) -> Result<Class> {
        let now = chrono::Utc::now().timestamp();
        let class_name = req.class_name.clone();

        let model = ActiveModel {
            class_name: Set(req.class_name),
            description: Set(req.description),
            created_at: Set(now),
            ..Default::default()
        };

        let result = model.insert(&self.db).await.map_err(|e| {
            if is_unique_violation(&e) {
                ExamSystemError::conflict(format!("class name '{class_name}' already exists"))
            } else {
                ExamSystemError::database_operation(format!("创建班级失败: {e}"))
            }
        })?;

        Ok(result.into_class())
    }

    /// 通过 ID 获取班级
    pub async fn get_class_by_id_impl(&self, class_id: i64) -> Result<Option<Class>> {
        let result = Classes::find_by_id(class_id)
            .one(&self.db)
            .await
            .map_err(|e| ExamSystemError::database_operation(format!("查询班级失败: {e}")))?;

        Ok(result.map(|m| m.into_class()))
    }

    /// 添加学生
    pub async fn create_student_impl(
        &self,
        class_id: i64,
        req: CreateStudentRequest,
    ) -> Result<Student> {
        let model = StudentActiveModel {
            class_id: Set(class_id),
            name: Set(req.name),
            registration: Set(req.registration),
            created_at: Set(chrono::Utc::now().timestamp()),
            ..Default::default()
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| ExamSystemError::database_operation(format!("添加学生失败: {e}")))?;

        Ok(result.into_student())
    }

    /// 通过 ID 获取学生
    pub async fn get_student_by_id_impl(&self, student_id: i64) -> Result<Option<Student>> {
        let result = Students::find_by_id(student_id)
            .one(&self.db)
            .await
            .map_err(|e| ExamSystemError::database_operation(format!("查询学生失败: {e}")))?;

        Ok(result.map(|m| m.into_student()))
    }

    /// 列出班级学生（按 ID 升序）
    pub async fn list_students_by_class_impl(&self, class_id: i64) -> Result<Vec<Student>> {
        let students = Students::find()
            .filter(StudentColumn::ClassId.eq(class_id))
            .order_by_asc(StudentColumn::Id)
            .all(&self.db)
            .await
            .map_err(|e| ExamSystemError::database_operation(format!("查询班级学生失败: {e}")))?;

        Ok(students.into_iter().map(|m| m.into_student()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::memory_storage;
    use super::*;

    #[tokio::test]
    async fn test_class_roster() {
        let storage = memory_storage().await;
        let class = storage
            .create_class_impl(CreateClassRequest {
                class_name: "3A".to_string(),
                description: None,
            })
            .await
            .unwrap();

        for name in ["Ana", "Bruno"] {
            storage
                .create_student_impl(
                    class.id,
                    CreateStudentRequest {
                        name: name.to_string(),
                        registration: None,
                    },
                )
                .await
                .unwrap();
        }

        let roster = storage.list_students_by_class_impl(class.id).await.unwrap();
        assert_eq!(roster.len(), 2);
        assert_eq!(roster[0].name, "Ana");
        assert!(storage.list_students_by_class_impl(999).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_class_name_conflicts() {
        let storage = memory_storage().await;
        let req = || CreateClassRequest {
            class_name: "3B".to_string(),
            description: None,
        };
        storage.create_class_impl(req()).await.unwrap();
        let err = storage.create_class_impl(req()).await.unwrap_err();
        assert!(matches!(err, ExamSystemError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_student_requires_existing_class() {
        let storage = memory_storage().await;
        let result = storage
            .create_student_impl(
                42,
                CreateStudentRequest {
                    name: "Nobody".to_string(),
                    registration: None,
                },
            )
            .await;
        assert!(result.is_err());
    }
}
