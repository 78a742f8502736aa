//! 统一错误处理模块
//!
//! 使用宏自动生成错误类型，支持错误代码和类型名称。

use std::fmt;

/// 定义错误类型的宏
///
/// 自动生成：
/// - enum 定义
/// - code() 方法 - 返回错误代码
/// - error_type() 方法 - 返回错误类型名称
/// - message() 方法 - 返回错误详情
/// - 便捷构造函数
macro_rules! define_examsys_errors {
    ($(
        $variant:ident($code:literal, $type_name:literal)
    ),* $(,)?) => {
        #[derive(Debug, Clone, PartialEq)]
        pub enum ExamSystemError {
            $($variant(String),)*
        }

        impl ExamSystemError {
            /// 获取错误代码
            pub fn code(&self) -> &'static str {
                match self {
                    $(ExamSystemError::$variant(_) => $code,)*
                }
            }

            /// 获取错误类型名称
            pub fn error_type(&self) -> &'static str {
                match self {
                    $(ExamSystemError::$variant(_) => $type_name,)*
                }
            }

            /// 获取错误详情
            pub fn message(&self) -> &str {
                match self {
                    $(ExamSystemError::$variant(msg) => msg,)*
                }
            }
        }

        // 生成便捷构造函数
        paste::paste! {
            impl ExamSystemError {
                $(
                    pub fn [<$variant:snake>]<T: Into<String>>(msg: T) -> Self {
                        ExamSystemError::$variant(msg.into())
                    }
                )*
            }
        }
    };
}

define_examsys_errors! {
    CacheConnection("E001", "Cache Connection Error"),
    CachePluginNotFound("E002", "Cache Plugin Not Found"),
    DatabaseConfig("E003", "Database Configuration Error"),
    DatabaseConnection("E004", "Database Connection Error"),
    DatabaseOperation("E005", "Database Operation Error"),
    FileOperation("E006", "File Operation Error"),
    Validation("E007", "Validation Error"),
    NotFound("E008", "Resource Not Found"),
    Serialization("E009", "Serialization Error"),
    Conflict("E010", "Conflict Error"),
    Reconciliation("E011", "Reconciliation Error"),
    Detection("E012", "Mark Detection Error"),
}

impl ExamSystemError {
    /// 格式化为简洁输出
    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }

    /// 是否属于调用方可修正的错误（非服务端故障）
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ExamSystemError::Validation(_)
                | ExamSystemError::NotFound(_)
                | ExamSystemError::Conflict(_)
                | ExamSystemError::Reconciliation(_)
        )
    }
}

impl fmt::Display for ExamSystemError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for ExamSystemError {}

// 为常见的错误类型实现 From trait
impl From<sea_orm::DbErr> for ExamSystemError {
    fn from(err: sea_orm::DbErr) -> Self {
        ExamSystemError::DatabaseOperation(err.to_string())
    }
}

impl From<std::io::Error> for ExamSystemError {
    fn from(err: std::io::Error) -> Self {
        ExamSystemError::FileOperation(err.to_string())
    }
}

impl From<serde_json::Error> for ExamSystemError {
    fn from(err: serde_json::Error) -> Self {
        ExamSystemError::Serialization(err.to_string())
    }
}

impl From<csv::Error> for ExamSystemError {
    fn from(err: csv::Error) -> Self {
        ExamSystemError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ExamSystemError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(ExamSystemError::cache_connection("test").code(), "E001");
        assert_eq!(ExamSystemError::database_config("test").code(), "E003");
        assert_eq!(ExamSystemError::validation("test").code(), "E007");
        assert_eq!(ExamSystemError::conflict("test").code(), "E010");
        assert_eq!(ExamSystemError::reconciliation("test").code(), "E011");
    }

    #[test]
    fn test_error_types() {
        assert_eq!(
            ExamSystemError::not_found("test").error_type(),
            "Resource Not Found"
        );
        assert_eq!(
            ExamSystemError::detection("test").error_type(),
            "Mark Detection Error"
        );
    }

    #[test]
    fn test_format_simple() {
        let err = ExamSystemError::conflict("correction already exists");
        let formatted = err.format_simple();
        assert!(formatted.contains("Conflict Error"));
        assert!(formatted.contains("correction already exists"));
    }

    #[test]
    fn test_client_errors() {
        assert!(ExamSystemError::validation("x").is_client_error());
        assert!(ExamSystemError::reconciliation("x").is_client_error());
        assert!(!ExamSystemError::database_operation("x").is_client_error());
        assert!(!ExamSystemError::detection("x").is_client_error());
    }
}
