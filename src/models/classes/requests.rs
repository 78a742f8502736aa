use serde::Deserialize;
use ts_rs::TS;

// 创建班级请求
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/class.ts")]
pub struct CreateClassRequest {
    pub class_name: String,
    pub description: Option<String>,
}

// 添加学生请求
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/class.ts")]
pub struct CreateStudentRequest {
    pub name: String,
    pub registration: Option<String>,
}
