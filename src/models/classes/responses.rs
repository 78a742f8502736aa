use super::entities::Student;
use serde::Serialize;
use ts_rs::TS;

// 班级名单响应
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/class.ts")]
pub struct RosterResponse {
    pub class_id: i64,
    pub items: Vec<Student>,
}
