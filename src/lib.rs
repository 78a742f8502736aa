//! ExamSys - 试卷随机化与答题卡批改服务
//!
//! 基于 Actix Web 构建：为每位学生生成确定性的题目与选项排列，
//! 并将识别出的答题卡标记对账回规范答案。
//!
//! # 架构
//! - `cache`: 缓存层（Moka）
//! - `config`: 配置管理
//! - `detector`: 答题卡标记识别适配
//! - `engine`: 排列生成与对账的纯计算部分
//! - `entity`: SeaORM 数据库实体
//! - `errors`: 统一错误处理
//! - `models`: 数据模型定义
//! - `routes`: API 路由层
//! - `runtime`: 运行时生命周期管理
//! - `services`: 业务逻辑层
//! - `storage`: 数据存储层（SeaORM）
//! - `stores`: 排列与批改记录的并发安全存取
//! - `utils`: 工具函数

pub mod cache;
pub mod config;
pub mod detector;
pub mod engine;
pub mod entity;
pub mod errors;
pub mod models;
pub mod routes;
pub mod runtime;
pub mod services;
pub mod storage;
pub mod stores;
pub mod utils;
