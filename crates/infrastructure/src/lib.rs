//! 基础设施层：订单存储的仓储实现
//!
//! PostgreSQL 挂接订单系统既有库表；嵌入式 SQLite 面向单机与测试场景，
//! 首次启动自动建表。两套实现共享同一组条件更新语义。

pub mod database;

pub use database::manager::{DatabaseManager, DatabasePool, DatabaseType};
pub use database::postgres::{PostgresTaskRepository, PostgresWorkerRepository};
pub use database::sqlite::{SqliteTaskRepository, SqliteWorkerRepository};
