use std::sync::Arc;

use turnover_core::{TurnoverError, TurnoverResult};
use turnover_domain::repositories::{TaskRepository, WorkerRepository};

use super::postgres::{PostgresTaskRepository, PostgresWorkerRepository};
use super::sqlite::{self, SqliteTaskRepository, SqliteWorkerRepository};

/// 按连接串自动识别数据库类型
#[derive(Debug, Clone, PartialEq)]
pub enum DatabaseType {
    PostgreSQL,
    SQLite,
}

impl DatabaseType {
    pub fn from_url(url: &str) -> Self {
        if url.starts_with("postgres://") || url.starts_with("postgresql://") {
            DatabaseType::PostgreSQL
        } else {
            DatabaseType::SQLite
        }
    }
}

/// 数据库连接池
pub enum DatabasePool {
    PostgreSQL(sqlx::PgPool),
    SQLite(sqlx::SqlitePool),
}

impl DatabasePool {
    /// 按URL建池；SQLite 场景自动建库建表（嵌入式模式）
    pub async fn new(url: &str, max_connections: u32) -> TurnoverResult<Self> {
        match DatabaseType::from_url(url) {
            DatabaseType::PostgreSQL => {
                let pool = sqlx::postgres::PgPoolOptions::new()
                    .max_connections(max_connections)
                    .connect(url)
                    .await
                    .map_err(|e| {
                        TurnoverError::database_error(format!("连接PostgreSQL失败: {e}"))
                    })?;
                Ok(DatabasePool::PostgreSQL(pool))
            }
            DatabaseType::SQLite => {
                use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
                use std::str::FromStr;

                let connect_options = SqliteConnectOptions::from_str(url)
                    .map_err(|e| {
                        TurnoverError::database_error(format!("解析SQLite连接串失败: {e}"))
                    })?
                    .create_if_missing(true)
                    .foreign_keys(true)
                    .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

                let pool = SqlitePoolOptions::new()
                    .max_connections(max_connections)
                    .connect_with(connect_options)
                    .await
                    .map_err(|e| {
                        TurnoverError::database_error(format!("连接SQLite失败: {e}"))
                    })?;

                sqlite::run_migrations(&pool).await?;
                Ok(DatabasePool::SQLite(pool))
            }
        }
    }

    pub fn database_type(&self) -> DatabaseType {
        match self {
            DatabasePool::PostgreSQL(_) => DatabaseType::PostgreSQL,
            DatabasePool::SQLite(_) => DatabaseType::SQLite,
        }
    }

    pub async fn health_check(&self) -> TurnoverResult<()> {
        match self {
            DatabasePool::PostgreSQL(pool) => {
                sqlx::query("SELECT 1").execute(pool).await?;
            }
            DatabasePool::SQLite(pool) => {
                sqlx::query("SELECT 1").execute(pool).await?;
            }
        }
        Ok(())
    }

    pub async fn close(&self) {
        match self {
            DatabasePool::PostgreSQL(pool) => pool.close().await,
            DatabasePool::SQLite(pool) => pool.close().await,
        }
    }
}

/// 统一的数据库管理器：建池、健康检查与仓储工厂
pub struct DatabaseManager {
    pool: DatabasePool,
}

impl DatabaseManager {
    pub async fn new(url: &str, max_connections: u32) -> TurnoverResult<Self> {
        let pool = DatabasePool::new(url, max_connections).await?;
        Ok(Self { pool })
    }

    pub fn database_type(&self) -> DatabaseType {
        self.pool.database_type()
    }

    pub async fn health_check(&self) -> TurnoverResult<()> {
        self.pool.health_check().await
    }

    pub async fn close(&self) {
        self.pool.close().await
    }

    pub fn task_repository(&self) -> Arc<dyn TaskRepository> {
        match &self.pool {
            DatabasePool::PostgreSQL(pool) => Arc::new(PostgresTaskRepository::new(pool.clone())),
            DatabasePool::SQLite(pool) => Arc::new(SqliteTaskRepository::new(pool.clone())),
        }
    }

    pub fn worker_repository(&self) -> Arc<dyn WorkerRepository> {
        match &self.pool {
            DatabasePool::PostgreSQL(pool) => Arc::new(PostgresWorkerRepository::new(pool.clone())),
            DatabasePool::SQLite(pool) => Arc::new(SqliteWorkerRepository::new(pool.clone())),
        }
    }
}
