use sqlx::SqlitePool;
use tracing::debug;

use turnover_core::TurnoverResult;

pub mod sqlite_task_repository;
pub mod sqlite_worker_repository;

pub use sqlite_task_repository::SqliteTaskRepository;
pub use sqlite_worker_repository::SqliteWorkerRepository;

/// 嵌入式模式的建表：镜像订单系统的行结构，单机与测试场景使用
pub async fn run_migrations(pool: &SqlitePool) -> TurnoverResult<()> {
    debug!("Running SQLite database migrations");

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS reservations (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            property_id INTEGER NOT NULL,
            platform TEXT NOT NULL,
            check_in DATETIME NOT NULL,
            check_out DATETIME NOT NULL,
            cleaning_fee REAL,
            cleaning_status TEXT NOT NULL DEFAULT 'pending',
            cleaning_payment_status TEXT NOT NULL DEFAULT 'pending',
            assigned_worker_id TEXT,
            cleaning_rating INTEGER,
            cleaning_notes TEXT,
            status TEXT NOT NULL DEFAULT 'confirmed'
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS workers (
            id TEXT PRIMARY KEY,
            display_name TEXT NOT NULL,
            serviceable_property_ids TEXT NOT NULL DEFAULT '[]',
            active INTEGER NOT NULL DEFAULT 1,
            registered_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    let indexes = [
        "CREATE INDEX IF NOT EXISTS idx_reservations_property ON reservations(property_id)",
        "CREATE INDEX IF NOT EXISTS idx_reservations_cleaning_status ON reservations(cleaning_status)",
        "CREATE INDEX IF NOT EXISTS idx_reservations_assigned_worker ON reservations(assigned_worker_id)",
        "CREATE INDEX IF NOT EXISTS idx_reservations_check_out ON reservations(check_out)",
    ];

    for index_sql in indexes {
        sqlx::query(index_sql).execute(pool).await?;
    }

    debug!("Successfully completed SQLite database migrations");
    Ok(())
}
