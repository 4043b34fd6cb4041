use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use tracing::{debug, instrument};

use turnover_core::{TurnoverError, TurnoverResult};
use turnover_domain::entities::Worker;
use turnover_domain::repositories::WorkerRepository;

pub struct SqliteWorkerRepository {
    pool: SqlitePool,
}

impl SqliteWorkerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_worker(row: &sqlx::sqlite::SqliteRow) -> TurnoverResult<Worker> {
        // 服务房源列表以JSON文本存放
        let property_ids_json: String = row.try_get("serviceable_property_ids")?;
        let serviceable_property_ids: Vec<i64> = serde_json::from_str(&property_ids_json)
            .map_err(|e| {
                TurnoverError::Serialization(format!("解析服务房源列表失败: {e}"))
            })?;

        Ok(Worker {
            id: row.try_get("id")?,
            display_name: row.try_get("display_name")?,
            serviceable_property_ids,
            active: row.try_get("active")?,
            registered_at: row.try_get("registered_at")?,
        })
    }

    fn property_ids_json(worker: &Worker) -> TurnoverResult<String> {
        serde_json::to_string(&worker.serviceable_property_ids)
            .map_err(|e| TurnoverError::Serialization(e.to_string()))
    }
}

#[async_trait]
impl WorkerRepository for SqliteWorkerRepository {
    #[instrument(skip(self, worker), fields(worker_id = %worker.id))]
    async fn register(&self, worker: &Worker) -> TurnoverResult<Worker> {
        let property_ids = Self::property_ids_json(worker)?;
        sqlx::query(
            r#"
            INSERT INTO workers (id, display_name, serviceable_property_ids, active, registered_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT (id) DO UPDATE
            SET display_name = excluded.display_name,
                serviceable_property_ids = excluded.serviceable_property_ids,
                active = excluded.active
            "#,
        )
        .bind(&worker.id)
        .bind(&worker.display_name)
        .bind(&property_ids)
        .bind(worker.active)
        .bind(worker.registered_at)
        .execute(&self.pool)
        .await?;

        debug!("保洁员 {} 注册成功", worker.id);
        Ok(worker.clone())
    }

    async fn get_by_id(&self, id: &str) -> TurnoverResult<Option<Worker>> {
        let row = sqlx::query(
            "SELECT id, display_name, serviceable_property_ids, active, registered_at \
             FROM workers WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::row_to_worker).transpose()
    }

    async fn get_all(&self) -> TurnoverResult<Vec<Worker>> {
        let rows = sqlx::query(
            "SELECT id, display_name, serviceable_property_ids, active, registered_at \
             FROM workers ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_worker).collect()
    }

    async fn update(&self, worker: &Worker) -> TurnoverResult<()> {
        let property_ids = Self::property_ids_json(worker)?;
        sqlx::query(
            r#"
            UPDATE workers
            SET display_name = ?2, serviceable_property_ids = ?3, active = ?4
            WHERE id = ?1
            "#,
        )
        .bind(&worker.id)
        .bind(&worker.display_name)
        .bind(&property_ids)
        .bind(worker.active)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn unregister(&self, id: &str) -> TurnoverResult<bool> {
        let result = sqlx::query("DELETE FROM workers WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
