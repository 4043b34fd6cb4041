use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use tracing::{debug, instrument};

use turnover_core::TurnoverResult;
use turnover_domain::entities::{CleaningTask, Reservation};
use turnover_domain::repositories::TaskRepository;

const TASK_COLUMNS: &str = r#"
    r.id, r.property_id, r.platform, r.check_out, r.cleaning_fee,
    r.cleaning_status, r.cleaning_payment_status, r.assigned_worker_id,
    r.cleaning_rating, r.cleaning_notes,
    (
        SELECT MIN(n.check_in) FROM reservations n
        WHERE n.property_id = r.property_id
          AND n.id <> r.id
          AND n.status <> 'cancelled'
          AND n.check_in >= r.check_out
    ) AS next_check_in
"#;

pub struct SqliteTaskRepository {
    pool: SqlitePool,
}

impl SqliteTaskRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn select_tasks(where_sql: &str) -> String {
        format!("SELECT {TASK_COLUMNS} FROM reservations r WHERE {where_sql}")
    }

    fn row_to_task(row: &sqlx::sqlite::SqliteRow) -> TurnoverResult<CleaningTask> {
        Ok(CleaningTask {
            id: row.try_get("id")?,
            property_id: row.try_get("property_id")?,
            platform: row.try_get("platform")?,
            checkout_at: row.try_get("check_out")?,
            next_checkin_at: row.try_get("next_check_in")?,
            fee: row.try_get("cleaning_fee")?,
            payment_status: row.try_get("cleaning_payment_status")?,
            cleaning_status: row.try_get("cleaning_status")?,
            assigned_worker_id: row.try_get("assigned_worker_id")?,
            rating: row.try_get("cleaning_rating")?,
            notes: row.try_get("cleaning_notes")?,
        })
    }

    fn rows_to_tasks(rows: &[sqlx::sqlite::SqliteRow]) -> TurnoverResult<Vec<CleaningTask>> {
        rows.iter().map(Self::row_to_task).collect()
    }
}

#[async_trait]
impl TaskRepository for SqliteTaskRepository {
    #[instrument(skip(self, reservation), fields(property_id = %reservation.property_id))]
    async fn create(&self, reservation: &Reservation) -> TurnoverResult<Reservation> {
        let result = sqlx::query(
            r#"
            INSERT INTO reservations
                (property_id, platform, check_in, check_out, cleaning_fee,
                 cleaning_status, cleaning_payment_status, assigned_worker_id,
                 cleaning_rating, cleaning_notes, status)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(reservation.property_id)
        .bind(reservation.platform)
        .bind(reservation.check_in)
        .bind(reservation.check_out)
        .bind(reservation.cleaning_fee)
        .bind(reservation.cleaning_status)
        .bind(reservation.cleaning_payment_status)
        .bind(reservation.assigned_worker_id.as_deref())
        .bind(reservation.cleaning_rating)
        .bind(reservation.cleaning_notes.as_deref())
        .bind(reservation.status)
        .execute(&self.pool)
        .await?;

        let mut created = reservation.clone();
        created.id = result.last_insert_rowid();
        debug!("写入订单成功: ID {}", created.id);
        Ok(created)
    }

    #[instrument(skip(self), fields(task_id = %id))]
    async fn get_by_id(&self, id: i64) -> TurnoverResult<Option<CleaningTask>> {
        let query = Self::select_tasks("r.id = ? AND r.status <> 'cancelled'");
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::row_to_task).transpose()
    }

    async fn list_available_for_properties(
        &self,
        property_ids: &[i64],
    ) -> TurnoverResult<Vec<CleaningTask>> {
        if property_ids.is_empty() {
            return Ok(Vec::new());
        }

        // SQLite 没有数组绑定，按个数展开占位符
        let placeholders = vec!["?"; property_ids.len()].join(", ");
        let query = Self::select_tasks(&format!(
            "r.assigned_worker_id IS NULL AND r.cleaning_status = 'pending' \
             AND r.status <> 'cancelled' AND r.property_id IN ({placeholders})"
        ));

        let mut sqlx_query = sqlx::query(&query);
        for property_id in property_ids {
            sqlx_query = sqlx_query.bind(property_id);
        }

        let rows = sqlx_query.fetch_all(&self.pool).await?;
        Self::rows_to_tasks(&rows)
    }

    async fn list_unassigned_pending(&self) -> TurnoverResult<Vec<CleaningTask>> {
        let query = Self::select_tasks(
            "r.assigned_worker_id IS NULL AND r.cleaning_status = 'pending' \
             AND r.status <> 'cancelled'",
        );
        let rows = sqlx::query(&query).fetch_all(&self.pool).await?;
        Self::rows_to_tasks(&rows)
    }

    async fn list_assigned_to(&self, worker_id: &str) -> TurnoverResult<Vec<CleaningTask>> {
        let query = Self::select_tasks(
            "r.assigned_worker_id = ? AND r.cleaning_status = 'pending' \
             AND r.status <> 'cancelled'",
        );
        let rows = sqlx::query(&query)
            .bind(worker_id)
            .fetch_all(&self.pool)
            .await?;
        Self::rows_to_tasks(&rows)
    }

    async fn list_pending(&self) -> TurnoverResult<Vec<CleaningTask>> {
        let query =
            Self::select_tasks("r.cleaning_status = 'pending' AND r.status <> 'cancelled'");
        let rows = sqlx::query(&query).fetch_all(&self.pool).await?;
        Self::rows_to_tasks(&rows)
    }

    async fn list_completed_for_worker(
        &self,
        worker_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> TurnoverResult<Vec<CleaningTask>> {
        let query = Self::select_tasks(
            "r.assigned_worker_id = ? AND r.cleaning_status = 'done' \
             AND r.status <> 'cancelled' AND r.check_out >= ? AND r.check_out < ?",
        );
        let rows = sqlx::query(&query)
            .bind(worker_id)
            .bind(from)
            .bind(to)
            .fetch_all(&self.pool)
            .await?;
        Self::rows_to_tasks(&rows)
    }

    /// 原子认领：条件更新要求写入时刻仍未指派，竞争失败行数为0
    #[instrument(skip(self), fields(task_id = %task_id, worker_id = %worker_id))]
    async fn try_claim(&self, task_id: i64, worker_id: &str) -> TurnoverResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE reservations
            SET assigned_worker_id = ?2
            WHERE id = ?1
              AND assigned_worker_id IS NULL
              AND cleaning_status = 'pending'
              AND status <> 'cancelled'
            "#,
        )
        .bind(task_id)
        .bind(worker_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self), fields(task_id = %task_id, worker_id = %worker_id))]
    async fn try_complete(&self, task_id: i64, worker_id: &str) -> TurnoverResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE reservations
            SET cleaning_status = 'done'
            WHERE id = ?1
              AND assigned_worker_id = ?2
              AND cleaning_status = 'pending'
            "#,
        )
        .bind(task_id)
        .bind(worker_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self), fields(task_id = %task_id))]
    async fn try_assign(&self, task_id: i64, worker_id: Option<&str>) -> TurnoverResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE reservations
            SET assigned_worker_id = ?2
            WHERE id = ?1
              AND cleaning_status <> 'done'
              AND status <> 'cancelled'
            "#,
        )
        .bind(task_id)
        .bind(worker_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn update_feedback(
        &self,
        task_id: i64,
        rating: Option<i16>,
        notes: Option<&str>,
    ) -> TurnoverResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE reservations
            SET cleaning_rating = COALESCE(?2, cleaning_rating),
                cleaning_notes = COALESCE(?3, cleaning_notes)
            WHERE id = ?1
            "#,
        )
        .bind(task_id)
        .bind(rating)
        .bind(notes)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
