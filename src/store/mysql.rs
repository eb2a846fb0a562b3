use chrono::{DateTime, Utc};
use sqlx::MySqlPool;

use crate::{error::AttendanceError, model::attendance::AttendanceRecord};

use super::{AttendanceStore, NewAttendanceRecord};

/// Production store backed by the shared MySQL pool.
#[derive(Clone)]
pub struct MySqlAttendanceStore {
    pool: MySqlPool,
}

impl MySqlAttendanceStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

impl AttendanceStore for MySqlAttendanceStore {
    async fn create(
        &self,
        record: NewAttendanceRecord,
    ) -> Result<AttendanceRecord, AttendanceError> {
        let result = sqlx::query(
            r#"
            INSERT INTO attendance
                (roll_number, card_id, name, branch, in_time, date)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.roll_number)
        .bind(&record.card_id)
        .bind(&record.name)
        .bind(&record.branch)
        .bind(record.in_time)
        .bind(&record.date)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_id();
        self.find_by_id(id)
            .await?
            .ok_or(AttendanceError::NotFound)
    }

    async fn find_latest_by_card(
        &self,
        card_id: &str,
    ) -> Result<Option<AttendanceRecord>, AttendanceError> {
        let record = sqlx::query_as::<_, AttendanceRecord>(
            "SELECT * FROM attendance WHERE card_id = ? ORDER BY id DESC LIMIT 1",
        )
        .bind(card_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn find_all_open(&self) -> Result<Vec<AttendanceRecord>, AttendanceError> {
        let records = sqlx::query_as::<_, AttendanceRecord>(
            "SELECT * FROM attendance WHERE out_time IS NULL ORDER BY in_time ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    async fn find_by_id(&self, id: u64) -> Result<Option<AttendanceRecord>, AttendanceError> {
        let record =
            sqlx::query_as::<_, AttendanceRecord>("SELECT * FROM attendance WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(record)
    }

    async fn find_by_date(&self, date: &str) -> Result<Vec<AttendanceRecord>, AttendanceError> {
        let records = sqlx::query_as::<_, AttendanceRecord>(
            "SELECT * FROM attendance WHERE date = ? ORDER BY id ASC",
        )
        .bind(date)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    async fn close(
        &self,
        id: u64,
        out_time: DateTime<Utc>,
        duration: &str,
    ) -> Result<AttendanceRecord, AttendanceError> {
        // The `out_time IS NULL` guard is what keeps two concurrent closers
        // from both winning.
        let result = sqlx::query(
            r#"
            UPDATE attendance
            SET out_time = ?, duration = ?
            WHERE id = ?
            AND out_time IS NULL
            "#,
        )
        .bind(out_time)
        .bind(duration)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return match self.find_by_id(id).await? {
                Some(_) => Err(AttendanceError::AlreadyClosed),
                None => Err(AttendanceError::NotFound),
            };
        }

        self.find_by_id(id)
            .await?
            .ok_or(AttendanceError::NotFound)
    }
}
