//! Usage readings repository for database operations

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use super::UsageLogStore;
use crate::{
    error::AppResult,
    models::{
        usage::{UsageReading, UsageReadingRow},
        UsageMetric,
    },
};

#[derive(Clone)]
pub struct UsageReadingsRepository {
    pool: Pool<Postgres>,
}

impl UsageReadingsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UsageLogStore for UsageReadingsRepository {
    async fn append_reading(&self, reading: &UsageReading) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO usage_readings
                (id, equipment_id, reading_type, reading_value, recorded_at, operation_type, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(reading.id)
        .bind(reading.equipment_id)
        .bind(reading.reading_type.as_str())
        .bind(reading.reading_value)
        .bind(reading.recorded_at)
        .bind(&reading.operation_type)
        .bind(reading.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn query_readings(
        &self,
        equipment_id: Uuid,
        metric: UsageMetric,
        since: Option<DateTime<Utc>>,
    ) -> AppResult<Vec<UsageReading>> {
        let rows = sqlx::query_as::<_, UsageReadingRow>(
            r#"
            SELECT * FROM usage_readings
            WHERE equipment_id = $1
              AND reading_type = $2
              AND ($3::timestamptz IS NULL OR recorded_at >= $3)
            ORDER BY recorded_at, created_at
            "#,
        )
        .bind(equipment_id)
        .bind(metric.as_str())
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(UsageReading::try_from).collect()
    }

    async fn max_reading(&self, equipment_id: Uuid, metric: UsageMetric) -> AppResult<Option<f64>> {
        let max: Option<f64> = sqlx::query_scalar(
            "SELECT MAX(reading_value) FROM usage_readings WHERE equipment_id = $1 AND reading_type = $2",
        )
        .bind(equipment_id)
        .bind(metric.as_str())
        .fetch_one(&self.pool)
        .await?;
        Ok(max)
    }
}
