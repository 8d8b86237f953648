//! Maintenance schedules repository for database operations

use async_trait::async_trait;
use sqlx::{Pool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::ScheduleStore;
use crate::{
    error::AppResult,
    models::{
        schedule::{MaintenanceSchedule, ScheduleRow},
        DueFilter, ScheduleScope, ScheduleStatus,
    },
};

const ACTIVE_STATUSES: [&str; 3] = ["scheduled", "due_soon", "overdue"];

#[derive(Clone)]
pub struct SchedulesRepository {
    pool: Pool<Postgres>,
}

impl SchedulesRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    fn push_scope(builder: &mut QueryBuilder<'_, Postgres>, scope: &ScheduleScope) {
        if let Some(shop_id) = scope.shop_id {
            builder.push(" AND shop_id = ").push_bind(shop_id);
        }
        if let Some(equipment_id) = scope.equipment_id {
            builder.push(" AND equipment_id = ").push_bind(equipment_id);
        }
    }

    async fn fetch(&self, mut builder: QueryBuilder<'_, Postgres>) -> AppResult<Vec<MaintenanceSchedule>> {
        let rows = builder
            .build_query_as::<ScheduleRow>()
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(MaintenanceSchedule::try_from).collect()
    }
}

#[async_trait]
impl ScheduleStore for SchedulesRepository {
    async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn get(&self, id: Uuid) -> AppResult<Option<MaintenanceSchedule>> {
        sqlx::query_as::<_, ScheduleRow>("SELECT * FROM maintenance_schedules WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(MaintenanceSchedule::try_from)
            .transpose()
    }

    async fn list(&self, scope: &ScheduleScope) -> AppResult<Vec<MaintenanceSchedule>> {
        let mut builder = QueryBuilder::new("SELECT * FROM maintenance_schedules WHERE TRUE");
        Self::push_scope(&mut builder, scope);
        builder.push(" ORDER BY next_service_date NULLS LAST, name");
        self.fetch(builder).await
    }

    async fn list_by_equipment(&self, equipment_id: Uuid) -> AppResult<Vec<MaintenanceSchedule>> {
        let rows = sqlx::query_as::<_, ScheduleRow>(
            "SELECT * FROM maintenance_schedules WHERE equipment_id = $1 ORDER BY created_at",
        )
        .bind(equipment_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(MaintenanceSchedule::try_from).collect()
    }

    async fn list_active_ids(&self) -> AppResult<Vec<Uuid>> {
        let ids = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM maintenance_schedules WHERE status = ANY($1) ORDER BY id",
        )
        .bind(&ACTIVE_STATUSES[..])
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }

    async fn list_due(
        &self,
        filter: DueFilter,
        scope: &ScheduleScope,
    ) -> AppResult<Vec<MaintenanceSchedule>> {
        let mut builder = QueryBuilder::new("SELECT * FROM maintenance_schedules WHERE status = ANY(");
        builder.push_bind(&ACTIVE_STATUSES[..]).push(")");

        match filter {
            DueFilter::DueSoon => {
                builder
                    .push(" AND NOT needs_attention AND status = ")
                    .push_bind(ScheduleStatus::DueSoon.as_str());
            }
            DueFilter::Overdue => {
                builder
                    .push(" AND NOT needs_attention AND status = ")
                    .push_bind(ScheduleStatus::Overdue.as_str());
            }
            DueFilter::NeedsAttention => {
                builder.push(" AND needs_attention");
            }
        }

        Self::push_scope(&mut builder, scope);
        builder.push(" ORDER BY next_service_date NULLS LAST, name");
        self.fetch(builder).await
    }

    async fn create(&self, s: &MaintenanceSchedule) -> AppResult<MaintenanceSchedule> {
        let row = sqlx::query_as::<_, ScheduleRow>(
            r#"
            INSERT INTO maintenance_schedules (
                id, equipment_id, shop_id, name, description,
                trigger_type, time_interval_days, usage_interval, usage_metric, priority,
                last_service_date, last_service_reading, locked_service_date,
                next_service_date, computed_service_date, next_service_reading,
                current_reading, average_daily_usage, predicted_service_date,
                usage_due_now, needs_attention, status, last_evaluated_on,
                version, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13,
                    $14, $15, $16, $17, $18, $19, $20, $21, $22, $23, $24, $25, $26)
            RETURNING *
            "#,
        )
        .bind(s.id)
        .bind(s.equipment_id)
        .bind(s.shop_id)
        .bind(&s.name)
        .bind(&s.description)
        .bind(s.trigger_type.as_str())
        .bind(s.time_interval_days)
        .bind(s.usage_interval)
        .bind(s.usage_metric.map(|m| m.as_str()))
        .bind(s.priority.as_str())
        .bind(s.last_service_date)
        .bind(s.last_service_reading)
        .bind(s.locked_service_date)
        .bind(s.next_service_date)
        .bind(s.computed_service_date)
        .bind(s.next_service_reading)
        .bind(s.current_reading)
        .bind(s.average_daily_usage)
        .bind(s.predicted_service_date)
        .bind(s.usage_due_now)
        .bind(s.needs_attention)
        .bind(s.status.as_str())
        .bind(s.last_evaluated_on)
        .bind(s.version)
        .bind(s.created_at)
        .bind(s.updated_at)
        .fetch_one(&self.pool)
        .await?;

        MaintenanceSchedule::try_from(row)
    }

    async fn update(
        &self,
        s: &MaintenanceSchedule,
        expected_version: i64,
    ) -> AppResult<Option<MaintenanceSchedule>> {
        let row = sqlx::query_as::<_, ScheduleRow>(
            r#"
            UPDATE maintenance_schedules SET
                shop_id = $3, name = $4, description = $5,
                trigger_type = $6, time_interval_days = $7, usage_interval = $8,
                usage_metric = $9, priority = $10,
                last_service_date = $11, last_service_reading = $12, locked_service_date = $13,
                next_service_date = $14, computed_service_date = $15, next_service_reading = $16,
                current_reading = $17, average_daily_usage = $18, predicted_service_date = $19,
                usage_due_now = $20, needs_attention = $21, status = $22, last_evaluated_on = $23,
                version = version + 1,
                updated_at = NOW()
            WHERE id = $1 AND version = $2
            RETURNING *
            "#,
        )
        .bind(s.id)
        .bind(expected_version)
        .bind(s.shop_id)
        .bind(&s.name)
        .bind(&s.description)
        .bind(s.trigger_type.as_str())
        .bind(s.time_interval_days)
        .bind(s.usage_interval)
        .bind(s.usage_metric.map(|m| m.as_str()))
        .bind(s.priority.as_str())
        .bind(s.last_service_date)
        .bind(s.last_service_reading)
        .bind(s.locked_service_date)
        .bind(s.next_service_date)
        .bind(s.computed_service_date)
        .bind(s.next_service_reading)
        .bind(s.current_reading)
        .bind(s.average_daily_usage)
        .bind(s.predicted_service_date)
        .bind(s.usage_due_now)
        .bind(s.needs_attention)
        .bind(s.status.as_str())
        .bind(s.last_evaluated_on)
        .fetch_optional(&self.pool)
        .await?;

        row.map(MaintenanceSchedule::try_from).transpose()
    }
}
