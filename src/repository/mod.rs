//! Repository layer: persistence for usage readings and maintenance schedules
//!
//! The scheduling services only see the [`UsageLogStore`] and
//! [`ScheduleStore`] traits. [`Repository`] implements them on PostgreSQL,
//! [`memory::MemoryRepository`] keeps everything in process.

pub mod memory;
pub mod schedules;
pub mod usage_readings;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{DueFilter, MaintenanceSchedule, ScheduleScope, UsageMetric, UsageReading},
};

/// Append-only log of equipment usage readings
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UsageLogStore: Send + Sync {
    /// Append one reading; readings are never updated afterwards
    async fn append_reading(&self, reading: &UsageReading) -> AppResult<()>;

    /// Readings for equipment + metric, ordered by `recorded_at`
    async fn query_readings(
        &self,
        equipment_id: Uuid,
        metric: UsageMetric,
        since: Option<DateTime<Utc>>,
    ) -> AppResult<Vec<UsageReading>>;

    /// Highest value ever recorded for equipment + metric
    async fn max_reading(&self, equipment_id: Uuid, metric: UsageMetric) -> AppResult<Option<f64>>;
}

/// Durable maintenance schedule records
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ScheduleStore: Send + Sync {
    /// Cheap round trip used by the readiness check
    async fn ping(&self) -> AppResult<()>;

    async fn get(&self, id: Uuid) -> AppResult<Option<MaintenanceSchedule>>;

    async fn list(&self, scope: &ScheduleScope) -> AppResult<Vec<MaintenanceSchedule>>;

    async fn list_by_equipment(&self, equipment_id: Uuid) -> AppResult<Vec<MaintenanceSchedule>>;

    /// IDs of every schedule the classifier still owns
    async fn list_active_ids(&self) -> AppResult<Vec<Uuid>>;

    /// Persisted due-work set, ordered by next service date
    async fn list_due(
        &self,
        filter: DueFilter,
        scope: &ScheduleScope,
    ) -> AppResult<Vec<MaintenanceSchedule>>;

    async fn create(&self, schedule: &MaintenanceSchedule) -> AppResult<MaintenanceSchedule>;

    /// Compare-and-swap write.
    ///
    /// Succeeds only if the stored `version` still equals `expected_version`;
    /// the stored version is then incremented. Returns `None` on conflict.
    async fn update(
        &self,
        schedule: &MaintenanceSchedule,
        expected_version: i64,
    ) -> AppResult<Option<MaintenanceSchedule>>;
}

/// PostgreSQL repository holding the connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
    pub schedules: schedules::SchedulesRepository,
    pub usage_readings: usage_readings::UsageReadingsRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            schedules: schedules::SchedulesRepository::new(pool.clone()),
            usage_readings: usage_readings::UsageReadingsRepository::new(pool.clone()),
            pool,
        }
    }
}
