//! In-process store used for development (`storage.backend = "memory"`) and tests

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{ScheduleStore, UsageLogStore};
use crate::{
    error::{AppError, AppResult},
    models::{DueFilter, MaintenanceSchedule, ScheduleScope, UsageMetric, UsageReading},
};

#[derive(Clone, Default)]
pub struct MemoryRepository {
    schedules: Arc<RwLock<HashMap<Uuid, MaintenanceSchedule>>>,
    readings: Arc<RwLock<Vec<UsageReading>>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored readings (audit history included)
    pub async fn reading_count(&self) -> usize {
        self.readings.read().await.len()
    }
}

fn sort_for_listing(schedules: &mut [MaintenanceSchedule]) {
    schedules.sort_by(|a, b| {
        // NULLS LAST, like the SQL ordering
        let key = |s: &MaintenanceSchedule| (s.next_service_date.is_none(), s.next_service_date);
        key(a).cmp(&key(b)).then_with(|| a.name.cmp(&b.name))
    });
}

#[async_trait]
impl UsageLogStore for MemoryRepository {
    async fn append_reading(&self, reading: &UsageReading) -> AppResult<()> {
        self.readings.write().await.push(reading.clone());
        Ok(())
    }

    async fn query_readings(
        &self,
        equipment_id: Uuid,
        metric: UsageMetric,
        since: Option<DateTime<Utc>>,
    ) -> AppResult<Vec<UsageReading>> {
        let mut readings: Vec<UsageReading> = self
            .readings
            .read()
            .await
            .iter()
            .filter(|r| r.equipment_id == equipment_id && r.reading_type == metric)
            .filter(|r| since.map_or(true, |s| r.recorded_at >= s))
            .cloned()
            .collect();
        readings.sort_by(|a, b| {
            a.recorded_at
                .cmp(&b.recorded_at)
                .then(a.created_at.cmp(&b.created_at))
        });
        Ok(readings)
    }

    async fn max_reading(&self, equipment_id: Uuid, metric: UsageMetric) -> AppResult<Option<f64>> {
        let max = self
            .readings
            .read()
            .await
            .iter()
            .filter(|r| r.equipment_id == equipment_id && r.reading_type == metric)
            .map(|r| r.reading_value)
            .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |a| a.max(v))));
        Ok(max)
    }
}

#[async_trait]
impl ScheduleStore for MemoryRepository {
    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }

    async fn get(&self, id: Uuid) -> AppResult<Option<MaintenanceSchedule>> {
        Ok(self.schedules.read().await.get(&id).cloned())
    }

    async fn list(&self, scope: &ScheduleScope) -> AppResult<Vec<MaintenanceSchedule>> {
        let mut rows: Vec<_> = self
            .schedules
            .read()
            .await
            .values()
            .filter(|s| scope.matches(s))
            .cloned()
            .collect();
        sort_for_listing(&mut rows);
        Ok(rows)
    }

    async fn list_by_equipment(&self, equipment_id: Uuid) -> AppResult<Vec<MaintenanceSchedule>> {
        let mut rows: Vec<_> = self
            .schedules
            .read()
            .await
            .values()
            .filter(|s| s.equipment_id == equipment_id)
            .cloned()
            .collect();
        rows.sort_by_key(|s| s.created_at);
        Ok(rows)
    }

    async fn list_active_ids(&self) -> AppResult<Vec<Uuid>> {
        let mut ids: Vec<Uuid> = self
            .schedules
            .read()
            .await
            .values()
            .filter(|s| s.status.is_active())
            .map(|s| s.id)
            .collect();
        ids.sort();
        Ok(ids)
    }

    async fn list_due(
        &self,
        filter: DueFilter,
        scope: &ScheduleScope,
    ) -> AppResult<Vec<MaintenanceSchedule>> {
        let mut rows: Vec<_> = self
            .schedules
            .read()
            .await
            .values()
            .filter(|s| filter.matches(s) && scope.matches(s))
            .cloned()
            .collect();
        sort_for_listing(&mut rows);
        Ok(rows)
    }

    async fn create(&self, schedule: &MaintenanceSchedule) -> AppResult<MaintenanceSchedule> {
        let mut schedules = self.schedules.write().await;
        if schedules.contains_key(&schedule.id) {
            return Err(AppError::Conflict(format!(
                "Schedule {} already exists",
                schedule.id
            )));
        }
        schedules.insert(schedule.id, schedule.clone());
        Ok(schedule.clone())
    }

    async fn update(
        &self,
        schedule: &MaintenanceSchedule,
        expected_version: i64,
    ) -> AppResult<Option<MaintenanceSchedule>> {
        let mut schedules = self.schedules.write().await;
        let Some(stored) = schedules.get_mut(&schedule.id) else {
            return Ok(None);
        };
        if stored.version != expected_version {
            return Ok(None);
        }

        let mut next = schedule.clone();
        next.created_at = stored.created_at;
        next.version = expected_version + 1;
        next.updated_at = Utc::now();
        *stored = next.clone();
        Ok(Some(next))
    }
}
