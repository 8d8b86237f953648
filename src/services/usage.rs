//! Usage log ingest service

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;
use validator::Validate;

use super::{clock::Clock, scheduling::SchedulingService};
use crate::{
    error::{AppError, AppResult},
    models::{usage::CreateUsageReading, UsageMetric, UsageReading},
    repository::UsageLogStore,
};

/// Accepted reading plus the schedules it caused to be recomputed
#[derive(Debug, Clone, serde::Serialize, utoipa::ToSchema)]
pub struct RecordedReading {
    pub reading: UsageReading,
    pub schedules_recomputed: usize,
}

#[derive(Clone)]
pub struct UsageService {
    store: Arc<dyn UsageLogStore>,
    scheduling: SchedulingService,
    clock: Arc<dyn Clock>,
}

impl UsageService {
    pub fn new(store: Arc<dyn UsageLogStore>, scheduling: SchedulingService, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            scheduling,
            clock,
        }
    }

    /// Validate and append a reading, then recompute the affected schedules.
    ///
    /// Backfilled readings are stored for audit. Once the append succeeded a
    /// failing recompute does not fail the call; the sweep picks it up.
    pub async fn record_reading(&self, data: CreateUsageReading) -> AppResult<RecordedReading> {
        data.validate()
            .map_err(|e| AppError::InvalidReading(e.to_string()))?;
        if !data.reading_value.is_finite() {
            return Err(AppError::InvalidReading(
                "reading_value must be a finite number".to_string(),
            ));
        }

        let now = self.clock.now();
        let tolerance = self.scheduling.settings().clock_skew_tolerance();
        if data.recorded_at > now + tolerance {
            return Err(AppError::InvalidReading(format!(
                "recorded_at {} is in the future",
                data.recorded_at.to_rfc3339()
            )));
        }

        let reading = UsageReading {
            id: Uuid::new_v4(),
            equipment_id: data.equipment_id,
            reading_type: data.reading_type,
            reading_value: data.reading_value,
            recorded_at: data.recorded_at,
            operation_type: data.operation_type,
            created_at: now,
        };

        self.scheduling
            .io("append usage reading", self.store.append_reading(&reading))
            .await?;

        tracing::debug!(
            equipment_id = %reading.equipment_id,
            metric = %reading.reading_type,
            value = reading.reading_value,
            "Usage reading recorded"
        );

        let schedules_recomputed = match self
            .scheduling
            .recompute_for_metric(reading.equipment_id, reading.reading_type)
            .await
        {
            Ok(recomputed) => recomputed.len(),
            Err(e) => {
                tracing::warn!(
                    equipment_id = %reading.equipment_id,
                    error = %e,
                    "Recompute after ingest failed, leaving it for the sweep"
                );
                0
            }
        };

        Ok(RecordedReading {
            reading,
            schedules_recomputed,
        })
    }

    /// Readings of one equipment + metric ordered by `recorded_at`
    pub async fn list_readings(
        &self,
        equipment_id: Uuid,
        metric: UsageMetric,
        since: Option<DateTime<Utc>>,
    ) -> AppResult<Vec<UsageReading>> {
        self.scheduling
            .io(
                "query usage readings",
                self.store.query_readings(equipment_id, metric, since),
            )
            .await
    }

    /// Highest value ever recorded; backfilled readings never lower it
    pub async fn current_reading(&self, equipment_id: Uuid, metric: UsageMetric) -> AppResult<Option<f64>> {
        self.scheduling
            .io("read current reading", self.store.max_reading(equipment_id, metric))
            .await
    }
}

/// Parse an optional `YYYY-MM-DD` lower bound into the start of that day (UTC)
pub fn parse_since(since: Option<&str>) -> AppResult<Option<DateTime<Utc>>> {
    since
        .map(|s| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .map_err(|_| AppError::BadRequest(format!("Invalid date '{}', expected YYYY-MM-DD", s)))
                .map(|d| d.and_time(chrono::NaiveTime::MIN).and_utc())
        })
        .transpose()
}
