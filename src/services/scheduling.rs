//! Scheduling service: the façade over reconciliation and persistence
//!
//! Every write goes through [`SchedulingService::modify`], which serializes
//! work per schedule, recomputes the derived state, skips the write when
//! nothing changed and retries on version conflicts.

use std::future::Future;
use std::sync::Arc;

use chrono::NaiveDate;
use uuid::Uuid;
use validator::Validate;

use super::{
    clock::Clock,
    events::{self, EventBus, MaintenanceEvent, MaintenanceEventKind},
    locks::KeyedLocks,
};
use crate::{
    config::SchedulingConfig,
    error::{AppError, AppResult},
    maintenance::{reconcile, velocity, ReconcileSettings, UsageSnapshot},
    models::{
        schedule::{validate_triggers, CompleteService, CreateSchedule, UpdateSchedule},
        DueFilter, MaintenanceSchedule, ScheduleScope, ScheduleStatus, UsageMetric,
    },
    repository::{ScheduleStore, UsageLogStore},
};

/// Version conflicts tolerated before giving up on a write
const MAX_WRITE_ATTEMPTS: usize = 5;

/// Result of one serialized schedule write
#[derive(Debug, Clone)]
pub(crate) struct Outcome {
    pub schedule: MaintenanceSchedule,
    pub written: bool,
}

#[derive(Clone)]
pub struct SchedulingService {
    schedules: Arc<dyn ScheduleStore>,
    usage: Arc<dyn UsageLogStore>,
    settings: SchedulingConfig,
    clock: Arc<dyn Clock>,
    events: EventBus,
    locks: KeyedLocks,
}

impl SchedulingService {
    pub fn new(
        schedules: Arc<dyn ScheduleStore>,
        usage: Arc<dyn UsageLogStore>,
        settings: SchedulingConfig,
        clock: Arc<dyn Clock>,
        events: EventBus,
    ) -> Self {
        Self {
            schedules,
            usage,
            settings,
            clock,
            events,
            locks: KeyedLocks::default(),
        }
    }

    pub fn settings(&self) -> &SchedulingConfig {
        &self.settings
    }

    pub(crate) fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    pub(crate) fn locks(&self) -> &KeyedLocks {
        &self.locks
    }

    pub(crate) fn schedule_store(&self) -> &dyn ScheduleStore {
        self.schedules.as_ref()
    }

    /// Bound a store call by the configured timeout
    pub(crate) async fn io<T, F>(&self, operation: &str, fut: F) -> AppResult<T>
    where
        F: Future<Output = AppResult<T>>,
    {
        match tokio::time::timeout(self.settings.store_timeout(), fut).await {
            Ok(result) => result,
            Err(_) => Err(AppError::StoreUnavailable(format!(
                "{} timed out after {} ms",
                operation, self.settings.store_timeout_ms
            ))),
        }
    }

    fn reconcile_settings(&self) -> ReconcileSettings {
        ReconcileSettings {
            due_soon_window_days: self.settings.due_soon_window_days,
        }
    }

    async fn load(&self, id: Uuid) -> AppResult<MaintenanceSchedule> {
        self.io("load schedule", self.schedules.get(id))
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Schedule {} not found", id)))
    }

    /// Current reading and velocity for the schedule's usage metric.
    ///
    /// `None` for schedules without a usage trigger.
    async fn usage_snapshot(&self, schedule: &MaintenanceSchedule) -> AppResult<Option<UsageSnapshot>> {
        let metric = match schedule.usage_metric {
            Some(metric) if schedule.trigger_type.uses_usage() => metric,
            _ => return Ok(None),
        };

        let now = self.clock.now();
        let window = self.settings.velocity_window();
        let current_reading = self
            .io(
                "read current reading",
                self.usage.max_reading(schedule.equipment_id, metric),
            )
            .await?;
        let readings = self
            .io(
                "query usage readings",
                self.usage
                    .query_readings(schedule.equipment_id, metric, Some(now - window)),
            )
            .await?;

        Ok(Some(UsageSnapshot {
            current_reading,
            velocity: velocity::estimate(&readings, now, window),
        }))
    }

    /// Recompute the derived state of `schedule` in place (terminal schedules are left alone)
    async fn refresh(&self, schedule: &mut MaintenanceSchedule) -> AppResult<()> {
        if schedule.status.is_terminal() {
            return Ok(());
        }
        let usage = self.usage_snapshot(schedule).await?;
        let state = reconcile(
            schedule,
            usage.as_ref(),
            self.clock.today(),
            &self.reconcile_settings(),
        );
        schedule.apply_state(state);
        Ok(())
    }

    fn publish_transition(&self, before: Option<&MaintenanceSchedule>, after: &MaintenanceSchedule) {
        for event in events::transition_events(before, after, self.clock.now()) {
            tracing::debug!(
                schedule_id = %after.id,
                kind = ?event.kind,
                status = %after.status,
                "Publishing maintenance event"
            );
            self.events.publish(event);
        }
    }

    /// Load, change, recompute and compare-and-swap one schedule.
    ///
    /// `change` runs against a fresh copy on every attempt. No write happens
    /// when the result equals the stored record.
    pub(crate) async fn modify<F>(&self, id: Uuid, change: F) -> AppResult<Outcome>
    where
        F: Fn(&mut MaintenanceSchedule) -> AppResult<()>,
    {
        let _guard = self.locks.acquire(id).await;
        self.modify_locked(id, change).await
    }

    /// [`modify`](Self::modify) for callers already holding the schedule's lock
    async fn modify_locked<F>(&self, id: Uuid, change: F) -> AppResult<Outcome>
    where
        F: Fn(&mut MaintenanceSchedule) -> AppResult<()>,
    {
        for attempt in 1..=MAX_WRITE_ATTEMPTS {
            let stored = self.load(id).await?;
            let mut next = stored.clone();
            change(&mut next)?;
            self.refresh(&mut next).await?;

            if next == stored {
                return Ok(Outcome {
                    schedule: stored,
                    written: false,
                });
            }

            match self
                .io("update schedule", self.schedules.update(&next, stored.version))
                .await?
            {
                Some(saved) => {
                    self.publish_transition(Some(&stored), &saved);
                    return Ok(Outcome {
                        schedule: saved,
                        written: true,
                    });
                }
                None => {
                    tracing::debug!(schedule_id = %id, attempt, "Schedule version conflict, retrying");
                }
            }
        }

        Err(AppError::Conflict(format!(
            "Schedule {} kept changing concurrently; gave up after {} attempts",
            id, MAX_WRITE_ATTEMPTS
        )))
    }

    // ---- Configuration ----

    /// Create a schedule and compute its initial state.
    ///
    /// The service baseline defaults to today and to the equipment's
    /// current reading (0 when nothing was ever recorded).
    pub async fn create_schedule(&self, data: CreateSchedule) -> AppResult<MaintenanceSchedule> {
        data.validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;
        validate_triggers(
            data.trigger_type,
            data.time_interval_days,
            data.usage_interval,
            data.usage_metric,
        )?;

        let now = self.clock.now();
        let today = self.clock.today();

        let last_service_reading = match (data.last_service_reading, data.usage_metric) {
            (Some(reading), _) => Some(reading),
            (None, Some(metric)) if data.trigger_type.uses_usage() => Some(
                self.io(
                    "read current reading",
                    self.usage.max_reading(data.equipment_id, metric),
                )
                .await?
                .unwrap_or(0.0),
            ),
            (None, _) => None,
        };

        let mut schedule = MaintenanceSchedule {
            id: Uuid::new_v4(),
            equipment_id: data.equipment_id,
            shop_id: data.shop_id,
            name: data.name,
            description: data.description,
            trigger_type: data.trigger_type,
            time_interval_days: data.time_interval_days,
            usage_interval: data.usage_interval,
            usage_metric: data.usage_metric,
            priority: data.priority.unwrap_or_default(),
            last_service_date: Some(data.last_service_date.unwrap_or(today)),
            last_service_reading,
            locked_service_date: data.locked_service_date,
            next_service_date: None,
            computed_service_date: None,
            next_service_reading: None,
            current_reading: None,
            average_daily_usage: None,
            predicted_service_date: None,
            usage_due_now: false,
            needs_attention: false,
            status: ScheduleStatus::Scheduled,
            last_evaluated_on: None,
            version: 0,
            created_at: now,
            updated_at: now,
        };
        self.refresh(&mut schedule).await?;

        let created = self
            .io("create schedule", self.schedules.create(&schedule))
            .await?;

        tracing::info!(
            schedule_id = %created.id,
            equipment_id = %created.equipment_id,
            trigger_type = %created.trigger_type,
            status = %created.status,
            next_service_date = ?created.next_service_date,
            "Maintenance schedule created"
        );
        self.publish_transition(None, &created);
        Ok(created)
    }

    /// Apply a configuration change and recompute
    pub async fn update_schedule(&self, id: Uuid, data: UpdateSchedule) -> AppResult<MaintenanceSchedule> {
        data.validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let _guard = self.locks.acquire(id).await;

        // A schedule switched onto a usage trigger starts from the current reading
        let stored = self.load(id).await?;
        let trigger_type = data.trigger_type.unwrap_or(stored.trigger_type);
        let baseline = match data.usage_metric.or(stored.usage_metric) {
            Some(metric) if trigger_type.uses_usage() && stored.last_service_reading.is_none() => Some(
                self.io(
                    "read current reading",
                    self.usage.max_reading(stored.equipment_id, metric),
                )
                .await?
                .unwrap_or(0.0),
            ),
            _ => None,
        };

        let outcome = self
            .modify_locked(id, |schedule| {
                reject_cancelled(schedule, "update")?;
                if let Some(ref name) = data.name {
                    schedule.name = name.clone();
                }
                if data.description.is_some() {
                    schedule.description = data.description.clone();
                }
                if data.shop_id.is_some() {
                    schedule.shop_id = data.shop_id;
                }
                if let Some(trigger_type) = data.trigger_type {
                    schedule.trigger_type = trigger_type;
                }
                if data.time_interval_days.is_some() {
                    schedule.time_interval_days = data.time_interval_days;
                }
                if data.usage_interval.is_some() {
                    schedule.usage_interval = data.usage_interval;
                }
                if data.usage_metric.is_some() {
                    schedule.usage_metric = data.usage_metric;
                }
                if let Some(priority) = data.priority {
                    schedule.priority = priority;
                }
                if schedule.trigger_type.uses_usage() && schedule.last_service_reading.is_none() {
                    schedule.last_service_reading = baseline;
                }
                schedule.validate_configuration()
            })
            .await?;

        Ok(outcome.schedule)
    }

    pub async fn get_schedule(&self, id: Uuid) -> AppResult<MaintenanceSchedule> {
        self.load(id).await
    }

    pub async fn list_schedules(&self, scope: &ScheduleScope) -> AppResult<Vec<MaintenanceSchedule>> {
        self.io("list schedules", self.schedules.list(scope)).await
    }

    // ---- Recompute ----

    /// Recompute one schedule from the current usage data and today's date
    pub async fn recompute_schedule(&self, id: Uuid) -> AppResult<MaintenanceSchedule> {
        Ok(self.recompute_outcome(id).await?.schedule)
    }

    pub(crate) async fn recompute_outcome(&self, id: Uuid) -> AppResult<Outcome> {
        self.modify(id, |_| Ok(())).await
    }

    /// Recompute every non-terminal schedule of a piece of equipment.
    ///
    /// A schedule that fails is logged and skipped; the sweep retries it.
    pub async fn recompute(&self, equipment_id: Uuid) -> AppResult<Vec<MaintenanceSchedule>> {
        self.recompute_matching(equipment_id, |_| true).await
    }

    /// Recompute the usage-triggered schedules of `equipment_id` that track `metric`
    pub async fn recompute_for_metric(
        &self,
        equipment_id: Uuid,
        metric: UsageMetric,
    ) -> AppResult<Vec<MaintenanceSchedule>> {
        self.recompute_matching(equipment_id, |s| {
            s.trigger_type.uses_usage() && s.usage_metric == Some(metric)
        })
        .await
    }

    async fn recompute_matching<P>(&self, equipment_id: Uuid, predicate: P) -> AppResult<Vec<MaintenanceSchedule>>
    where
        P: Fn(&MaintenanceSchedule) -> bool,
    {
        let candidates = self
            .io(
                "list equipment schedules",
                self.schedules.list_by_equipment(equipment_id),
            )
            .await?;

        let mut recomputed = Vec::new();
        for schedule in candidates
            .iter()
            .filter(|s| !s.status.is_terminal() && predicate(s))
        {
            match self.recompute_schedule(schedule.id).await {
                Ok(updated) => recomputed.push(updated),
                Err(e) => {
                    tracing::warn!(
                        schedule_id = %schedule.id,
                        equipment_id = %equipment_id,
                        error = %e,
                        "Schedule recompute failed, leaving it for the sweep"
                    );
                }
            }
        }
        Ok(recomputed)
    }

    // ---- Lifecycle ----

    /// Record a completed service: reset the baseline, clear the lock and
    /// start a new cycle.
    pub async fn complete_service(&self, id: Uuid, data: CompleteService) -> AppResult<MaintenanceSchedule> {
        data.validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let _guard = self.locks.acquire(id).await;

        let completion_reading = match data.completion_reading {
            Some(reading) => Some(reading),
            None => self.current_reading_of(id).await?,
        };

        let outcome = self
            .modify_locked(id, |schedule| {
                reject_cancelled(schedule, "complete")?;
                schedule.last_service_date = Some(data.completion_date);
                if schedule.trigger_type.uses_usage() {
                    schedule.last_service_reading =
                        completion_reading.or(schedule.last_service_reading);
                }
                schedule.locked_service_date = None;
                schedule.status = ScheduleStatus::Scheduled;
                Ok(())
            })
            .await?;

        let completed = outcome.schedule;
        tracing::info!(
            schedule_id = %completed.id,
            completion_date = %data.completion_date,
            completion_reading = ?completed.last_service_reading,
            next_service_date = ?completed.next_service_date,
            "Service completed"
        );
        self.events.publish(MaintenanceEvent::new(
            MaintenanceEventKind::ServiceCompleted,
            &completed,
            None,
            self.clock.now(),
        ));
        Ok(completed)
    }

    /// Highest known meter value for the schedule's metric
    async fn current_reading_of(&self, id: Uuid) -> AppResult<Option<f64>> {
        let schedule = self.load(id).await?;
        let logged = match schedule.usage_metric {
            Some(metric) if schedule.trigger_type.uses_usage() => {
                self.io(
                    "read current reading",
                    self.usage.max_reading(schedule.equipment_id, metric),
                )
                .await?
            }
            _ => None,
        };
        Ok([logged, schedule.current_reading, schedule.last_service_reading]
            .into_iter()
            .flatten()
            .reduce(f64::max))
    }

    /// Move a schedule to the terminal `cancelled` state (cancelling twice is a no-op)
    pub async fn cancel_schedule(&self, id: Uuid) -> AppResult<MaintenanceSchedule> {
        let outcome = self
            .modify(id, |schedule| {
                schedule.status = ScheduleStatus::Cancelled;
                Ok(())
            })
            .await?;

        if outcome.written {
            tracing::info!(schedule_id = %id, "Maintenance schedule cancelled");
        }
        Ok(outcome.schedule)
    }

    /// Pin the due date until [`unlock`](Self::unlock) is called
    pub async fn lock_service_date(&self, id: Uuid, date: NaiveDate) -> AppResult<MaintenanceSchedule> {
        let outcome = self
            .modify(id, |schedule| {
                reject_cancelled(schedule, "lock")?;
                schedule.locked_service_date = Some(date);
                Ok(())
            })
            .await?;

        tracing::info!(schedule_id = %id, locked_service_date = %date, "Service date locked");
        Ok(outcome.schedule)
    }

    /// Clear the pinned date and fall back to the computed one
    pub async fn unlock(&self, id: Uuid) -> AppResult<MaintenanceSchedule> {
        let outcome = self
            .modify(id, |schedule| {
                reject_cancelled(schedule, "unlock")?;
                schedule.locked_service_date = None;
                Ok(())
            })
            .await?;

        tracing::info!(schedule_id = %id, "Service date unlocked");
        Ok(outcome.schedule)
    }

    // ---- Queries ----

    /// Check the schedule store answers within the store timeout
    pub async fn ping(&self) -> AppResult<()> {
        self.io("ping schedule store", self.schedules.ping()).await
    }

    /// Persisted due-work set; nothing is recomputed here
    pub async fn list_due(
        &self,
        filter: DueFilter,
        scope: &ScheduleScope,
    ) -> AppResult<Vec<MaintenanceSchedule>> {
        self.io("list due schedules", self.schedules.list_due(filter, scope))
            .await
    }
}

fn reject_cancelled(schedule: &MaintenanceSchedule, action: &str) -> AppResult<()> {
    if schedule.status.is_terminal() {
        return Err(AppError::InvalidTransition(format!(
            "Cannot {} schedule {}: it is {}",
            action, schedule.id, schedule.status
        )));
    }
    Ok(())
}
