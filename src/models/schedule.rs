//! Maintenance schedule models

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use super::enums::{Priority, ScheduleStatus, TriggerType, UsageMetric};
use crate::error::{AppError, AppResult};

// ---------------------------------------------------------------------------
// MaintenanceSchedule
// ---------------------------------------------------------------------------

/// One recurring maintenance definition for one piece of equipment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct MaintenanceSchedule {
    pub id: Uuid,
    pub equipment_id: Uuid,
    /// Shop (tenant location) owning the equipment
    pub shop_id: Option<Uuid>,
    pub name: String,
    pub description: Option<String>,

    // -- configuration (owned by equipment management) --
    pub trigger_type: TriggerType,
    pub time_interval_days: Option<i32>,
    pub usage_interval: Option<f64>,
    pub usage_metric: Option<UsageMetric>,
    pub priority: Priority,

    // -- cycle baseline --
    pub last_service_date: Option<NaiveDate>,
    pub last_service_reading: Option<f64>,

    /// Manually pinned due date; overrides any computed date while set
    pub locked_service_date: Option<NaiveDate>,

    // -- computed state --
    /// Effective due date (the lock when present, otherwise the computed date)
    pub next_service_date: Option<NaiveDate>,
    /// Reconciled date before the lock override is applied
    pub computed_service_date: Option<NaiveDate>,
    pub next_service_reading: Option<f64>,
    /// Highest known meter value for the schedule's metric
    pub current_reading: Option<f64>,
    /// Average usage per day over the trailing window
    pub average_daily_usage: Option<f64>,
    /// Calendar date the usage trigger is projected to fire
    pub predicted_service_date: Option<NaiveDate>,
    /// The usage interval has already been reached
    pub usage_due_now: bool,
    /// No trigger could produce a due date; status was held
    pub needs_attention: bool,
    pub status: ScheduleStatus,
    /// The day the classifier last evaluated this schedule against
    pub last_evaluated_on: Option<NaiveDate>,

    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The fields a recompute owns
///
/// Two equal states mean a recompute produced nothing new and no write is needed.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScheduleState {
    pub next_service_date: Option<NaiveDate>,
    pub computed_service_date: Option<NaiveDate>,
    pub next_service_reading: Option<f64>,
    pub current_reading: Option<f64>,
    pub average_daily_usage: Option<f64>,
    pub predicted_service_date: Option<NaiveDate>,
    pub usage_due_now: bool,
    pub needs_attention: bool,
    pub status: ScheduleStatus,
    pub last_evaluated_on: Option<NaiveDate>,
}

impl MaintenanceSchedule {
    pub fn state(&self) -> ScheduleState {
        ScheduleState {
            next_service_date: self.next_service_date,
            computed_service_date: self.computed_service_date,
            next_service_reading: self.next_service_reading,
            current_reading: self.current_reading,
            average_daily_usage: self.average_daily_usage,
            predicted_service_date: self.predicted_service_date,
            usage_due_now: self.usage_due_now,
            needs_attention: self.needs_attention,
            status: self.status,
            last_evaluated_on: self.last_evaluated_on,
        }
    }

    pub fn apply_state(&mut self, state: ScheduleState) {
        self.next_service_date = state.next_service_date;
        self.computed_service_date = state.computed_service_date;
        self.next_service_reading = state.next_service_reading;
        self.current_reading = state.current_reading;
        self.average_daily_usage = state.average_daily_usage;
        self.predicted_service_date = state.predicted_service_date;
        self.usage_due_now = state.usage_due_now;
        self.needs_attention = state.needs_attention;
        self.status = state.status;
        self.last_evaluated_on = state.last_evaluated_on;
    }

    /// Check the trigger configuration is consistent with `trigger_type`
    pub fn validate_configuration(&self) -> AppResult<()> {
        validate_triggers(
            self.trigger_type,
            self.time_interval_days,
            self.usage_interval,
            self.usage_metric,
        )
    }
}

/// `time_based` needs a day interval, `usage_based` needs interval + metric,
/// `both` needs all of them.
pub fn validate_triggers(
    trigger_type: TriggerType,
    time_interval_days: Option<i32>,
    usage_interval: Option<f64>,
    usage_metric: Option<UsageMetric>,
) -> AppResult<()> {
    if trigger_type.uses_time() {
        match time_interval_days {
            Some(days) if days > 0 => {}
            Some(days) => {
                return Err(AppError::InvalidConfiguration(format!(
                    "time_interval_days must be positive, got {}",
                    days
                )))
            }
            None => {
                return Err(AppError::InvalidConfiguration(format!(
                    "{} schedules require time_interval_days",
                    trigger_type
                )))
            }
        }
    }

    if trigger_type.uses_usage() {
        match usage_interval {
            Some(interval) if interval.is_finite() && interval > 0.0 => {}
            Some(interval) => {
                return Err(AppError::InvalidConfiguration(format!(
                    "usage_interval must be positive, got {}",
                    interval
                )))
            }
            None => {
                return Err(AppError::InvalidConfiguration(format!(
                    "{} schedules require usage_interval",
                    trigger_type
                )))
            }
        }
        if usage_metric.is_none() {
            return Err(AppError::InvalidConfiguration(format!(
                "{} schedules require usage_metric",
                trigger_type
            )));
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Create schedule request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateSchedule {
    pub equipment_id: Uuid,
    pub shop_id: Option<Uuid>,
    #[validate(length(min = 1, max = 200, message = "name must be 1-200 characters"))]
    pub name: String,
    pub description: Option<String>,
    pub trigger_type: TriggerType,
    pub time_interval_days: Option<i32>,
    pub usage_interval: Option<f64>,
    pub usage_metric: Option<UsageMetric>,
    pub priority: Option<Priority>,
    /// Baseline service date (defaults to today)
    pub last_service_date: Option<NaiveDate>,
    /// Baseline meter value (defaults to the current reading)
    #[validate(range(min = 0.0, message = "last_service_reading must not be negative"))]
    pub last_service_reading: Option<f64>,
    pub locked_service_date: Option<NaiveDate>,
}

/// Update schedule configuration request
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateSchedule {
    #[validate(length(min = 1, max = 200, message = "name must be 1-200 characters"))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub shop_id: Option<Uuid>,
    pub trigger_type: Option<TriggerType>,
    pub time_interval_days: Option<i32>,
    pub usage_interval: Option<f64>,
    pub usage_metric: Option<UsageMetric>,
    pub priority: Option<Priority>,
}

/// Record a completed service request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CompleteService {
    pub completion_date: NaiveDate,
    /// Meter value at completion (defaults to the current reading)
    #[validate(range(min = 0.0, message = "completion_reading must not be negative"))]
    pub completion_reading: Option<f64>,
}

/// Pin a schedule's due date
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct LockServiceDate {
    pub locked_service_date: NaiveDate,
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Shop / equipment scope for schedule queries
#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
pub struct ScheduleScope {
    pub shop_id: Option<Uuid>,
    pub equipment_id: Option<Uuid>,
}

impl ScheduleScope {
    pub fn matches(&self, schedule: &MaintenanceSchedule) -> bool {
        self.shop_id.map_or(true, |s| schedule.shop_id == Some(s))
            && self.equipment_id.map_or(true, |e| schedule.equipment_id == e)
    }
}

/// Which due-work set to list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DueFilter {
    DueSoon,
    Overdue,
    /// Schedules that could not be resolved to a due date
    NeedsAttention,
}

impl DueFilter {
    pub fn matches(&self, schedule: &MaintenanceSchedule) -> bool {
        if !schedule.status.is_active() {
            return false;
        }
        match self {
            DueFilter::DueSoon => {
                schedule.status == ScheduleStatus::DueSoon && !schedule.needs_attention
            }
            DueFilter::Overdue => {
                schedule.status == ScheduleStatus::Overdue && !schedule.needs_attention
            }
            DueFilter::NeedsAttention => schedule.needs_attention,
        }
    }
}

/// Query parameters for the due-work listing
#[derive(Debug, Clone, Deserialize, IntoParams, ToSchema)]
pub struct DueQuery {
    pub filter: DueFilter,
    pub shop_id: Option<Uuid>,
    pub equipment_id: Option<Uuid>,
}

impl DueQuery {
    pub fn scope(&self) -> ScheduleScope {
        ScheduleScope {
            shop_id: self.shop_id,
            equipment_id: self.equipment_id,
        }
    }
}

// ---------------------------------------------------------------------------
// Row mapping
// ---------------------------------------------------------------------------

/// Database row for `maintenance_schedules`
#[derive(Debug, FromRow)]
pub struct ScheduleRow {
    pub id: Uuid,
    pub equipment_id: Uuid,
    pub shop_id: Option<Uuid>,
    pub name: String,
    pub description: Option<String>,
    pub trigger_type: String,
    pub time_interval_days: Option<i32>,
    pub usage_interval: Option<f64>,
    pub usage_metric: Option<String>,
    pub priority: String,
    pub last_service_date: Option<NaiveDate>,
    pub last_service_reading: Option<f64>,
    pub locked_service_date: Option<NaiveDate>,
    pub next_service_date: Option<NaiveDate>,
    pub computed_service_date: Option<NaiveDate>,
    pub next_service_reading: Option<f64>,
    pub current_reading: Option<f64>,
    pub average_daily_usage: Option<f64>,
    pub predicted_service_date: Option<NaiveDate>,
    pub usage_due_now: bool,
    pub needs_attention: bool,
    pub status: String,
    pub last_evaluated_on: Option<NaiveDate>,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<ScheduleRow> for MaintenanceSchedule {
    type Error = AppError;

    fn try_from(row: ScheduleRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            equipment_id: row.equipment_id,
            shop_id: row.shop_id,
            name: row.name,
            description: row.description,
            trigger_type: row.trigger_type.parse()?,
            time_interval_days: row.time_interval_days,
            usage_interval: row.usage_interval,
            usage_metric: row.usage_metric.as_deref().map(str::parse).transpose()?,
            priority: row.priority.parse()?,
            last_service_date: row.last_service_date,
            last_service_reading: row.last_service_reading,
            locked_service_date: row.locked_service_date,
            next_service_date: row.next_service_date,
            computed_service_date: row.computed_service_date,
            next_service_reading: row.next_service_reading,
            current_reading: row.current_reading,
            average_daily_usage: row.average_daily_usage,
            predicted_service_date: row.predicted_service_date,
            usage_due_now: row.usage_due_now,
            needs_attention: row.needs_attention,
            status: row.status.parse()?,
            last_evaluated_on: row.last_evaluated_on,
            version: row.version,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
