//! Schedule reconciliation
//!
//! Merges the time and usage triggers according to the schedule's
//! `trigger_type`, applies the lock override and classifies the result.
//! Everything here is a pure function of its inputs, so reconciling twice
//! with the same inputs yields the same [`ScheduleState`].

use chrono::NaiveDate;

use super::classify::classify;
use super::trigger::{self, UsageTrigger};
use super::velocity::VelocityEstimate;
use crate::models::{MaintenanceSchedule, ScheduleState, TriggerType};

/// Usage facts for the schedule's equipment + metric
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UsageSnapshot {
    /// Highest recorded value (never lowered by backfilled readings)
    pub current_reading: Option<f64>,
    pub velocity: VelocityEstimate,
}

impl UsageSnapshot {
    pub fn empty() -> Self {
        Self {
            current_reading: None,
            velocity: VelocityEstimate::InsufficientData,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ReconcileSettings {
    pub due_soon_window_days: i64,
}

/// Compute the new state of `schedule` as of `today`.
///
/// `usage` is ignored for `time_based` schedules. When the estimator has
/// insufficient data the previously stored `average_daily_usage` is held
/// instead of assuming zero.
pub fn reconcile(
    schedule: &MaintenanceSchedule,
    usage: Option<&UsageSnapshot>,
    today: NaiveDate,
    settings: &ReconcileSettings,
) -> ScheduleState {
    let time_date = if schedule.trigger_type.uses_time() {
        trigger::time_due_date(schedule.last_service_date, schedule.time_interval_days)
    } else {
        None
    };

    let mut next_service_reading = None;
    let mut current_reading = None;
    let mut average_daily_usage = None;
    let mut usage_trigger = None;

    if schedule.trigger_type.uses_usage() {
        let snapshot = usage.copied().unwrap_or_else(UsageSnapshot::empty);

        next_service_reading =
            trigger::next_service_reading(schedule.last_service_reading, schedule.usage_interval);
        current_reading = max_option(snapshot.current_reading, schedule.last_service_reading);
        average_daily_usage = match snapshot.velocity {
            VelocityEstimate::Rate(rate) => Some(rate),
            VelocityEstimate::InsufficientData => schedule.average_daily_usage,
        };

        usage_trigger = Some(trigger::usage_trigger(
            next_service_reading,
            current_reading,
            average_daily_usage,
            today,
        ));
    }

    let predicted_service_date = match usage_trigger {
        Some(UsageTrigger::DueNow) => Some(crossed_on(schedule, next_service_reading, today)),
        other => other.and_then(|t| t.due_date(today)),
    };

    let computed_service_date = match schedule.trigger_type {
        TriggerType::TimeBased => time_date,
        TriggerType::UsageBased => predicted_service_date,
        TriggerType::Both => min_option(time_date, predicted_service_date),
    };

    let next_service_date = schedule.locked_service_date.or(computed_service_date);

    let (status, needs_attention) = if schedule.status.is_active() {
        let c = classify(
            next_service_date,
            today,
            settings.due_soon_window_days,
            schedule.status,
        );
        (c.status, c.unresolved)
    } else {
        (schedule.status, next_service_date.is_none())
    };

    ScheduleState {
        next_service_date,
        computed_service_date,
        next_service_reading,
        current_reading,
        average_daily_usage,
        predicted_service_date,
        usage_due_now: matches!(usage_trigger, Some(UsageTrigger::DueNow)),
        needs_attention,
        status,
        last_evaluated_on: Some(today),
    }
}

/// Date the usage threshold was first seen crossed.
///
/// Held across recomputes while the threshold is unchanged, so a schedule
/// left past its limit ages into `overdue` instead of staying due today.
fn crossed_on(schedule: &MaintenanceSchedule, next_service_reading: Option<f64>, today: NaiveDate) -> NaiveDate {
    if !schedule.usage_due_now || schedule.next_service_reading != next_service_reading {
        return today;
    }
    schedule
        .predicted_service_date
        .filter(|held| *held <= today)
        .unwrap_or(today)
}

fn min_option(a: Option<NaiveDate>, b: Option<NaiveDate>) -> Option<NaiveDate> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}

fn max_option(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (a, b) => a.or(b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Priority, ScheduleStatus, UsageMetric};
    use chrono::Utc;
    use uuid::Uuid;

    const SETTINGS: ReconcileSettings = ReconcileSettings {
        due_soon_window_days: 7,
    };

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn schedule(trigger_type: TriggerType) -> MaintenanceSchedule {
        let now = Utc::now();
        MaintenanceSchedule {
            id: Uuid::new_v4(),
            equipment_id: Uuid::new_v4(),
            shop_id: None,
            name: "Oil change".to_string(),
            description: None,
            trigger_type,
            time_interval_days: trigger_type.uses_time().then_some(90),
            usage_interval: trigger_type.uses_usage().then_some(500.0),
            usage_metric: trigger_type.uses_usage().then_some(UsageMetric::Hours),
            priority: Priority::Medium,
            last_service_date: Some(date(2024, 1, 1)),
            last_service_reading: Some(10_000.0),
            locked_service_date: None,
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
        }
    }

    #[test]
    fn test_time_based_overdue() {
        let s = schedule(TriggerType::TimeBased);
        let state = reconcile(&s, None, date(2024, 4, 1), &SETTINGS);
        assert_eq!(state.next_service_date, Some(date(2024, 3, 31)));
        assert_eq!(state.status, ScheduleStatus::Overdue);
        assert!(state.average_daily_usage.is_none());
    }

    #[test]
    fn test_usage_based_due_now() {
        let s = schedule(TriggerType::UsageBased);
        let usage = UsageSnapshot {
            current_reading: Some(10_500.0),
            velocity: VelocityEstimate::InsufficientData,
        };
        let today = date(2024, 2, 1);
        let state = reconcile(&s, Some(&usage), today, &SETTINGS);
        assert!(state.usage_due_now);
        assert_eq!(state.next_service_reading, Some(10_500.0));
        assert_eq!(state.next_service_date, Some(today));
        assert_eq!(state.status, ScheduleStatus::DueSoon);
    }

    #[test]
    fn test_due_now_keeps_crossing_date() {
        let mut s = schedule(TriggerType::UsageBased);
        let usage = UsageSnapshot {
            current_reading: Some(10_900.0),
            velocity: VelocityEstimate::InsufficientData,
        };
        let crossed = reconcile(&s, Some(&usage), date(2024, 1, 1), &SETTINGS);
        assert_eq!(crossed.predicted_service_date, Some(date(2024, 1, 1)));
        s.apply_state(crossed);

        let later = reconcile(&s, Some(&usage), date(2024, 3, 1), &SETTINGS);
        assert!(later.usage_due_now);
        assert_eq!(later.next_service_date, Some(date(2024, 1, 1)));
        assert_eq!(later.status, ScheduleStatus::Overdue);
    }

    #[test]
    fn test_new_threshold_restarts_crossing_date() {
        let mut s = schedule(TriggerType::UsageBased);
        let usage = UsageSnapshot {
            current_reading: Some(10_900.0),
            velocity: VelocityEstimate::InsufficientData,
        };
        s.apply_state(reconcile(&s, Some(&usage), date(2024, 1, 1), &SETTINGS));

        s.usage_interval = Some(800.0);
        let state = reconcile(&s, Some(&usage), date(2024, 3, 1), &SETTINGS);
        assert!(state.usage_due_now);
        assert_eq!(state.next_service_date, Some(date(2024, 3, 1)));
        assert_eq!(state.status, ScheduleStatus::DueSoon);
    }

    #[test]
    fn test_both_takes_earlier_projection() {
        let mut s = schedule(TriggerType::Both);
        let today = date(2024, 2, 1);
        s.last_service_date = Some(today);
        s.time_interval_days = Some(30);
        // 100 remaining at 10/day -> 10 days
        let usage = UsageSnapshot {
            current_reading: Some(10_400.0),
            velocity: VelocityEstimate::Rate(10.0),
        };
        let state = reconcile(&s, Some(&usage), today, &SETTINGS);
        assert_eq!(state.predicted_service_date, Some(date(2024, 2, 11)));
        assert_eq!(state.next_service_date, Some(date(2024, 2, 11)));
        assert_eq!(state.status, ScheduleStatus::Scheduled);
    }

    #[test]
    fn test_both_falls_back_to_time_when_usage_abstains() {
        let s = schedule(TriggerType::Both);
        let usage = UsageSnapshot {
            current_reading: Some(10_100.0),
            velocity: VelocityEstimate::InsufficientData,
        };
        let state = reconcile(&s, Some(&usage), date(2024, 2, 1), &SETTINGS);
        assert_eq!(state.predicted_service_date, None);
        assert_eq!(state.next_service_date, Some(date(2024, 3, 31)));
        assert!(!state.needs_attention);
    }

    #[test]
    fn test_insufficient_data_holds_status() {
        let mut s = schedule(TriggerType::UsageBased);
        s.status = ScheduleStatus::Overdue;
        let usage = UsageSnapshot {
            current_reading: Some(10_100.0),
            velocity: VelocityEstimate::InsufficientData,
        };
        let state = reconcile(&s, Some(&usage), date(2024, 2, 1), &SETTINGS);
        assert_eq!(state.next_service_date, None);
        assert_eq!(state.status, ScheduleStatus::Overdue);
        assert!(state.needs_attention);
    }

    #[test]
    fn test_previous_velocity_is_held() {
        let mut s = schedule(TriggerType::UsageBased);
        s.average_daily_usage = Some(20.0);
        let usage = UsageSnapshot {
            current_reading: Some(10_300.0),
            velocity: VelocityEstimate::InsufficientData,
        };
        let state = reconcile(&s, Some(&usage), date(2024, 2, 1), &SETTINGS);
        assert_eq!(state.average_daily_usage, Some(20.0));
        assert_eq!(state.predicted_service_date, Some(date(2024, 2, 11)));
    }

    #[test]
    fn test_lock_overrides_but_keeps_computed() {
        let mut s = schedule(TriggerType::TimeBased);
        s.locked_service_date = Some(date(2024, 1, 15));
        let state = reconcile(&s, None, date(2024, 1, 20), &SETTINGS);
        assert_eq!(state.next_service_date, Some(date(2024, 1, 15)));
        assert_eq!(state.computed_service_date, Some(date(2024, 3, 31)));
        assert_eq!(state.status, ScheduleStatus::Overdue);
    }

    #[test]
    fn test_backfilled_reading_does_not_lower_current() {
        let s = schedule(TriggerType::UsageBased);
        let usage = UsageSnapshot {
            current_reading: Some(9_000.0),
            velocity: VelocityEstimate::Rate(5.0),
        };
        let state = reconcile(&s, Some(&usage), date(2024, 2, 1), &SETTINGS);
        // baseline reading 10_000 is newer knowledge than the log maximum
        assert_eq!(state.current_reading, Some(10_000.0));
    }

    #[test]
    fn test_reconcile_is_idempotent() {
        let mut s = schedule(TriggerType::Both);
        let usage = UsageSnapshot {
            current_reading: Some(10_250.0),
            velocity: VelocityEstimate::Rate(12.5),
        };
        let today = date(2024, 2, 1);
        let first = reconcile(&s, Some(&usage), today, &SETTINGS);
        s.apply_state(first.clone());
        let second = reconcile(&s, Some(&usage), today, &SETTINGS);
        assert_eq!(first, second);
    }
}
