//! Trigger evaluation
//!
//! Computes the next due point of each configured trigger independently.
//! Merging them is the reconciler's job.

use chrono::{Days, NaiveDate};

/// Why the usage trigger produced no date
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbstainReason {
    /// No baseline reading or no known current reading
    NoBaseline,
    /// Velocity estimator did not have enough readings
    InsufficientData,
    /// Equipment is idle (zero velocity) or the projection is out of range
    NoProjection,
}

/// Outcome of the usage trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsageTrigger {
    /// The current reading already reached the next service reading
    DueNow,
    /// Projected from the average daily usage
    Projected(NaiveDate),
    /// No date could be derived; never treat this as "due" or "never due"
    Abstain(AbstainReason),
}

impl UsageTrigger {
    /// Calendar date this trigger fires on, if any.
    ///
    /// `DueNow` maps to `today`; the reconciler holds an earlier crossing date.
    pub fn due_date(&self, today: NaiveDate) -> Option<NaiveDate> {
        match self {
            UsageTrigger::DueNow => Some(today),
            UsageTrigger::Projected(date) => Some(*date),
            UsageTrigger::Abstain(_) => None,
        }
    }
}

/// `last_service_date + time_interval_days`
pub fn time_due_date(last_service_date: Option<NaiveDate>, interval_days: Option<i32>) -> Option<NaiveDate> {
    let last = last_service_date?;
    let days = u64::try_from(interval_days?).ok()?;
    last.checked_add_days(Days::new(days))
}

/// `last_service_reading + usage_interval`
pub fn next_service_reading(last_service_reading: Option<f64>, usage_interval: Option<f64>) -> Option<f64> {
    let next = last_service_reading? + usage_interval?;
    next.is_finite().then_some(next)
}

/// Evaluate the usage trigger.
///
/// `velocity` is `None` when the estimator reported insufficient data.
pub fn usage_trigger(
    next_reading: Option<f64>,
    current_reading: Option<f64>,
    velocity: Option<f64>,
    today: NaiveDate,
) -> UsageTrigger {
    let (Some(next), Some(current)) = (next_reading, current_reading) else {
        return UsageTrigger::Abstain(AbstainReason::NoBaseline);
    };

    if current >= next {
        return UsageTrigger::DueNow;
    }

    let Some(rate) = velocity else {
        return UsageTrigger::Abstain(AbstainReason::InsufficientData);
    };
    if rate.is_nan() || rate <= 0.0 {
        return UsageTrigger::Abstain(AbstainReason::NoProjection);
    }

    let days = ((next - current) / rate).ceil();
    if !days.is_finite() || days > u32::MAX as f64 {
        return UsageTrigger::Abstain(AbstainReason::NoProjection);
    }

    match today.checked_add_days(Days::new(days as u64)) {
        Some(date) => UsageTrigger::Projected(date),
        None => UsageTrigger::Abstain(AbstainReason::NoProjection),
    }
}
