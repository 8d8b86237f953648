//! Usage velocity estimation
//!
//! Derives an average daily usage rate from the readings of one
//! equipment + metric over a trailing window.

use chrono::{DateTime, Duration, Utc};

use crate::models::UsageReading;

/// Minimum number of in-window readings needed to estimate a rate
pub const MIN_READINGS: usize = 2;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Outcome of a velocity estimation
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VelocityEstimate {
    /// Average usage per day (always finite and >= 0)
    Rate(f64),
    /// Fewer than [`MIN_READINGS`] readings in the window.
    ///
    /// This is not "zero usage": callers must not project from it.
    InsufficientData,
}

impl VelocityEstimate {
    pub fn rate(&self) -> Option<f64> {
        match self {
            VelocityEstimate::Rate(r) => Some(*r),
            VelocityEstimate::InsufficientData => None,
        }
    }
}

/// Estimate the average daily usage over `[now - window, now]`.
///
/// Readings are ordered by `recorded_at` and the positive deltas between
/// consecutive readings are summed. A drop in value (meter reset or
/// rollover) contributes nothing but the readings after it keep counting.
/// The span is measured between the earliest and latest in-window reading
/// and is never shorter than one day.
pub fn estimate(readings: &[UsageReading], now: DateTime<Utc>, window: Duration) -> VelocityEstimate {
    let window_start = now - window;

    let mut in_window: Vec<&UsageReading> = readings
        .iter()
        .filter(|r| r.recorded_at >= window_start && r.reading_value.is_finite())
        .collect();

    if in_window.len() < MIN_READINGS {
        return VelocityEstimate::InsufficientData;
    }

    in_window.sort_by(|a, b| {
        a.recorded_at
            .cmp(&b.recorded_at)
            .then(a.reading_value.total_cmp(&b.reading_value))
    });

    let accumulated: f64 = in_window
        .windows(2)
        .map(|pair| pair[1].reading_value - pair[0].reading_value)
        .filter(|delta| *delta > 0.0)
        .sum();

    let first = in_window[0].recorded_at;
    let last = in_window[in_window.len() - 1].recorded_at;
    let days_elapsed = ((last - first).num_seconds() as f64 / SECONDS_PER_DAY).max(1.0);

    let rate = accumulated / days_elapsed;
    if rate.is_finite() && rate >= 0.0 {
        VelocityEstimate::Rate(rate)
    } else {
        VelocityEstimate::InsufficientData
    }
}
