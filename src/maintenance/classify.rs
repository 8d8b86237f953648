//! Status classification
//!
//! `scheduled -> due_soon -> overdue`, driven by the gap between the
//! effective due date and today. `completed` and `cancelled` are never
//! produced here.

use chrono::NaiveDate;

use crate::models::ScheduleStatus;

/// Result of classifying one schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub status: ScheduleStatus,
    /// The due date was unknown and `status` was carried over
    pub unresolved: bool,
}

/// Classify an effective due date.
///
/// With no date the previous status is held and the result is flagged
/// unresolved, so an uncomputable schedule never silently drops back to
/// `scheduled`.
pub fn classify(
    due_date: Option<NaiveDate>,
    today: NaiveDate,
    due_soon_window_days: i64,
    previous: ScheduleStatus,
) -> Classification {
    let Some(due) = due_date else {
        return Classification {
            status: previous,
            unresolved: true,
        };
    };

    let delta = (due - today).num_days();
    let status = if delta < 0 {
        ScheduleStatus::Overdue
    } else if delta <= due_soon_window_days.max(0) {
        ScheduleStatus::DueSoon
    } else {
        ScheduleStatus::Scheduled
    };

    Classification {
        status,
        unresolved: false,
    }
}
