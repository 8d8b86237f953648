//! Shared domain enums
//!
//! Enums are persisted as their snake_case string form (see `as_str`) and
//! parsed back with `FromStr`.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use utoipa::ToSchema;

use crate::error::AppError;

macro_rules! string_enum {
    ($ty:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $ty {
            /// Storage / wire representation
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($ty::$variant => $text,)+
                }
            }
        }

        impl FromStr for $ty {
            type Err = AppError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($ty::$variant),)+
                    other => Err(AppError::Internal(format!(
                        "Unknown {} value '{}'",
                        stringify!($ty),
                        other
                    ))),
                }
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

// ---------------------------------------------------------------------------
// UsageMetric
// ---------------------------------------------------------------------------

/// Unit a usage reading (and a usage interval) is expressed in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum UsageMetric {
    Hours,
    Kilometers,
    Miles,
}

string_enum!(UsageMetric {
    Hours => "hours",
    Kilometers => "kilometers",
    Miles => "miles",
});

// ---------------------------------------------------------------------------
// TriggerType
// ---------------------------------------------------------------------------

/// Which trigger sources make a schedule due
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TriggerType {
    TimeBased,
    UsageBased,
    Both,
}

string_enum!(TriggerType {
    TimeBased => "time_based",
    UsageBased => "usage_based",
    Both => "both",
});

impl TriggerType {
    pub fn uses_time(&self) -> bool {
        matches!(self, TriggerType::TimeBased | TriggerType::Both)
    }

    pub fn uses_usage(&self) -> bool {
        matches!(self, TriggerType::UsageBased | TriggerType::Both)
    }
}

// ---------------------------------------------------------------------------
// Priority
// ---------------------------------------------------------------------------

/// Schedule priority (ordered low < critical)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
    Critical,
}

string_enum!(Priority {
    Low => "low",
    Medium => "medium",
    High => "high",
    Critical => "critical",
});

impl Default for Priority {
    fn default() -> Self {
        Priority::Medium
    }
}

// ---------------------------------------------------------------------------
// ScheduleStatus
// ---------------------------------------------------------------------------

/// Schedule lifecycle state
///
/// `Scheduled`, `DueSoon` and `Overdue` are assigned by the classifier.
/// `Completed` and `Cancelled` are only reached through external events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleStatus {
    Scheduled,
    DueSoon,
    Overdue,
    Completed,
    Cancelled,
}

string_enum!(ScheduleStatus {
    Scheduled => "scheduled",
    DueSoon => "due_soon",
    Overdue => "overdue",
    Completed => "completed",
    Cancelled => "cancelled",
});

impl ScheduleStatus {
    /// Terminal states are never recomputed nor reopened
    pub fn is_terminal(&self) -> bool {
        matches!(self, ScheduleStatus::Cancelled)
    }

    /// States the classifier owns; only these are recomputed by sweeps and ingest
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            ScheduleStatus::Scheduled | ScheduleStatus::DueSoon | ScheduleStatus::Overdue
        )
    }
}

impl Default for ScheduleStatus {
    fn default() -> Self {
        ScheduleStatus::Scheduled
    }
}
