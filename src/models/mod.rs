//! Data models for maintenance scheduling

pub mod enums;
pub mod schedule;
pub mod usage;

// Re-export commonly used types
pub use enums::{Priority, ScheduleStatus, TriggerType, UsageMetric};
pub use schedule::{DueFilter, MaintenanceSchedule, ScheduleScope, ScheduleState};
pub use usage::UsageReading;
