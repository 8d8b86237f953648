//! Maintenance event bus
//!
//! Status transitions are published here for the notification collaborator.
//! This service never delivers emails, SMS or push notifications itself.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::models::{MaintenanceSchedule, Priority, ScheduleStatus};

/// Default buffer capacity for the broadcast channel.
pub const DEFAULT_CAPACITY: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MaintenanceEventKind {
    /// The classifier moved the schedule to another status
    StatusChanged,
    /// The schedule could no longer be resolved to a due date
    NeedsAttention,
    ServiceCompleted,
    Cancelled,
}

#[derive(Debug, Clone, Serialize)]
pub struct MaintenanceEvent {
    pub kind: MaintenanceEventKind,
    pub schedule_id: Uuid,
    pub equipment_id: Uuid,
    pub shop_id: Option<Uuid>,
    pub previous_status: Option<ScheduleStatus>,
    pub status: ScheduleStatus,
    pub next_service_date: Option<NaiveDate>,
    pub priority: Priority,
    pub occurred_at: DateTime<Utc>,
}

impl MaintenanceEvent {
    pub fn new(
        kind: MaintenanceEventKind,
        schedule: &MaintenanceSchedule,
        previous_status: Option<ScheduleStatus>,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            kind,
            schedule_id: schedule.id,
            equipment_id: schedule.equipment_id,
            shop_id: schedule.shop_id,
            previous_status,
            status: schedule.status,
            next_service_date: schedule.next_service_date,
            priority: schedule.priority,
            occurred_at,
        }
    }
}

/// Events implied by moving a schedule from `before` to `after`.
///
/// Creation counts as a transition from nothing: a schedule that starts out
/// due soon, overdue or unresolved is announced immediately.
pub fn transition_events(
    before: Option<&MaintenanceSchedule>,
    after: &MaintenanceSchedule,
    occurred_at: DateTime<Utc>,
) -> Vec<MaintenanceEvent> {
    let mut events = Vec::new();
    let previous_status = before.map(|b| b.status);

    let status_changed = match before {
        Some(b) => b.status != after.status,
        None => after.status != ScheduleStatus::Scheduled,
    };
    if status_changed {
        let kind = match after.status {
            ScheduleStatus::Cancelled => MaintenanceEventKind::Cancelled,
            _ => MaintenanceEventKind::StatusChanged,
        };
        events.push(MaintenanceEvent::new(kind, after, previous_status, occurred_at));
    }

    let was_unresolved = before.map_or(false, |b| b.needs_attention);
    if after.needs_attention && !was_unresolved {
        events.push(MaintenanceEvent::new(
            MaintenanceEventKind::NeedsAttention,
            after,
            previous_status,
            occurred_at,
        ));
    }

    events
}

/// In-process fan-out event bus.
///
/// When the buffer is full the oldest events are dropped and slow receivers
/// observe `RecvError::Lagged`.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<MaintenanceEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publish an event to all current subscribers (dropped when there are none)
    pub fn publish(&self, event: MaintenanceEvent) {
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<MaintenanceEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

/// Log every published event until the bus closes.
pub async fn log_events(mut receiver: broadcast::Receiver<MaintenanceEvent>) {
    loop {
        match receiver.recv().await {
            Ok(event) => {
                tracing::info!(
                    kind = ?event.kind,
                    schedule_id = %event.schedule_id,
                    equipment_id = %event.equipment_id,
                    previous_status = ?event.previous_status,
                    status = %event.status,
                    next_service_date = ?event.next_service_date,
                    priority = %event.priority,
                    "Maintenance event"
                );
            }
            Err(broadcast::error::RecvError::Lagged(n)) => {
                tracing::warn!(skipped = n, "Maintenance event logger lagged");
            }
            Err(broadcast::error::RecvError::Closed) => {
                tracing::debug!("Maintenance event bus closed");
                break;
            }
        }
    }
}
