//! Business logic services

pub mod clock;
pub mod events;
pub mod locks;
pub mod scheduling;
pub mod sweep;
pub mod usage;

use std::sync::Arc;

use crate::{
    config::SchedulingConfig,
    repository::{ScheduleStore, UsageLogStore},
};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub usage: usage::UsageService,
    pub scheduling: scheduling::SchedulingService,
    pub events: events::EventBus,
}

impl Services {
    /// Create all services on top of the given stores
    pub fn new(
        schedules: Arc<dyn ScheduleStore>,
        usage_log: Arc<dyn UsageLogStore>,
        settings: SchedulingConfig,
        clock: Arc<dyn clock::Clock>,
    ) -> Self {
        let events = events::EventBus::new(settings.event_capacity);
        let scheduling = scheduling::SchedulingService::new(
            schedules,
            usage_log.clone(),
            settings,
            clock.clone(),
            events.clone(),
        );

        Self {
            usage: usage::UsageService::new(usage_log, scheduling.clone(), clock),
            scheduling,
            events,
        }
    }
}
