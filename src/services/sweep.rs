//! Periodic sweep
//!
//! Date-driven transitions (`scheduled` -> `due_soon` -> `overdue`) happen
//! without any new reading, so every active schedule is recomputed on a
//! fixed interval.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::NaiveDate;
use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use utoipa::ToSchema;

use super::{clock::Clock, scheduling::SchedulingService};
use crate::error::AppResult;

/// Summary of one sweep
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct SweepReport {
    /// The date the sweep evaluated schedules against
    pub evaluated_on: Option<NaiveDate>,
    pub examined: usize,
    /// Schedules whose stored state changed
    pub updated: usize,
    pub unchanged: usize,
    /// Schedules that could not be recomputed (left for the next sweep)
    pub failed: usize,
    pub duration_ms: u64,
}

impl SchedulingService {
    /// Recompute every active schedule with bounded concurrency.
    ///
    /// One schedule failing never stops the others; failures are counted
    /// and logged. Only listing the schedules can fail the sweep as a whole.
    pub async fn sweep(&self) -> AppResult<SweepReport> {
        let started = Instant::now();
        let ids = self
            .io("list active schedules", self.schedule_store().list_active_ids())
            .await?;

        let mut report = SweepReport {
            evaluated_on: Some(self.clock().today()),
            examined: ids.len(),
            ..SweepReport::default()
        };

        let semaphore = Arc::new(Semaphore::new(self.settings().sweep_concurrency.max(1)));
        let mut tasks = JoinSet::new();

        for id in ids {
            let permit = match semaphore.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => break,
            };
            let service = self.clone();
            tasks.spawn(async move {
                let _permit = permit;
                (id, service.recompute_outcome(id).await)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((_, Ok(outcome))) if outcome.written => report.updated += 1,
                Ok((_, Ok(_))) => report.unchanged += 1,
                Ok((id, Err(e))) => {
                    report.failed += 1;
                    tracing::warn!(schedule_id = %id, error = %e, "Sweep: schedule recompute failed");
                }
                Err(e) => {
                    report.failed += 1;
                    tracing::error!(error = %e, "Sweep: recompute task panicked");
                }
            }
        }

        self.locks().prune();
        report.duration_ms = started.elapsed().as_millis() as u64;

        tracing::info!(
            examined = report.examined,
            updated = report.updated,
            unchanged = report.unchanged,
            failed = report.failed,
            duration_ms = report.duration_ms,
            "Maintenance sweep finished"
        );
        Ok(report)
    }
}

/// Run the sweep every `interval` until `cancel` is triggered.
///
/// The first tick fires immediately so a restarted server catches up on
/// transitions it missed while down.
pub async fn run(service: SchedulingService, interval: Duration, cancel: CancellationToken) {
    tracing::info!(interval_secs = interval.as_secs(), "Maintenance sweep job started");

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Maintenance sweep job stopping");
                break;
            }
            _ = ticker.tick() => {
                if let Err(e) = service.sweep().await {
                    tracing::error!(error = %e, "Maintenance sweep failed");
                }
            }
        }
    }
}
