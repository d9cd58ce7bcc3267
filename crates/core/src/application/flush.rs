// Flush Scheduler - periodic persistence of every registered queue

use crate::application::{QueueRegistry, ShutdownToken};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{error, info, warn};

/// Save failure of one queue during a flush cycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlushFailure {
    pub queue: String,
    pub error: String,
}

/// Outcome of one flush cycle
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FlushReport {
    pub attempted: usize,
    pub saved: usize,
    /// Queues deleted while the cycle was running
    pub skipped: usize,
    pub failures: Vec<FlushFailure>,
}

impl FlushReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Flush scheduler
///
/// Runs `flush_all` every `period` in the background and once more on shutdown
pub struct FlushScheduler {
    registry: Arc<QueueRegistry>,
    period: Duration,
}

impl FlushScheduler {
    /// Create a new flush scheduler
    ///
    /// # Arguments
    /// * `registry` - Registry whose queues are persisted
    /// * `period` - Time between flush cycles (must be non-zero)
    pub fn new(registry: Arc<QueueRegistry>, period: Duration) -> Self {
        Self { registry, period }
    }

    /// Run the flush loop until shutdown, then flush one final time.
    ///
    /// A cycle already in progress when shutdown is signalled runs to completion.
    /// Returns the report of the final flush. Should be spawned in tokio::spawn.
    pub async fn run(self, mut shutdown: ShutdownToken) -> FlushReport {
        info!(period_secs = self.period.as_secs_f64(), "Flush scheduler started");

        let mut tick = interval_at(Instant::now() + self.period, self.period);
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = tick.tick() => {
                    let report = self.registry.flush_all().await;
                    log_report(&report, "Scheduled flush");
                }
                _ = shutdown.wait() => break,
            }
        }

        info!("Flush scheduler stopping, running final flush...");
        let report = self.registry.flush_all().await;
        log_report(&report, "Final flush");
        report
    }
}

fn log_report(report: &FlushReport, label: &str) {
    if report.is_clean() {
        info!(
            attempted = report.attempted,
            saved = report.saved,
            skipped = report.skipped,
            "{} completed",
            label
        );
        return;
    }

    for failure in &report.failures {
        warn!(queue = %failure.queue, error = %failure.error, "{}: queue not saved", label);
    }
    error!(
        attempted = report.attempted,
        saved = report.saved,
        failed = report.failures.len(),
        "{} completed with failures",
        label
    );
}
