//! Periodic background assessment

use monitor_lib::{HealthReport, MonitorEngine, OverallStatus};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, RwLock};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Most recent report produced by the loop
pub type LatestReport = Arc<RwLock<Option<HealthReport>>>;

pub struct AssessmentLoop {
    engine: Arc<MonitorEngine>,
    latest: LatestReport,
    interval: Duration,
    with_signals: bool,
}

impl AssessmentLoop {
    pub fn new(
        engine: Arc<MonitorEngine>,
        latest: LatestReport,
        interval: Duration,
        with_signals: bool,
    ) -> Self {
        Self {
            engine,
            latest,
            interval,
            with_signals,
        }
    }

    /// Assess on every tick until a shutdown signal arrives
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        info!(
            interval_secs = self.interval.as_secs(),
            with_signals = self.with_signals,
            "Starting assessment loop"
        );

        let mut ticker = interval(self.interval);
        // A slow cycle must not trigger a burst of catch-up cycles
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut cycles = 0u64;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.run_once().await;
                    cycles += 1;
                    debug!(cycles, "Assessment cycle complete");
                }
                _ = shutdown.recv() => {
                    info!(cycles, "Shutting down assessment loop");
                    break;
                }
            }
        }
    }

    pub async fn run_once(&self) {
        let report = self.engine.scheduled_report(self.with_signals).await;

        if report.overall_status() != OverallStatus::Normal {
            warn!(
                overall = %report.overall_status(),
                summary = %report.summary_line(),
                "Stack is not healthy"
            );
        }

        *self.latest.write().await = Some(report);
    }
}
