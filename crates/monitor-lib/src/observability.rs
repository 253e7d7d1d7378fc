//! Observability for the health engine
//!
//! Provides:
//! - Prometheus metrics (probe latency, health score, availability counts)
//! - Structured logging of cycle events with tracing

use crate::error::ConfigError;
use crate::models::{HealthAssessment, ProbeResult, QuickStatus, StatusLabel};
use crate::report::HealthReport;
use prometheus::{
    register_histogram_vec, register_int_counter, register_int_counter_vec, register_int_gauge,
    HistogramVec, IntCounter, IntCounterVec, IntGauge,
};
use std::sync::OnceLock;
use std::time::Duration;
use tracing::{info, warn};

/// Probe latency buckets in seconds, up to the default global deadline
const LATENCY_BUCKETS: &[f64] = &[0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.0, 3.0];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<MonitorMetricsInner> = OnceLock::new();

struct MonitorMetricsInner {
    probe_latency_seconds: HistogramVec,
    probe_failures: IntCounterVec,
    health_score: IntGauge,
    services_available: IntGauge,
    services_total: IntGauge,
    containers_running: IntGauge,
    containers_expected: IntGauge,
    status_label: IntGauge,
    assessments: IntCounter,
}

impl MonitorMetricsInner {
    fn new() -> Self {
        Self {
            probe_latency_seconds: register_histogram_vec!(
                "stackmon_probe_latency_seconds",
                "Latency of successful probes",
                &["target", "kind"],
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register probe_latency_seconds"),

            probe_failures: register_int_counter_vec!(
                "stackmon_probe_failures_total",
                "Failed probes by target and error kind",
                &["target", "error"]
            )
            .expect("Failed to register probe_failures_total"),

            health_score: register_int_gauge!(
                "stackmon_health_score",
                "Most recent composite health score (0-100)"
            )
            .expect("Failed to register health_score"),

            services_available: register_int_gauge!(
                "stackmon_services_available",
                "Critical services reachable in the last cycle"
            )
            .expect("Failed to register services_available"),

            services_total: register_int_gauge!(
                "stackmon_services_total",
                "Critical services configured"
            )
            .expect("Failed to register services_total"),

            containers_running: register_int_gauge!(
                "stackmon_containers_running",
                "Running containers counted toward the expectation"
            )
            .expect("Failed to register containers_running"),

            containers_expected: register_int_gauge!(
                "stackmon_containers_expected",
                "Configured container expectation"
            )
            .expect("Failed to register containers_expected"),

            status_label: register_int_gauge!(
                "stackmon_status_label",
                "Reported status label: 0 OK, 1 PARTIAL, 2 CRITICAL"
            )
            .expect("Failed to register status_label"),

            assessments: register_int_counter!(
                "stackmon_assessments_total",
                "Completed health assessments"
            )
            .expect("Failed to register assessments_total"),
        }
    }
}

/// Lightweight handle to the global metrics; clones share the same metrics
#[derive(Clone)]
pub struct MonitorMetrics {
    _private: (),
}

impl Default for MonitorMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl MonitorMetrics {
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(MonitorMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &MonitorMetricsInner {
        GLOBAL_METRICS.get_or_init(MonitorMetricsInner::new)
    }

    pub fn record_probe(&self, result: &ProbeResult) {
        let inner = self.inner();
        match (result.reachable, result.latency, result.error) {
            (true, Some(latency), _) => inner
                .probe_latency_seconds
                .with_label_values(&[&result.target_name, &result.kind.to_string()])
                .observe(latency.as_secs_f64()),
            (false, _, Some(error)) => inner
                .probe_failures
                .with_label_values(&[&result.target_name, &error.to_string()])
                .inc(),
            _ => {}
        }
    }

    pub fn record_status(&self, status: &QuickStatus) {
        let inner = self.inner();
        inner.services_available.set(status.services_available as i64);
        inner.services_total.set(status.services_total as i64);
        inner.containers_running.set(status.containers_running as i64);
        inner.containers_expected.set(status.containers_expected as i64);
        inner.status_label.set(match status.label {
            StatusLabel::Ok => 0,
            StatusLabel::Partial => 1,
            StatusLabel::Critical => 2,
        });
    }

    pub fn record_assessment(&self, assessment: &HealthAssessment) {
        let inner = self.inner();
        inner.health_score.set(assessment.score as i64);
        inner.assessments.inc();
    }

    pub fn health_score(&self) -> i64 {
        self.inner().health_score.get()
    }

    pub fn assessments_total(&self) -> u64 {
        self.inner().assessments.get()
    }
}

/// Structured logger for engine events
///
/// Every record carries an `event` field so log pipelines can filter on it.
#[derive(Clone)]
pub struct StructuredLogger {
    instance: String,
}

impl StructuredLogger {
    pub fn new(instance: impl Into<String>) -> Self {
        Self {
            instance: instance.into(),
        }
    }

    pub fn instance(&self) -> &str {
        &self.instance
    }

    pub fn log_probe_failure(&self, result: &ProbeResult) {
        warn!(
            event = "probe_failed",
            instance = %self.instance,
            target = %result.target_name,
            kind = %result.kind,
            error = ?result.error,
            detail = result.detail.as_deref().unwrap_or_default(),
            critical = result.critical,
            "Probe failed"
        );
    }

    pub fn log_quick_status(&self, status: &QuickStatus, raw_label: StatusLabel) {
        info!(
            event = "quick_status",
            instance = %self.instance,
            label = %status.label,
            raw_label = %raw_label,
            services_available = status.services_available,
            services_total = status.services_total,
            containers_running = status.containers_running,
            containers_expected = status.containers_expected,
            elapsed_ms = status.elapsed.as_millis() as u64,
            "Quick status computed"
        );
    }

    pub fn log_assessment(&self, assessment: &HealthAssessment) {
        let factors: Vec<String> = assessment
            .contributing_factors
            .iter()
            .map(|f| format!("{}={}", f.factor_name, f.impact))
            .collect();

        info!(
            event = "assessment",
            instance = %self.instance,
            score = assessment.score,
            level = %assessment.level,
            confidence = ?assessment.confidence,
            factors = %factors.join(","),
            "Health assessed"
        );
    }

    pub fn log_report(&self, report: &HealthReport) {
        info!(
            event = "report",
            instance = %self.instance,
            overall = %report.overall_status(),
            summary = %report.summary_line(),
            performance = %report.performance,
            log_alert = ?report.logs.as_ref().map(|l| l.alert_level),
            recommendations = report.recommendations.len(),
            "Health report assembled"
        );
    }

    pub fn log_config_issue(&self, issue: &ConfigError) {
        warn!(
            event = "config_issue",
            instance = %self.instance,
            issue = %issue,
            "Configuration issue lowers assessment confidence"
        );
    }

    pub fn log_startup(&self, version: &str, targets: usize, interval: Duration) {
        info!(
            event = "agent_started",
            instance = %self.instance,
            agent_version = %version,
            targets = targets,
            interval_secs = interval.as_secs(),
            "Health agent started"
        );
    }

    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "agent_shutdown",
            instance = %self.instance,
            reason = %reason,
            "Health agent shutting down"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ProbeErrorKind, Target};

    #[test]
    fn test_metrics_record_cycle() {
        // The registry is process global, so only relative changes are checked
        let metrics = MonitorMetrics::new();
        let before = metrics.assessments_total();

        let target = Target::http("app", "http://app");
        metrics.record_probe(&ProbeResult::reachable(&target, Duration::from_millis(20)));
        metrics.record_probe(&ProbeResult::unreachable(
            &target,
            ProbeErrorKind::Timeout,
            "timed out",
        ));
        metrics.record_assessment(&crate::scorer::score(
            &QuickStatus {
                services_available: 1,
                services_total: 2,
                containers_running: 0,
                containers_expected: 0,
                containers_observed: 0,
                expectation_configured: true,
                elapsed: Duration::from_millis(20),
                label: StatusLabel::Partial,
            },
            None,
        ));

        assert!(metrics.assessments_total() > before);
    }

    #[test]
    fn test_structured_logger_creation() {
        let logger = StructuredLogger::new("stackmon-test");
        assert_eq!(logger.instance(), "stackmon-test");
    }
}
