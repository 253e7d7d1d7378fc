//! Secondary health signals
//!
//! Log error rate and resource pressure refine the score but are never
//! required. A source that is missing, failing or slow leaves its field of
//! `ExtraSignals` empty and the assessment continues without it.

mod analyzer;
mod loki;

pub use analyzer::{AlertLevel, LevelCounts, LogAnalysis, LogAnalyzer, PatternFamily};
pub use loki::{LokiClient, DEFAULT_LOG_QUERIES};

use crate::collector::{async_trait, deadline_budget, MetricsStore};
use crate::error::ProbeFailure;
use crate::models::ExtraSignals;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Default number of log lines fetched per cycle
pub const DEFAULT_LOG_LIMIT: u32 = 50;

/// Trait for fetching recent log lines
#[async_trait]
pub trait LogSource: Send + Sync {
    async fn recent_lines(
        &self,
        window: Duration,
        limit: u32,
        timeout: Duration,
    ) -> Result<Vec<String>, ProbeFailure>;
}

/// Scoring signals plus the log analysis they came from
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SignalSnapshot {
    pub extra: ExtraSignals,
    /// Present only when the log window held at least one line
    pub logs: Option<LogAnalysis>,
}

/// Gathers `ExtraSignals` from optional sources
pub struct SignalCollector {
    logs: Option<Arc<dyn LogSource>>,
    store: Option<Arc<dyn MetricsStore>>,
    analyzer: LogAnalyzer,
    pressure_queries: Vec<String>,
    log_window: Duration,
    log_limit: u32,
}

impl SignalCollector {
    pub fn new() -> Self {
        Self {
            logs: None,
            store: None,
            analyzer: LogAnalyzer::default(),
            pressure_queries: Vec::new(),
            log_window: Duration::from_secs(3600),
            log_limit: DEFAULT_LOG_LIMIT,
        }
    }

    pub fn with_logs(mut self, logs: Arc<dyn LogSource>, window: Duration) -> Self {
        self.logs = Some(logs);
        self.log_window = window;
        self
    }

    pub fn with_log_limit(mut self, limit: u32) -> Self {
        self.log_limit = limit;
        self
    }

    /// Each query must evaluate to fractions in 0..1
    pub fn with_pressure(mut self, store: Arc<dyn MetricsStore>, queries: Vec<String>) -> Self {
        self.store = Some(store);
        self.pressure_queries = queries;
        self
    }

    /// Collect all signals concurrently, never waiting past `deadline`
    pub async fn collect(&self, deadline: Duration) -> ExtraSignals {
        self.snapshot(deadline).await.extra
    }

    /// Like `collect`, keeping the log analysis behind the error rate
    pub async fn snapshot(&self, deadline: Duration) -> SignalSnapshot {
        let budget = deadline_budget(deadline);

        let (logs, pressure) = tokio::join!(
            timeout(budget, self.analyze_logs(budget)),
            timeout(budget, self.resource_pressure(budget)),
        );

        let logs = logs.unwrap_or_else(|_| {
            warn!(budget_ms = budget.as_millis() as u64, "Log signal timed out");
            None
        });
        let resource_pressure = pressure.unwrap_or_else(|_| {
            warn!(budget_ms = budget.as_millis() as u64, "Pressure signal timed out");
            None
        });

        if let Some(analysis) = &logs {
            debug!(
                entries = analysis.total_entries,
                errors = analysis.levels.error,
                alert_level = ?analysis.alert_level,
                patterns = ?analysis.detected_patterns,
                "Analysed recent logs"
            );
        }

        SignalSnapshot {
            extra: ExtraSignals {
                log_error_rate: logs.as_ref().and_then(LogAnalysis::error_rate),
                resource_pressure,
            },
            // An empty window says nothing about alert level or patterns
            logs: logs.filter(|analysis| analysis.total_entries > 0),
        }
    }

    /// Fetch and analyse recent logs
    pub async fn analyze_logs(&self, limit: Duration) -> Option<LogAnalysis> {
        let source = self.logs.as_ref()?;
        match source
            .recent_lines(self.log_window, self.log_limit, limit)
            .await
        {
            Ok(lines) => Some(self.analyzer.analyze(&lines)),
            Err(e) => {
                warn!(error = %e, "Log source unavailable, skipping log signal");
                None
            }
        }
    }

    async fn resource_pressure(&self, limit: Duration) -> Option<f64> {
        let store = self.store.as_ref()?;
        let mut highest: Option<f64> = None;

        for query in &self.pressure_queries {
            match store.instant_query(query, limit).await {
                Ok(response) => {
                    for value in response.values() {
                        let value = value.clamp(0.0, 1.0);
                        highest = Some(highest.map_or(value, |h| h.max(value)));
                    }
                }
                Err(e) => warn!(query = %query, error = %e, "Pressure query failed"),
            }
        }

        highest
    }
}

impl Default for SignalCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeStore, Reply};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeLogs {
        reply: Reply<Vec<String>>,
        calls: AtomicUsize,
    }

    impl FakeLogs {
        fn new(reply: Reply<Vec<String>>) -> Arc<Self> {
            Arc::new(Self {
                reply,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl LogSource for FakeLogs {
        async fn recent_lines(
            &self,
            _window: Duration,
            _limit: u32,
            _timeout: Duration,
        ) -> Result<Vec<String>, ProbeFailure> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.reply {
                Reply::Ok(lines) => Ok(lines.clone()),
                Reply::Fail(failure) => Err(failure.clone()),
                Reply::Delay(delay, lines) => {
                    tokio::time::sleep(*delay).await;
                    Ok(lines.clone())
                }
            }
        }
    }

    fn lines(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|l| l.to_string()).collect()
    }

    #[tokio::test]
    async fn test_no_sources_yields_empty_signals() {
        let signals = SignalCollector::new().collect(Duration::from_secs(3)).await;
        assert!(signals.is_empty());
    }

    #[tokio::test]
    async fn test_log_error_rate() {
        let logs = FakeLogs::new(Reply::Ok(lines(&[
            "INFO ok",
            "INFO ok",
            "INFO ok",
            "ERROR boom",
        ])));
        let collector = SignalCollector::new().with_logs(logs.clone(), Duration::from_secs(60));

        let signals = collector.collect(Duration::from_secs(3)).await;
        assert_eq!(signals.log_error_rate, Some(0.25));
        assert_eq!(signals.resource_pressure, None);
        assert_eq!(logs.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failing_log_source_is_absent() {
        let logs = FakeLogs::new(Reply::Fail(ProbeFailure::Transport("refused".into())));
        let collector = SignalCollector::new().with_logs(logs, Duration::from_secs(60));

        let signals = collector.collect(Duration::from_secs(3)).await;
        assert_eq!(signals.log_error_rate, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_log_source_bounded_by_deadline() {
        let logs = FakeLogs::new(Reply::Delay(Duration::from_secs(30), lines(&["ERROR x"])));
        let store = Arc::new(FakeStore::new().values("cpu", &[0.4]));
        let collector = SignalCollector::new()
            .with_logs(logs, Duration::from_secs(60))
            .with_pressure(store, vec!["cpu".to_string()]);

        let started = tokio::time::Instant::now();
        let signals = collector.collect(Duration::from_secs(2)).await;

        assert!(started.elapsed() < Duration::from_secs(2));
        assert_eq!(signals.log_error_rate, None);
        assert_eq!(signals.resource_pressure, Some(0.4));
    }

    #[tokio::test]
    async fn test_pressure_is_max_over_queries_clamped() {
        let store = Arc::new(
            FakeStore::new()
                .values("cpu", &[0.3, 0.7])
                .values("memory", &[1.4])
                .reply(
                    "disk",
                    Reply::Fail(ProbeFailure::Transport("store down".into())),
                ),
        );
        let collector = SignalCollector::new().with_pressure(
            store.clone(),
            vec!["cpu".into(), "memory".into(), "disk".into()],
        );

        let signals = collector.collect(Duration::from_secs(3)).await;
        assert_eq!(signals.resource_pressure, Some(1.0));
        assert_eq!(store.queries.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_pressure_without_data_is_absent() {
        let store = Arc::new(FakeStore::new());
        let collector = SignalCollector::new().with_pressure(store, vec!["cpu".into()]);

        let signals = collector.collect(Duration::from_secs(3)).await;
        assert_eq!(signals.resource_pressure, None);
    }

    #[tokio::test]
    async fn test_snapshot_keeps_log_analysis() {
        let logs = FakeLogs::new(Reply::Ok(lines(&[
            "INFO request served",
            "ERROR database connection failed",
        ])));
        let collector = SignalCollector::new().with_logs(logs, Duration::from_secs(60));

        let snapshot = collector.snapshot(Duration::from_secs(3)).await;
        assert_eq!(snapshot.extra.log_error_rate, Some(0.5));

        let analysis = snapshot.logs.unwrap();
        assert_eq!(analysis.alert_level, AlertLevel::Error);
        assert!(analysis.detected_patterns.contains(&PatternFamily::Database));
    }

    #[tokio::test]
    async fn test_snapshot_drops_empty_log_window() {
        let logs = FakeLogs::new(Reply::Ok(Vec::new()));
        let collector = SignalCollector::new().with_logs(logs, Duration::from_secs(60));

        let snapshot = collector.snapshot(Duration::from_secs(3)).await;
        assert_eq!(snapshot.extra.log_error_rate, None);
        assert!(snapshot.logs.is_none());
    }

    #[tokio::test]
    async fn test_analyze_logs_reports_patterns() {
        let logs = FakeLogs::new(Reply::Ok(lines(&["WARNING 403 forbidden for /admin"])));
        let collector = SignalCollector::new().with_logs(logs, Duration::from_secs(60));

        let analysis = collector
            .analyze_logs(Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(analysis.alert_level, AlertLevel::Warning);
        assert_eq!(analysis.detected_patterns, vec![PatternFamily::Security]);
    }
}
