//! Monitor engine
//!
//! Wires collector, reducer, scorer, recommendation rules and report
//! assembly into one explicit instance. Collaborators are injected through
//! `MonitorEngineBuilder`; anything not supplied falls back to the
//! production clients derived from `MonitorConfig`.

use crate::collector::{
    ContainerRuntime, DockerCli, HttpProber, MetricsStore, PrometheusClient, ProbeCollector,
    ReqwestHttpProber,
};
use crate::config::MonitorConfig;
use crate::error::ConfigError;
use crate::models::{
    ExtraSignals, HealthAssessment, PerformanceLevel, ProbeBatch, QuickStatus, Recommendation,
    StatusLabel,
};
use crate::observability::{MonitorMetrics, StructuredLogger};
use crate::recommend::{recommend_with, Observations};
use crate::reducer::reduce;
use crate::report::HealthReport;
use crate::scorer::HealthScorer;
use crate::signals::{LogAnalysis, LokiClient, SignalCollector};
use crate::smoothing::FlapDamper;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Everything computed in one collection cycle
#[derive(Debug, Clone)]
pub struct Cycle {
    pub batch: ProbeBatch,
    pub status: QuickStatus,
    pub extra: Option<ExtraSignals>,
    /// Recent log analysis, when logs were collected and non-empty
    pub logs: Option<LogAnalysis>,
}

/// How a cycle interacts with the flap damper
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Damping {
    /// Scheduled cycle: record the raw label
    Advance,
    /// On-demand request: read the damper without recording
    Peek,
}

pub struct MonitorEngine {
    config: MonitorConfig,
    collector: ProbeCollector,
    scorer: HealthScorer,
    signals: Option<SignalCollector>,
    damper: Option<FlapDamper>,
    metrics: MonitorMetrics,
    logger: StructuredLogger,
}

impl MonitorEngine {
    pub fn builder(config: MonitorConfig) -> MonitorEngineBuilder {
        MonitorEngineBuilder::new(config)
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub fn has_signals(&self) -> bool {
        self.signals.is_some()
    }

    /// Label last reported by a scheduled cycle, when smoothing is enabled
    pub fn damped_label(&self) -> Option<StatusLabel> {
        self.damper.as_ref().and_then(FlapDamper::reported)
    }

    /// Probe all targets and reduce; the cheap path
    pub async fn quick_status(&self) -> QuickStatus {
        self.cycle(false).await.status
    }

    pub async fn assess(&self, with_signals: bool) -> HealthAssessment {
        let cycle = self.cycle(with_signals).await;
        self.score(&cycle)
    }

    /// On-demand report; never advances the flap damper
    pub async fn report(&self, with_signals: bool) -> HealthReport {
        let cycle = self.cycle(with_signals).await;
        self.build_report(cycle)
    }

    /// Report for the periodic loop; the only caller that advances the damper
    pub async fn scheduled_report(&self, with_signals: bool) -> HealthReport {
        let cycle = self.run_cycle(with_signals, Damping::Advance).await;
        self.build_report(cycle)
    }

    /// Run probes and, if requested, secondary signals under one deadline
    pub async fn cycle(&self, with_signals: bool) -> Cycle {
        self.run_cycle(with_signals, Damping::Peek).await
    }

    async fn run_cycle(&self, with_signals: bool, damping: Damping) -> Cycle {
        let deadline = self.config.deadline();

        let (batch, snapshot) = match self.signals.as_ref().filter(|_| with_signals) {
            Some(signals) => {
                let (batch, snapshot) = tokio::join!(
                    self.collector.collect(&self.config.targets, deadline),
                    signals.snapshot(deadline),
                );
                (batch, Some(snapshot))
            }
            None => (
                self.collector.collect(&self.config.targets, deadline).await,
                None,
            ),
        };

        for result in &batch.results {
            self.metrics.record_probe(result);
            if !result.reachable {
                self.logger.log_probe_failure(result);
            }
        }

        let mut status = reduce(&batch, self.config.containers_expected());
        let raw_label = status.label;
        if let Some(damper) = &self.damper {
            status.label = match damping {
                Damping::Advance => damper.observe(raw_label),
                Damping::Peek => damper.peek(raw_label),
            };
        }

        self.metrics.record_status(&status);
        self.logger.log_quick_status(&status, raw_label);

        let (extra, logs) = match snapshot {
            Some(snapshot) => (Some(snapshot.extra), snapshot.logs),
            None => (None, None),
        };
        Cycle {
            batch,
            status,
            extra,
            logs,
        }
    }

    fn build_report(&self, cycle: Cycle) -> HealthReport {
        let assessment = self.score(&cycle);
        let patterns = cycle
            .logs
            .as_ref()
            .map(|logs| logs.detected_patterns.as_slice())
            .unwrap_or_default();
        let seen = Observations {
            performance: PerformanceLevel::from_elapsed(cycle.batch.elapsed),
            log_patterns: patterns,
        };
        let recommendations: Vec<Recommendation> =
            recommend_with(&assessment, &cycle.status, &seen);

        let issues = self
            .config
            .issues()
            .iter()
            .map(|issue| issue.to_string())
            .collect();
        let report = HealthReport::assemble(
            cycle.batch,
            cycle.status,
            assessment,
            recommendations,
            cycle.extra,
        )
        .with_log_analysis(cycle.logs)
        .with_config_issues(issues);

        self.logger.log_report(&report);
        report
    }

    fn score(&self, cycle: &Cycle) -> HealthAssessment {
        let assessment = self.scorer.score(&cycle.status, cycle.extra.as_ref());
        self.metrics.record_assessment(&assessment);
        self.logger.log_assessment(&assessment);
        assessment
    }
}

pub struct MonitorEngineBuilder {
    config: MonitorConfig,
    http: Option<Arc<dyn HttpProber>>,
    runtime: Option<Arc<dyn ContainerRuntime>>,
    store: Option<Arc<dyn MetricsStore>>,
    signals: Option<Option<SignalCollector>>,
    instance: String,
}

impl MonitorEngineBuilder {
    pub fn new(config: MonitorConfig) -> Self {
        Self {
            config,
            http: None,
            runtime: None,
            store: None,
            signals: None,
            instance: "stackmon".to_string(),
        }
    }

    pub fn http(mut self, http: Arc<dyn HttpProber>) -> Self {
        self.http = Some(http);
        self
    }

    pub fn runtime(mut self, runtime: Arc<dyn ContainerRuntime>) -> Self {
        self.runtime = Some(runtime);
        self
    }

    pub fn store(mut self, store: Arc<dyn MetricsStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn signals(mut self, signals: SignalCollector) -> Self {
        self.signals = Some(Some(signals));
        self
    }

    pub fn without_signals(mut self) -> Self {
        self.signals = Some(None);
        self
    }

    /// Name attached to every structured log record
    pub fn instance(mut self, instance: impl Into<String>) -> Self {
        self.instance = instance.into();
        self
    }

    pub fn build(self) -> Result<MonitorEngine, ConfigError> {
        let config = self.config;
        config.validate()?;

        let logger = StructuredLogger::new(self.instance);
        for issue in config.issues() {
            logger.log_config_issue(&issue);
        }

        let http: Arc<dyn HttpProber> = match self.http {
            Some(http) => http,
            None => Arc::new(ReqwestHttpProber::new()),
        };
        let runtime: Arc<dyn ContainerRuntime> = match self.runtime {
            Some(runtime) => runtime,
            None => Arc::new(DockerCli::new()),
        };
        let store: Arc<dyn MetricsStore> = match self.store {
            Some(store) => store,
            None => Arc::new(PrometheusClient::new(&config.metrics_store_url)?),
        };

        let signals = match self.signals {
            Some(signals) => signals,
            None => signals_from_config(&config, store.clone())?,
        };

        let damper = config
            .smoothing
            .enabled
            .then(|| FlapDamper::new(config.smoothing.window, config.smoothing.confirm_cycles));

        debug!(
            targets = config.targets.len(),
            signals = signals.is_some(),
            smoothing = damper.is_some(),
            "Monitor engine built"
        );

        Ok(MonitorEngine {
            scorer: HealthScorer::new(config.scoring.clone()),
            collector: ProbeCollector::new(http, runtime, store),
            config,
            signals,
            damper,
            metrics: MonitorMetrics::new(),
            logger,
        })
    }
}

fn signals_from_config(
    config: &MonitorConfig,
    store: Arc<dyn MetricsStore>,
) -> Result<Option<SignalCollector>, ConfigError> {
    let settings = &config.signals;
    if settings.log_store_url.is_none() && settings.pressure_queries.is_empty() {
        return Ok(None);
    }

    let mut signals = SignalCollector::new().with_log_limit(settings.log_limit);
    if let Some(url) = &settings.log_store_url {
        let loki = LokiClient::new(url)?.with_queries(settings.log_queries.clone());
        signals = signals.with_logs(
            Arc::new(loki),
            Duration::from_secs(settings.log_window_secs),
        );
    }
    if !settings.pressure_queries.is_empty() {
        signals = signals.with_pressure(store, settings.pressure_queries.clone());
    }
    Ok(Some(signals))
}
