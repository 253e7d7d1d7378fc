//! Monitor configuration
//!
//! Hard errors (`validate`) stop the engine from starting. Soft issues
//! (`issues`) only lower the confidence of assessments and are surfaced in
//! reports.

use crate::error::ConfigError;
use crate::models::{Target, TargetKind};
use crate::scorer::ScoringConfig;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

/// Environment prefix for overrides, e.g. `STACKMON_DEADLINE_MS=5000`
pub const ENV_PREFIX: &str = "STACKMON";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingConfig {
    pub enabled: bool,
    /// Raw labels kept in memory
    pub window: usize,
    /// Consecutive cycles needed before an OK/PARTIAL change is reported
    pub confirm_cycles: usize,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            window: 5,
            confirm_cycles: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalsConfig {
    /// Loki base URL; log signal disabled when unset
    pub log_store_url: Option<String>,
    /// Stream selectors tried in order, defaults when empty
    pub log_queries: Vec<String>,
    pub log_window_secs: u64,
    pub log_limit: u32,
    /// Metric queries returning saturation fractions in 0..1
    pub pressure_queries: Vec<String>,
}

impl Default for SignalsConfig {
    fn default() -> Self {
        Self {
            log_store_url: Some("http://localhost:3100".to_string()),
            log_queries: Vec::new(),
            log_window_secs: 3600,
            log_limit: 50,
            pressure_queries: vec![
                r#"1 - avg(rate(node_cpu_seconds_total{mode="idle"}[5m]))"#.to_string(),
                "1 - node_memory_MemAvailable_bytes / node_memory_MemTotal_bytes".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub targets: Vec<Target>,
    /// Global probe deadline per cycle
    pub deadline_ms: u64,
    pub metrics_store_url: String,
    pub scoring: ScoringConfig,
    pub smoothing: SmoothingConfig,
    pub signals: SignalsConfig,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            targets: default_targets(),
            deadline_ms: 3_000,
            metrics_store_url: "http://localhost:9090".to_string(),
            scoring: ScoringConfig::default(),
            smoothing: SmoothingConfig::default(),
            signals: SignalsConfig::default(),
        }
    }
}

/// The local observability stack: app, metrics, logs, dashboards
pub fn default_targets() -> Vec<Target> {
    vec![
        Target::http("app", "http://localhost:5000/health"),
        Target::http("prometheus", "http://localhost:9090/-/healthy"),
        Target::http("loki", "http://localhost:3100/ready"),
        Target::http("grafana", "http://localhost:3000/api/health"),
        Target::container_group("stack", "prometheus|devops_app|grafana|loki", 4),
    ]
}

impl MonitorConfig {
    /// Load from an optional file plus `STACKMON_` environment overrides
    ///
    /// Nested keys use a double underscore: `STACKMON_SMOOTHING__ENABLED=true`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = ::config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(::config::File::from(path).required(true));
        }
        let settings = builder
            .add_source(
                ::config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to read monitor configuration")?;

        let config: MonitorConfig = settings
            .try_deserialize()
            .context("Failed to parse monitor configuration")?;
        config.validate()?;
        Ok(config)
    }

    pub fn deadline(&self) -> Duration {
        Duration::from_millis(self.deadline_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.targets.is_empty() {
            return Err(ConfigError::MissingTarget(
                "no targets configured".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for target in &self.targets {
            if !seen.insert(target.name.as_str()) {
                return Err(ConfigError::DuplicateTarget(target.name.clone()));
            }
            if target.timeout_ms >= self.deadline_ms {
                return Err(ConfigError::InvalidTimeout {
                    name: target.name.clone(),
                    timeout_ms: target.timeout_ms,
                    deadline_ms: self.deadline_ms,
                });
            }
        }

        self.scoring.validate()
    }

    /// Problems that degrade confidence without blocking scoring
    pub fn issues(&self) -> Vec<ConfigError> {
        let mut issues = Vec::new();
        let unexpected: Vec<_> = self
            .targets
            .iter()
            .filter(|t| t.kind == TargetKind::ContainerGroup && t.expected.is_none())
            .map(|t| t.name.as_str())
            .collect();
        if !unexpected.is_empty() {
            issues.push(ConfigError::MissingTarget(format!(
                "container expectation not configured for {}",
                unexpected.join(", ")
            )));
        }
        issues
    }

    /// Sum over container groups; `None` when any group lacks an expectation
    pub fn containers_expected(&self) -> Option<u32> {
        self.targets
            .iter()
            .filter(|t| t.kind == TargetKind::ContainerGroup)
            .try_fold(0u32, |sum, t| t.expected.map(|e| sum.saturating_add(e)))
    }

    pub fn target(&self, name: &str) -> Option<&Target> {
        self.targets.iter().find(|t| t.name == name)
    }
}
