//! Core data models for the health engine

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Default per-target probe timeout
pub const DEFAULT_TARGET_TIMEOUT_MS: u64 = 2_000;

/// Kind of thing a target probes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    /// HTTP endpoint, healthy on any 2xx
    HttpEndpoint,
    /// Group of containers matched by name filter
    ContainerGroup,
    /// Query against the metrics store
    MetricQuery,
}

impl TargetKind {
    /// Whether this kind counts toward service availability
    pub fn is_service(&self) -> bool {
        matches!(self, TargetKind::HttpEndpoint | TargetKind::MetricQuery)
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetKind::HttpEndpoint => write!(f, "http_endpoint"),
            TargetKind::ContainerGroup => write!(f, "container_group"),
            TargetKind::MetricQuery => write!(f, "metric_query"),
        }
    }
}

/// A configured thing to probe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Target {
    pub name: String,
    pub kind: TargetKind,
    /// URL, container name filter, or query string depending on `kind`
    pub address: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Only critical services count toward availability
    #[serde(default = "default_critical")]
    pub critical: bool,
    /// Expected running containers (container groups only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected: Option<u32>,
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TARGET_TIMEOUT_MS
}

fn default_critical() -> bool {
    true
}

impl Target {
    fn new(name: impl Into<String>, kind: TargetKind, address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            address: address.into(),
            timeout_ms: DEFAULT_TARGET_TIMEOUT_MS,
            critical: true,
            expected: None,
        }
    }

    pub fn http(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self::new(name, TargetKind::HttpEndpoint, url)
    }

    pub fn container_group(name: impl Into<String>, filter: impl Into<String>, expected: u32) -> Self {
        let mut target = Self::new(name, TargetKind::ContainerGroup, filter);
        target.expected = Some(expected);
        target
    }

    pub fn metric_query(name: impl Into<String>, query: impl Into<String>) -> Self {
        Self::new(name, TargetKind::MetricQuery, query)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn non_critical(mut self) -> Self {
        self.critical = false;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Probe-level error taxonomy, captured as data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProbeErrorKind {
    #[serde(rename = "PROBE_TIMEOUT")]
    Timeout,
    #[serde(rename = "PROBE_TRANSPORT_ERROR")]
    Transport,
    #[serde(rename = "PROBE_MALFORMED_RESPONSE")]
    MalformedResponse,
}

impl fmt::Display for ProbeErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeErrorKind::Timeout => write!(f, "PROBE_TIMEOUT"),
            ProbeErrorKind::Transport => write!(f, "PROBE_TRANSPORT_ERROR"),
            ProbeErrorKind::MalformedResponse => write!(f, "PROBE_MALFORMED_RESPONSE"),
        }
    }
}

/// Outcome of one probe in one collection cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeResult {
    pub target_name: String,
    pub kind: TargetKind,
    #[serde(default = "default_critical")]
    pub critical: bool,
    pub reachable: bool,
    #[serde(default, with = "opt_millis", skip_serializing_if = "Option::is_none")]
    pub latency: Option<Duration>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ProbeErrorKind>,
    /// Matching running containers, container groups only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,
    /// Short failure description for reports
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ProbeResult {
    pub fn reachable(target: &Target, latency: Duration) -> Self {
        Self {
            target_name: target.name.clone(),
            kind: target.kind,
            critical: target.critical,
            reachable: true,
            latency: Some(latency),
            error: None,
            count: None,
            detail: None,
        }
    }

    pub fn unreachable(target: &Target, error: ProbeErrorKind, detail: impl Into<String>) -> Self {
        Self {
            target_name: target.name.clone(),
            kind: target.kind,
            critical: target.critical,
            reachable: false,
            latency: None,
            error: Some(error),
            count: None,
            detail: Some(detail.into()),
        }
    }

    pub fn with_count(mut self, count: u32) -> Self {
        self.count = Some(count);
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }
}

/// All probe results of one collection cycle, in target order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProbeBatch {
    pub results: Vec<ProbeResult>,
    #[serde(with = "millis")]
    pub elapsed: Duration,
}

impl ProbeBatch {
    pub fn failures(&self) -> impl Iterator<Item = &ProbeResult> {
        self.results.iter().filter(|r| !r.reachable)
    }
}

/// Coarse tri-state availability label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StatusLabel {
    Ok,
    Partial,
    Critical,
}

impl fmt::Display for StatusLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusLabel::Ok => write!(f, "OK"),
            StatusLabel::Partial => write!(f, "PARTIAL"),
            StatusLabel::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// Cheap availability summary, recomputed every cycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuickStatus {
    pub services_available: u32,
    pub services_total: u32,
    pub containers_running: u32,
    pub containers_expected: u32,
    /// Matching containers before clamping to the expectation
    pub containers_observed: u32,
    pub expectation_configured: bool,
    #[serde(with = "millis")]
    pub elapsed: Duration,
    pub label: StatusLabel,
}

impl QuickStatus {
    pub fn services_unavailable(&self) -> u32 {
        self.services_total.saturating_sub(self.services_available)
    }

    pub fn containers_missing(&self) -> u32 {
        self.containers_expected.saturating_sub(self.containers_running)
    }
}

/// Responsiveness of a whole collection cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PerformanceLevel {
    #[default]
    Fast,
    Moderate,
    Slow,
}

impl PerformanceLevel {
    /// Cycles above this are MODERATE
    pub const MODERATE_AFTER: Duration = Duration::from_millis(500);
    /// Cycles above this are SLOW
    pub const SLOW_AFTER: Duration = Duration::from_millis(1_000);

    pub fn from_elapsed(elapsed: Duration) -> Self {
        if elapsed > Self::SLOW_AFTER {
            PerformanceLevel::Slow
        } else if elapsed > Self::MODERATE_AFTER {
            PerformanceLevel::Moderate
        } else {
            PerformanceLevel::Fast
        }
    }
}

impl fmt::Display for PerformanceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PerformanceLevel::Fast => write!(f, "FAST"),
            PerformanceLevel::Moderate => write!(f, "MODERATE"),
            PerformanceLevel::Slow => write!(f, "SLOW"),
        }
    }
}

/// Severity level derived from the score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HealthLevel {
    Excellent,
    Good,
    Degraded,
    Critical,
}

impl fmt::Display for HealthLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HealthLevel::Excellent => write!(f, "EXCELLENT"),
            HealthLevel::Good => write!(f, "GOOD"),
            HealthLevel::Degraded => write!(f, "DEGRADED"),
            HealthLevel::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// Dimension a score penalty was applied for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Factor {
    UnavailableServices,
    MissingContainers,
    LogErrorRate,
    ResourcePressure,
}

impl fmt::Display for Factor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Factor::UnavailableServices => write!(f, "unavailable_services"),
            Factor::MissingContainers => write!(f, "missing_containers"),
            Factor::LogErrorRate => write!(f, "log_error_rate"),
            Factor::ResourcePressure => write!(f, "resource_pressure"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributingFactor {
    pub factor_name: Factor,
    pub impact: u32,
}

/// How much the assessment can be trusted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Full,
    /// Some denominator was not configured and counted as zero penalty
    Degraded,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthAssessment {
    pub score: u8,
    pub level: HealthLevel,
    /// Ordered by descending impact
    pub contributing_factors: Vec<ContributingFactor>,
    pub confidence: Confidence,
}

impl HealthAssessment {
    pub fn has_factor(&self, factor: Factor) -> bool {
        self.contributing_factors
            .iter()
            .any(|f| f.factor_name == factor)
    }
}

/// Optional secondary signals; each field is absent when its source was unavailable
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtraSignals {
    /// Fraction of error log lines, 0..1
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_error_rate: Option<f64>,
    /// Saturation of the most pressured resource, 0..1
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_pressure: Option<f64>,
}

impl ExtraSignals {
    pub fn is_empty(&self) -> bool {
        self.log_error_rate.is_none() && self.resource_pressure.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    /// Lower sorts first
    pub priority: u8,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fix_id: Option<String>,
}

/// Serialize a `Duration` as whole milliseconds
mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

mod opt_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(
        value: &Option<Duration>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => serializer.serialize_some(&(d.as_millis() as u64)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Duration>, D::Error> {
        Ok(Option::<u64>::deserialize(deserializer)?.map(Duration::from_millis))
    }
}
