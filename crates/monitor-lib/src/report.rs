//! Structured health report
//!
//! The report only combines values computed upstream. Delivery (email,
//! chat, dashboards) is left to whoever consumes the serialized form.

use crate::models::{
    ExtraSignals, HealthAssessment, HealthLevel, PerformanceLevel, ProbeBatch, ProbeResult,
    QuickStatus, Recommendation,
};
use crate::signals::{AlertLevel, LogAnalysis};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Weight at or above which a report is CRITICAL
const CRITICAL_WEIGHT: u32 = 6;
/// Weight at or above which a report is WARNING
const WARNING_WEIGHT: u32 = 3;

/// One-word summary of a report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OverallStatus {
    Normal,
    Warning,
    Critical,
}

impl fmt::Display for OverallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverallStatus::Normal => write!(f, "NORMAL"),
            OverallStatus::Warning => write!(f, "WARNING"),
            OverallStatus::Critical => write!(f, "CRITICAL"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    pub generated_at: DateTime<Utc>,
    pub probes: ProbeBatch,
    pub quick_status: QuickStatus,
    pub assessment: HealthAssessment,
    pub recommendations: Vec<Recommendation>,
    /// Derived from the probe batch duration
    #[serde(default)]
    pub performance: PerformanceLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signals: Option<ExtraSignals>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logs: Option<LogAnalysis>,
    /// Soft configuration problems that lowered confidence
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub config_issues: Vec<String>,
}

impl HealthReport {
    pub fn assemble(
        batch: ProbeBatch,
        status: QuickStatus,
        assessment: HealthAssessment,
        recommendations: Vec<Recommendation>,
        extra: Option<ExtraSignals>,
    ) -> Self {
        Self {
            generated_at: Utc::now(),
            performance: PerformanceLevel::from_elapsed(batch.elapsed),
            probes: batch,
            quick_status: status,
            assessment,
            recommendations,
            signals: extra,
            logs: None,
            config_issues: Vec::new(),
        }
    }

    pub fn with_log_analysis(mut self, logs: Option<LogAnalysis>) -> Self {
        self.logs = logs;
        self
    }

    pub fn with_config_issues(mut self, issues: Vec<String>) -> Self {
        self.config_issues = issues;
        self
    }

    /// Weighted combination of health level, cycle performance and log alerts
    pub fn overall_status(&self) -> OverallStatus {
        let health = match self.assessment.level {
            HealthLevel::Excellent => 0,
            HealthLevel::Good => 1,
            HealthLevel::Degraded => WARNING_WEIGHT,
            HealthLevel::Critical => CRITICAL_WEIGHT,
        };
        let performance = match self.performance {
            PerformanceLevel::Slow => 2,
            PerformanceLevel::Fast | PerformanceLevel::Moderate => 0,
        };
        let logs = match self.logs.as_ref().map(|l| l.alert_level) {
            Some(AlertLevel::Error) => 3,
            Some(AlertLevel::Warning) => 2,
            Some(AlertLevel::Info) | None => 0,
        };

        match health + performance + logs {
            w if w >= CRITICAL_WEIGHT => OverallStatus::Critical,
            w if w >= WARNING_WEIGHT => OverallStatus::Warning,
            _ => OverallStatus::Normal,
        }
    }

    pub fn failing_targets(&self) -> Vec<&ProbeResult> {
        self.probes.failures().collect()
    }

    /// Single line suitable for logs and terminal output
    pub fn summary_line(&self) -> String {
        let status = &self.quick_status;
        let mut line = format!(
            "{} score={} level={} services={}/{} containers={}/{} elapsed={}ms",
            self.overall_status(),
            self.assessment.score,
            self.assessment.level,
            status.services_available,
            status.services_total,
            status.containers_running,
            status.containers_expected,
            status.elapsed.as_millis(),
        );
        if let Some(top) = self.recommendations.first() {
            line.push_str(&format!(" next=\"{}\"", top.text));
        }
        line
    }
}
