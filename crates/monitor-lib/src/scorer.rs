//! Health scoring
//!
//! Turns a `QuickStatus` plus optional secondary signals into a 0-100 score,
//! a severity level and an explainable list of contributing factors.
//!
//! Availability facts dominate: each unavailable service costs
//! `service_budget / services_total` points and each missing container
//! `container_budget / containers_expected` points, never less than one. Secondary signals (log
//! error rate, resource pressure) are each capped at `optional_cap` points.
//! The running score is clamped to [0, 100] after every subtraction.

use crate::error::ConfigError;
use crate::models::{
    Confidence, ContributingFactor, ExtraSignals, Factor, HealthAssessment, HealthLevel,
    QuickStatus,
};
use serde::{Deserialize, Serialize};

const MAX_SCORE: i64 = 100;

/// Lower bounds of the score bands, inclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelBands {
    pub excellent: u8,
    pub good: u8,
    pub degraded: u8,
}

impl Default for LevelBands {
    fn default() -> Self {
        Self {
            excellent: 90,
            good: 70,
            degraded: 40,
        }
    }
}

impl LevelBands {
    /// Bands must be strictly descending and leave room for every level
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.excellent > 100 {
            return Err(ConfigError::InvalidBands(format!(
                "excellent threshold {} exceeds 100",
                self.excellent
            )));
        }
        if !(self.excellent > self.good && self.good > self.degraded && self.degraded > 0) {
            return Err(ConfigError::InvalidBands(format!(
                "thresholds must satisfy excellent > good > degraded > 0, got {}/{}/{}",
                self.excellent, self.good, self.degraded
            )));
        }
        Ok(())
    }

    pub fn level_for(&self, score: u8) -> HealthLevel {
        if score >= self.excellent {
            HealthLevel::Excellent
        } else if score >= self.good {
            HealthLevel::Good
        } else if score >= self.degraded {
            HealthLevel::Degraded
        } else {
            HealthLevel::Critical
        }
    }
}

/// Penalty weights and band thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Points shared by all services
    pub service_budget: u32,
    /// Points shared by all expected containers
    pub container_budget: u32,
    /// Maximum points any single optional signal may cost
    pub optional_cap: u32,
    /// Error rate (fraction) at which logs start to cost points
    pub log_error_threshold: f64,
    /// Points per whole error-rate fraction, 200 means 2 points per percent
    pub log_error_weight: f64,
    /// Pressure (fraction) at which resources start to cost points
    pub pressure_threshold: f64,
    pub bands: LevelBands,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            service_budget: 100,
            container_budget: 50,
            optional_cap: 20,
            log_error_threshold: 0.01,
            log_error_weight: 200.0,
            pressure_threshold: 0.8,
            bands: LevelBands::default(),
        }
    }
}

impl ScoringConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.bands.validate()?;
        if self.optional_cap > 100 {
            return Err(ConfigError::InvalidBands(format!(
                "optional cap {} exceeds 100",
                self.optional_cap
            )));
        }
        if !(0.0..1.0).contains(&self.pressure_threshold) {
            return Err(ConfigError::InvalidBands(format!(
                "pressure threshold {} must be in [0, 1)",
                self.pressure_threshold
            )));
        }
        Ok(())
    }
}

/// Computes health assessments; holds no state between calls
#[derive(Debug, Clone, Default)]
pub struct HealthScorer {
    config: ScoringConfig,
}

impl HealthScorer {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    pub fn score(&self, status: &QuickStatus, extra: Option<&ExtraSignals>) -> HealthAssessment {
        let mut score = MAX_SCORE;
        let mut factors = Vec::new();

        let per_service = per_unit(self.config.service_budget, status.services_total);
        let impact: u32 = (0..status.services_unavailable())
            .map(|_| subtract(&mut score, per_service))
            .sum();
        push_factor(&mut factors, Factor::UnavailableServices, impact);

        let per_container = per_unit(self.config.container_budget, status.containers_expected);
        let impact: u32 = (0..status.containers_missing())
            .map(|_| subtract(&mut score, per_container))
            .sum();
        push_factor(&mut factors, Factor::MissingContainers, impact);

        if let Some(extra) = extra {
            if let Some(rate) = extra.log_error_rate {
                let impact = subtract(&mut score, self.log_error_penalty(rate));
                push_factor(&mut factors, Factor::LogErrorRate, impact);
            }
            if let Some(pressure) = extra.resource_pressure {
                let impact = subtract(&mut score, self.pressure_penalty(pressure));
                push_factor(&mut factors, Factor::ResourcePressure, impact);
            }
        }

        // Stable: equal impacts keep application order
        factors.sort_by(|a, b| b.impact.cmp(&a.impact));

        let score = score as u8;
        HealthAssessment {
            score,
            level: self.config.bands.level_for(score),
            contributing_factors: factors,
            confidence: if status.expectation_configured {
                Confidence::Full
            } else {
                Confidence::Degraded
            },
        }
    }

    fn log_error_penalty(&self, rate: f64) -> u32 {
        let rate = sanitize_fraction(rate);
        if rate <= self.config.log_error_threshold {
            return 0;
        }
        let penalty = (rate * self.config.log_error_weight).round() as u32;
        penalty.min(self.config.optional_cap)
    }

    fn pressure_penalty(&self, pressure: f64) -> u32 {
        let pressure = sanitize_fraction(pressure);
        let threshold = self.config.pressure_threshold;
        if pressure <= threshold {
            return 0;
        }
        let excess = (pressure - threshold) / (1.0 - threshold);
        let penalty = (excess * self.config.optional_cap as f64).round() as u32;
        penalty.min(self.config.optional_cap)
    }
}

/// Score with the default weights and bands
pub fn score(status: &QuickStatus, extra: Option<&ExtraSignals>) -> HealthAssessment {
    HealthScorer::default().score(status, extra)
}

/// Zero when there is nothing to divide by; otherwise at least one point so
/// every additional outage still lowers the score
fn per_unit(budget: u32, units: u32) -> u32 {
    if units == 0 || budget == 0 {
        0
    } else {
        (budget / units).max(1)
    }
}

/// Subtract with clamping, returning the points actually removed
fn subtract(score: &mut i64, penalty: u32) -> u32 {
    let before = *score;
    *score = (*score - penalty as i64).clamp(0, MAX_SCORE);
    (before - *score) as u32
}

fn push_factor(factors: &mut Vec<ContributingFactor>, factor: Factor, impact: u32) {
    if impact > 0 {
        factors.push(ContributingFactor {
            factor_name: factor,
            impact,
        });
    }
}

/// NaN counts as no signal, everything else is clamped to [0, 1]
fn sanitize_fraction(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
