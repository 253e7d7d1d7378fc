//! Health aggregation library for a monitored service stack
//!
//! This crate provides the core functionality for:
//! - Bounded-time probing of HTTP endpoints, container groups and metric queries
//! - Reduction into a quick status and scoring into a health assessment
//! - Rule-based recommendations and structured health reports
//! - Optional secondary signals (log error rate, resource pressure)
//! - Metrics and structured logging of every cycle

pub mod collector;
pub mod config;
pub mod engine;
pub mod error;
pub mod models;
pub mod observability;
pub mod recommend;
pub mod reducer;
pub mod report;
pub mod scorer;
pub mod signals;
pub mod smoothing;

#[cfg(test)]
mod testing;

pub use self::config::MonitorConfig;
pub use engine::{MonitorEngine, MonitorEngineBuilder};
pub use error::{ConfigError, ProbeFailure};
pub use models::*;
pub use observability::{MonitorMetrics, StructuredLogger};
pub use recommend::{recommend, recommend_with, Observations};
pub use reducer::reduce;
pub use report::{HealthReport, OverallStatus};
pub use scorer::{score, HealthScorer, ScoringConfig};
