//! Error types for configuration and collaborator calls

use std::time::Duration;
use thiserror::Error;

use crate::models::ProbeErrorKind;

/// Configuration problems that prevent the engine from running
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// CONFIG_MISSING_TARGET
    #[error("missing target configuration: {0}")]
    MissingTarget(String),

    #[error("duplicate target name: {0}")]
    DuplicateTarget(String),

    #[error("target {name}: timeout {timeout_ms}ms must be below the global deadline {deadline_ms}ms")]
    InvalidTimeout {
        name: String,
        timeout_ms: u64,
        deadline_ms: u64,
    },

    #[error("invalid score bands: {0}")]
    InvalidBands(String),

    #[error("invalid url {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
}

/// Failure reported by a probe collaborator
///
/// Never escapes the collector; it is folded into `ProbeResult::error`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProbeFailure {
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("malformed response: {0}")]
    Malformed(String),
}

impl ProbeFailure {
    pub fn kind(&self) -> ProbeErrorKind {
        match self {
            ProbeFailure::Timeout(_) => ProbeErrorKind::Timeout,
            ProbeFailure::Transport(_) => ProbeErrorKind::Transport,
            ProbeFailure::Malformed(_) => ProbeErrorKind::MalformedResponse,
        }
    }
}

impl ProbeFailure {
    /// Classify a reqwest error for a request issued with `timeout`
    pub fn from_reqwest(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            ProbeFailure::Timeout(timeout)
        } else if err.is_decode() {
            ProbeFailure::Malformed(err.to_string())
        } else {
            ProbeFailure::Transport(err.to_string())
        }
    }
}
