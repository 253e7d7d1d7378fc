//! Log store client for the Loki `query_range` API

use super::LogSource;
use crate::collector::{async_trait, normalize_base_url};
use crate::error::{ConfigError, ProbeFailure};
use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Stream selectors tried in order until one returns lines
pub const DEFAULT_LOG_QUERIES: &[&str] = &[
    r#"{job="containerlogs"}"#,
    r#"{job="docker"}"#,
    r#"{container=~".+"}"#,
];

#[derive(Debug, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
enum RangeResponse {
    Success { data: RangeData },
    Error {
        #[serde(default)]
        error: String,
    },
}

#[derive(Debug, Deserialize)]
struct RangeData {
    #[serde(default)]
    result: Vec<Stream>,
}

#[derive(Debug, Deserialize)]
struct Stream {
    /// `[timestamp_ns, line]` pairs
    #[serde(default)]
    values: Vec<(String, String)>,
}

#[derive(Debug, Clone)]
pub struct LokiClient {
    client: Client,
    base_url: Url,
    queries: Vec<String>,
}

impl LokiClient {
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            client: Client::new(),
            base_url: normalize_base_url(base_url)?,
            queries: DEFAULT_LOG_QUERIES.iter().map(|q| q.to_string()).collect(),
        })
    }

    /// Replace the fallback selector list; an empty list keeps the defaults
    pub fn with_queries(mut self, queries: Vec<String>) -> Self {
        if !queries.is_empty() {
            self.queries = queries;
        }
        self
    }

    pub fn queries(&self) -> &[String] {
        &self.queries
    }

    async fn query_range(
        &self,
        query: &str,
        window: Duration,
        limit: u32,
        timeout: Duration,
    ) -> Result<Vec<String>, ProbeFailure> {
        let url = self
            .base_url
            .join("loki/api/v1/query_range")
            .map_err(|e| ProbeFailure::Transport(e.to_string()))?;

        let end = Utc::now();
        let start = end
            - chrono::Duration::from_std(window)
                .map_err(|e| ProbeFailure::Transport(e.to_string()))?;
        let end_ns = end.timestamp_nanos_opt().unwrap_or_default();
        let start_ns = start.timestamp_nanos_opt().unwrap_or_default();

        let response = self
            .client
            .get(url)
            .query(&[
                ("query", query.to_string()),
                ("limit", limit.to_string()),
                ("start", start_ns.to_string()),
                ("end", end_ns.to_string()),
            ])
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| ProbeFailure::from_reqwest(e, timeout))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProbeFailure::Transport(format!("HTTP {}", status.as_u16())));
        }

        let parsed: RangeResponse = response
            .json()
            .await
            .map_err(|e| ProbeFailure::Malformed(e.to_string()))?;

        match parsed {
            RangeResponse::Success { data } => Ok(data
                .result
                .into_iter()
                .flat_map(|stream| stream.values.into_iter().map(|(_, line)| line))
                .collect()),
            RangeResponse::Error { error } => Err(ProbeFailure::Malformed(error)),
        }
    }
}

#[async_trait]
impl LogSource for LokiClient {
    async fn recent_lines(
        &self,
        window: Duration,
        limit: u32,
        timeout: Duration,
    ) -> Result<Vec<String>, ProbeFailure> {
        let mut last_error = None;
        let mut answered = false;

        for query in &self.queries {
            match self.query_range(query, window, limit, timeout).await {
                Ok(lines) if !lines.is_empty() => {
                    debug!(query = %query, lines = lines.len(), "Log query returned lines");
                    return Ok(lines);
                }
                Ok(_) => {
                    answered = true;
                    debug!(query = %query, "Log query returned no lines");
                }
                Err(e) => {
                    debug!(query = %query, error = %e, "Log query failed");
                    last_error = Some(e);
                }
            }
        }

        // Empty everywhere is a valid answer unless every query failed
        match last_error {
            Some(e) if !answered => Err(e),
            _ => Ok(Vec::new()),
        }
    }
}
