//! Metrics store client and strictly typed query responses
//!
//! Responses follow the Prometheus HTTP API envelope. Anything that does not
//! match the expected shape is rejected here as a malformed response instead
//! of being passed inward as loose JSON.

use super::{async_trait, MetricsStore};
use crate::error::{ConfigError, ProbeFailure};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use url::Url;

/// Query API envelope, discriminated by its `status` field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum QueryResponse {
    Success {
        data: QueryData,
    },
    Error {
        #[serde(rename = "errorType", default)]
        error_type: String,
        #[serde(default)]
        error: String,
    },
}

impl QueryResponse {
    /// Numeric sample values; empty for errors and "no data yet"
    pub fn values(&self) -> Vec<f64> {
        match self {
            QueryResponse::Success { data } => match &data.result {
                QueryResult::Vector(samples) => samples.iter().filter_map(Sample::as_f64).collect(),
                QueryResult::Scalar((_, value)) => value.parse().ok().into_iter().collect(),
            },
            QueryResponse::Error { .. } => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryData {
    #[serde(rename = "resultType")]
    pub result_type: String,
    pub result: QueryResult,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryResult {
    Vector(Vec<Sample>),
    Scalar((f64, String)),
}

/// One labelled sample of an instant vector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    #[serde(rename = "metric", default)]
    pub labels: BTreeMap<String, String>,
    #[serde(default)]
    pub value: Option<(f64, String)>,
}

impl Sample {
    pub fn as_f64(&self) -> Option<f64> {
        self.value
            .as_ref()
            .and_then(|(_, v)| v.parse::<f64>().ok())
            .filter(|v| v.is_finite())
    }
}

/// Metrics store client for the Prometheus query API
#[derive(Debug, Clone)]
pub struct PrometheusClient {
    client: Client,
    base_url: Url,
}

impl PrometheusClient {
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            client: Client::new(),
            base_url: normalize_base_url(base_url)?,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }
}

/// Parse a base URL, keeping any path prefix when joining
pub(crate) fn normalize_base_url(base_url: &str) -> Result<Url, ConfigError> {
    let mut raw = base_url.trim().to_string();
    if !raw.ends_with('/') {
        raw.push('/');
    }
    Url::parse(&raw).map_err(|e| ConfigError::InvalidUrl {
        url: base_url.to_string(),
        reason: e.to_string(),
    })
}

#[async_trait]
impl MetricsStore for PrometheusClient {
    async fn instant_query(
        &self,
        query: &str,
        timeout: Duration,
    ) -> Result<QueryResponse, ProbeFailure> {
        let url = self
            .base_url
            .join("api/v1/query")
            .map_err(|e| ProbeFailure::Transport(e.to_string()))?;

        let response = self
            .client
            .get(url)
            .query(&[("query", query)])
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| ProbeFailure::from_reqwest(e, timeout))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ProbeFailure::from_reqwest(e, timeout))?;

        match serde_json::from_str::<QueryResponse>(&body) {
            Ok(parsed) => Ok(parsed),
            // A proxy error page means the store is down, not that it answered badly
            Err(_) if !status.is_success() => {
                Err(ProbeFailure::Transport(format!("HTTP {}", status.as_u16())))
            }
            Err(e) => Err(ProbeFailure::Malformed(e.to_string())),
        }
    }
}
