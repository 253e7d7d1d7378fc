//! Probe collection from heterogeneous targets
//!
//! This module runs bounded-time checks against HTTP endpoints, container
//! groups and metric-store queries. Every collaborator sits behind a trait so
//! the collector can be driven by fakes in tests.

mod batch;
mod docker;
mod http;
mod prometheus;

#[cfg(test)]
mod tests;

pub use batch::{effective_timeout, ProbeCollector};
pub(crate) use batch::deadline_budget;
pub use docker::{parse_ps_output, DockerCli};
pub use http::ReqwestHttpProber;
pub use prometheus::{PrometheusClient, QueryData, QueryResponse, QueryResult, Sample};
pub(crate) use prometheus::normalize_base_url;

use crate::error::ProbeFailure;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub use async_trait::async_trait;

/// Trait for issuing HTTP health requests
#[async_trait]
pub trait HttpProber: Send + Sync {
    /// GET `url` and return the response status code
    async fn get_status(&self, url: &str, timeout: Duration) -> Result<u16, ProbeFailure>;
}

/// Trait for querying the container runtime
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// List containers whose name matches `name_filter`
    async fn list(
        &self,
        name_filter: &str,
        timeout: Duration,
    ) -> Result<Vec<ContainerEntry>, ProbeFailure>;
}

/// Trait for querying the metrics store
#[async_trait]
pub trait MetricsStore: Send + Sync {
    /// Run an instant query
    async fn instant_query(
        &self,
        query: &str,
        timeout: Duration,
    ) -> Result<QueryResponse, ProbeFailure>;
}

/// One container as reported by the runtime
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerEntry {
    pub name: String,
    pub status: String,
}

impl ContainerEntry {
    pub fn new(name: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: status.into(),
        }
    }

    /// Docker reports "Up 3 hours (healthy)", other runtimes "running"
    pub fn is_running(&self) -> bool {
        let status = self.status.trim().to_ascii_lowercase();
        status.starts_with("up") || status == "running"
    }
}
