//! Where health data comes from: an in-process engine or a remote agent

use crate::client::ApiClient;
use anyhow::{Context, Result};
use monitor_lib::{HealthAssessment, HealthReport, MonitorConfig, MonitorEngine, QuickStatus, Target};
use std::path::Path;
use tracing::debug;

pub enum Source {
    Local(Box<MonitorEngine>),
    Remote(ApiClient),
}

impl Source {
    /// Query the agent when `api_url` is set, otherwise probe in-process
    pub fn open(api_url: Option<&str>, config_path: Option<&Path>) -> Result<Self> {
        match api_url {
            Some(url) => {
                debug!(api_url = %url, "Using remote agent");
                Ok(Source::Remote(ApiClient::new(url)?))
            }
            None => {
                let config = MonitorConfig::load(config_path)?;
                debug!(targets = config.targets.len(), "Probing in-process");
                let engine = MonitorEngine::builder(config)
                    .instance("stackmon-cli")
                    .build()
                    .context("Failed to build monitor engine")?;
                Ok(Source::Local(Box::new(engine)))
            }
        }
    }

    pub async fn quick_status(&self) -> Result<QuickStatus> {
        match self {
            Source::Local(engine) => Ok(engine.quick_status().await),
            Source::Remote(client) => client.quick_status().await,
        }
    }

    pub async fn assessment(&self, signals: bool) -> Result<HealthAssessment> {
        match self {
            Source::Local(engine) => Ok(engine.assess(signals).await),
            Source::Remote(client) => client.assessment(signals).await,
        }
    }

    pub async fn report(&self, signals: bool) -> Result<HealthReport> {
        match self {
            Source::Local(engine) => Ok(engine.report(signals).await),
            Source::Remote(client) => client.report(signals).await,
        }
    }

    pub async fn targets(&self) -> Result<Vec<Target>> {
        match self {
            Source::Local(engine) => Ok(engine.config().targets.clone()),
            Source::Remote(client) => client.targets().await,
        }
    }
}
