//! Agent configuration

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Process-level settings; what to monitor lives in `MonitorConfig`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AgentConfig {
    /// Instance name attached to structured logs
    #[serde(default = "default_instance")]
    pub instance: String,

    /// API server port for status, reports and metrics
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    /// Seconds between background assessments
    #[serde(default = "default_interval")]
    pub interval_secs: u64,

    /// Include secondary signals in background assessments
    #[serde(default = "default_with_signals")]
    pub with_signals: bool,

    /// Optional monitor configuration file (TOML, YAML or JSON)
    #[serde(default)]
    pub config_file: Option<PathBuf>,
}

fn default_instance() -> String {
    std::env::var("HOSTNAME").unwrap_or_else(|_| "stackmon".to_string())
}

fn default_api_port() -> u16 {
    8080
}

fn default_interval() -> u64 {
    30
}

fn default_with_signals() -> bool {
    true
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            instance: default_instance(),
            api_port: default_api_port(),
            interval_secs: default_interval(),
            with_signals: default_with_signals(),
            config_file: None,
        }
    }
}

impl AgentConfig {
    /// Load from `STACKMON_AGENT_*` environment variables
    pub fn load() -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::Environment::with_prefix("STACKMON_AGENT").try_parsing(true))
            .build()
            .context("Failed to read agent environment")?;

        let config: AgentConfig = config
            .try_deserialize()
            .context("Failed to parse agent configuration")?;
        Ok(config)
    }

    pub fn interval(&self) -> Duration {
        // Zero would spin the loop
        Duration::from_secs(self.interval_secs.max(1))
    }
}
