//! stackmon agent - periodic health assessment of a service stack
//!
//! Runs the assessment loop in the background and serves status, reports
//! and Prometheus metrics over HTTP.

use anyhow::{Context, Result};
use monitor_lib::{MonitorConfig, MonitorEngine, StructuredLogger};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod api;
mod config;
mod runner;

#[cfg(test)]
mod testing;

const AGENT_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting stackmon-agent");

    let agent_config = config::AgentConfig::load()?;
    let monitor_config = MonitorConfig::load(agent_config.config_file.as_deref())
        .context("Invalid monitor configuration")?;
    info!(
        instance = %agent_config.instance,
        targets = monitor_config.targets.len(),
        deadline_ms = monitor_config.deadline_ms,
        "Agent configured"
    );

    let engine = MonitorEngine::builder(monitor_config)
        .instance(&agent_config.instance)
        .build()
        .context("Failed to build monitor engine")?;
    let engine = Arc::new(engine);

    let logger = StructuredLogger::new(&agent_config.instance);
    logger.log_startup(
        AGENT_VERSION,
        engine.config().targets.len(),
        agent_config.interval(),
    );

    let latest = runner::LatestReport::default();
    let app_state = Arc::new(api::AppState::new(engine.clone(), latest.clone()));

    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let assessment_loop = runner::AssessmentLoop::new(
        engine,
        latest,
        agent_config.interval(),
        agent_config.with_signals,
    );
    let loop_handle = tokio::spawn(assessment_loop.run(shutdown_rx));

    let api_port = agent_config.api_port;
    let api_handle = tokio::spawn(async move {
        if let Err(e) = api::serve(api_port, app_state).await {
            error!(error = %e, "API server failed");
        }
    });

    tokio::signal::ctrl_c().await?;
    logger.log_shutdown("SIGINT received");

    let _ = shutdown_tx.send(());
    if let Err(e) = loop_handle.await {
        error!(error = %e, "Assessment loop panicked");
    }
    api_handle.abort();

    info!("Shutdown complete");
    Ok(())
}
