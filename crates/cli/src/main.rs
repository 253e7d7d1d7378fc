//! stackmon CLI
//!
//! Probes the monitored stack in-process, or queries a running
//! stackmon agent when an API URL is given.

mod client;
mod commands;
mod output;
mod source;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{report, status};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Health aggregation and scoring for a monitored stack
#[derive(Parser)]
#[command(name = "stackmon")]
#[command(author, version, about = "Health checks and scoring for a monitored stack", long_about = None)]
pub struct Cli {
    /// Agent API URL; probes in-process when unset
    #[arg(long, env = "STACKMON_API_URL")]
    pub api_url: Option<String>,

    /// Path to a monitor config file (TOML, YAML or JSON)
    #[arg(long, short, env = "STACKMON_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long, short, default_value = "table")]
    pub format: output::OutputFormat,

    /// Enable verbose output
    #[arg(long, short)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the quick service and container status
    Status,

    /// Score the stack health
    Assess {
        /// Include log error rate and resource pressure
        #[arg(long)]
        signals: bool,
    },

    /// Build a full report with probes and recommendations
    Report {
        /// Include log error rate and resource pressure
        #[arg(long)]
        signals: bool,
    },

    /// Show prioritized recommendations
    Recommendations {
        /// Include log error rate and resource pressure
        #[arg(long)]
        signals: bool,
    },

    /// List configured targets
    Targets,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let source = source::Source::open(cli.api_url.as_deref(), cli.config.as_deref())?;

    match cli.command {
        Commands::Status => status::show_status(&source, cli.format).await?,
        Commands::Assess { signals } => {
            report::show_assessment(&source, signals, cli.format).await?
        }
        Commands::Report { signals } => report::show_report(&source, signals, cli.format).await?,
        Commands::Recommendations { signals } => {
            report::show_recommendations(&source, signals, cli.format).await?
        }
        Commands::Targets => status::list_targets(&source, cli.format).await?,
    }

    Ok(())
}
