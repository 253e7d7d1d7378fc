//! Container runtime queries through the docker CLI

use super::{async_trait, ContainerEntry, ContainerRuntime};
use crate::error::ProbeFailure;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

const PS_FORMAT: &str = "{{.Names}}\t{{.Status}}";

/// Container runtime backed by `docker ps`
#[derive(Debug, Clone)]
pub struct DockerCli {
    binary: String,
}

impl Default for DockerCli {
    fn default() -> Self {
        Self {
            binary: "docker".to_string(),
        }
    }
}

impl DockerCli {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different executable, e.g. `podman`
    pub fn with_binary(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// `a|b|c` becomes one `--filter name=` per alternative; docker ORs them
    fn ps_args(name_filter: &str) -> Vec<String> {
        let mut args = vec!["ps".to_string()];
        for name in name_filter.split('|').map(str::trim).filter(|n| !n.is_empty()) {
            args.push("--filter".to_string());
            args.push(format!("name={name}"));
        }
        args.push("--format".to_string());
        args.push(PS_FORMAT.to_string());
        args
    }
}

#[async_trait]
impl ContainerRuntime for DockerCli {
    async fn list(
        &self,
        name_filter: &str,
        timeout: Duration,
    ) -> Result<Vec<ContainerEntry>, ProbeFailure> {
        let args = Self::ps_args(name_filter);
        debug!(binary = %self.binary, ?args, "Querying container runtime");

        let output = Command::new(&self.binary)
            .args(&args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output();

        let output = tokio::time::timeout(timeout, output)
            .await
            .map_err(|_| ProbeFailure::Timeout(timeout))?
            .map_err(|e| ProbeFailure::Transport(format!("failed to run {}: {e}", self.binary)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ProbeFailure::Transport(format!(
                "{} ps exited with {}: {}",
                self.binary,
                output.status,
                stderr.trim()
            )));
        }

        Ok(parse_ps_output(&String::from_utf8_lossy(&output.stdout)))
    }
}

/// Parse `name<TAB>status` lines; blank lines are skipped
pub fn parse_ps_output(stdout: &str) -> Vec<ContainerEntry> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| match line.split_once('\t') {
            Some((name, status)) => ContainerEntry::new(name.trim(), status.trim()),
            // `docker ps` only lists running containers by default
            None => ContainerEntry::new(line, "running"),
        })
        .collect()
}
