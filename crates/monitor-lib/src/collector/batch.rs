//! Concurrent probe batch with a single global deadline
//!
//! Every target is probed in its own tokio task. The collector waits for the
//! batch until the global deadline, then abandons whatever is still in flight
//! and reports those targets as timed out.

use super::{ContainerRuntime, HttpProber, MetricsStore, QueryResponse};
use crate::error::ProbeFailure;
use crate::models::{ProbeBatch, ProbeErrorKind, ProbeResult, Target, TargetKind};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio::time::{timeout, timeout_at, Instant};
use tracing::{debug, warn};

/// Upper bound on the gap kept between per-target timeouts and the deadline
const MAX_DEADLINE_MARGIN: Duration = Duration::from_millis(50);

/// Per-target timeout, always strictly below a non-zero global deadline
pub fn effective_timeout(target: &Target, deadline: Duration) -> Duration {
    target.timeout().min(deadline_budget(deadline))
}

/// Longest a single call may take and still finish before `deadline`
pub(crate) fn deadline_budget(deadline: Duration) -> Duration {
    let margin = MAX_DEADLINE_MARGIN.min(deadline / 10);
    deadline.saturating_sub(margin)
}

/// Issues all configured probes concurrently
#[derive(Clone)]
pub struct ProbeCollector {
    http: Arc<dyn HttpProber>,
    runtime: Arc<dyn ContainerRuntime>,
    store: Arc<dyn MetricsStore>,
}

impl ProbeCollector {
    pub fn new(
        http: Arc<dyn HttpProber>,
        runtime: Arc<dyn ContainerRuntime>,
        store: Arc<dyn MetricsStore>,
    ) -> Self {
        Self {
            http,
            runtime,
            store,
        }
    }

    /// Probe every target and return one result per target, in target order
    ///
    /// Never fails and never waits past `deadline`.
    pub async fn collect(&self, targets: &[Target], deadline: Duration) -> ProbeBatch {
        let start = Instant::now();
        let deadline_at = start + deadline;

        let mut tasks = JoinSet::new();
        for (index, target) in targets.iter().enumerate() {
            let collector = self.clone();
            let target = target.clone();
            let limit = effective_timeout(&target, deadline);
            tasks.spawn(async move { (index, collector.probe(&target, limit).await) });
        }

        let mut slots: Vec<Option<ProbeResult>> = vec![None; targets.len()];
        let mut deadline_reached = false;

        loop {
            match timeout_at(deadline_at, tasks.join_next()).await {
                Ok(Some(Ok((index, result)))) => slots[index] = Some(result),
                Ok(Some(Err(e))) => {
                    warn!(error = %e, "Probe task failed");
                }
                Ok(None) => break,
                Err(_) => {
                    deadline_reached = true;
                    warn!(
                        pending = tasks.len(),
                        deadline_ms = deadline.as_millis() as u64,
                        "Global probe deadline reached, abandoning in-flight probes"
                    );
                    break;
                }
            }
        }

        // In-flight probes are cancelled, their results are never awaited
        tasks.abort_all();

        let results = targets
            .iter()
            .zip(slots)
            .map(|(target, slot)| {
                slot.unwrap_or_else(|| {
                    if deadline_reached {
                        ProbeResult::unreachable(
                            target,
                            ProbeErrorKind::Timeout,
                            format!(
                                "abandoned at global deadline of {}ms",
                                deadline.as_millis()
                            ),
                        )
                    } else {
                        ProbeResult::unreachable(
                            target,
                            ProbeErrorKind::Transport,
                            "probe task aborted",
                        )
                    }
                })
            })
            .collect();

        ProbeBatch {
            results,
            elapsed: start.elapsed(),
        }
    }

    async fn probe(&self, target: &Target, limit: Duration) -> ProbeResult {
        let started = Instant::now();

        // Collaborators get the timeout too, but are not trusted to honour it
        let outcome = match timeout(limit, self.dispatch(target, limit)).await {
            Ok(outcome) => outcome,
            Err(_) => Err(ProbeFailure::Timeout(limit)),
        };
        let latency = started.elapsed();

        match outcome {
            Ok(Some(count)) => ProbeResult::reachable(target, latency).with_count(count),
            Ok(None) => ProbeResult::reachable(target, latency),
            Err(failure) => {
                debug!(
                    target_name = %target.name,
                    kind = %target.kind,
                    error = %failure,
                    "Probe failed"
                );
                ProbeResult::unreachable(target, failure.kind(), failure.to_string())
            }
        }
    }

    /// Returns the running-container count for container groups
    async fn dispatch(&self, target: &Target, limit: Duration) -> Result<Option<u32>, ProbeFailure> {
        match target.kind {
            TargetKind::HttpEndpoint => {
                let status = self.http.get_status(&target.address, limit).await?;
                if (200..300).contains(&status) {
                    Ok(None)
                } else {
                    Err(ProbeFailure::Transport(format!("HTTP {status}")))
                }
            }
            TargetKind::ContainerGroup => {
                let entries = self.runtime.list(&target.address, limit).await?;
                let running = entries.iter().filter(|e| e.is_running()).count();
                Ok(Some(running as u32))
            }
            TargetKind::MetricQuery => {
                match self.store.instant_query(&target.address, limit).await? {
                    // An empty result means "no data yet", not "store down"
                    QueryResponse::Success { .. } => Ok(None),
                    QueryResponse::Error { error_type, error } => Err(ProbeFailure::Malformed(
                        format!("query rejected ({error_type}): {error}"),
                    )),
                }
            }
        }
    }
}
