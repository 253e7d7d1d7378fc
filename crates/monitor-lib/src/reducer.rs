//! Reduction of a probe batch into a quick status snapshot
//!
//! The reducer is a pure function: identical batches always produce identical
//! snapshots. Container counts are clamped to the configured expectation so
//! `containers_running <= containers_expected` always holds; the raw count is
//! kept in `containers_observed`.

use crate::models::{ProbeBatch, QuickStatus, StatusLabel, TargetKind};

/// Reduce probe results into a `QuickStatus`
///
/// `containers_expected` comes from configuration and is never inferred from
/// the batch. `None` is reduced as zero expected containers and flagged via
/// `expectation_configured = false`.
pub fn reduce(batch: &ProbeBatch, containers_expected: Option<u32>) -> QuickStatus {
    let mut services_available = 0u32;
    let mut services_total = 0u32;
    let mut containers_observed = 0u32;

    for result in &batch.results {
        match result.kind {
            TargetKind::HttpEndpoint | TargetKind::MetricQuery => {
                if !result.critical {
                    continue;
                }
                services_total += 1;
                if result.reachable {
                    services_available += 1;
                }
            }
            TargetKind::ContainerGroup => {
                containers_observed = containers_observed.saturating_add(result.count.unwrap_or(0));
            }
        }
    }

    let expected = containers_expected.unwrap_or(0);
    let running = containers_observed.min(expected);

    QuickStatus {
        services_available,
        services_total,
        containers_running: running,
        containers_expected: expected,
        containers_observed,
        expectation_configured: containers_expected.is_some(),
        elapsed: batch.elapsed,
        label: classify(services_available, services_total, running, expected),
    }
}

/// Label assignment; the rule order is significant
pub fn classify(available: u32, total: u32, running: u32, expected: u32) -> StatusLabel {
    if available == total && running == expected {
        StatusLabel::Ok
    } else if available < total / 2 {
        StatusLabel::Critical
    } else {
        StatusLabel::Partial
    }
}
