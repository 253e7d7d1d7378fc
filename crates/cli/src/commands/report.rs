//! Assessment and full report commands

use anyhow::Result;
use chrono::Utc;
use monitor_lib::{HealthReport, ProbeResult, Recommendation};
use tabled::Tabled;

use crate::output::{
    color_label, color_level, color_overall, color_reachable, color_score, format_latency,
    format_ratio, print_info, print_json, print_table, print_warning, OutputFormat,
};
use crate::source::Source;

/// Row for probe results table
#[derive(Tabled)]
struct ProbeRow {
    #[tabled(rename = "Target")]
    target: String,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "Latency")]
    latency: String,
    #[tabled(rename = "Count")]
    count: String,
    #[tabled(rename = "Error")]
    error: String,
}

impl From<&ProbeResult> for ProbeRow {
    fn from(result: &ProbeResult) -> Self {
        let error = match (&result.error, &result.detail) {
            (Some(kind), Some(detail)) => format!("{kind}: {detail}"),
            (Some(kind), None) => kind.to_string(),
            _ => String::new(),
        };
        Self {
            target: result.target_name.clone(),
            kind: result.kind.to_string(),
            state: color_reachable(result.reachable),
            latency: format_latency(result.latency),
            count: result
                .count
                .map(|c| c.to_string())
                .unwrap_or_else(|| "-".to_string()),
            error,
        }
    }
}

/// Row for recommendations table
#[derive(Tabled)]
struct RecommendationRow {
    #[tabled(rename = "Priority")]
    priority: u8,
    #[tabled(rename = "Recommendation")]
    text: String,
    #[tabled(rename = "Fix")]
    fix_id: String,
}

impl From<&Recommendation> for RecommendationRow {
    fn from(recommendation: &Recommendation) -> Self {
        Self {
            priority: recommendation.priority,
            text: recommendation.text.clone(),
            fix_id: recommendation.fix_id.clone().unwrap_or_default(),
        }
    }
}

/// Show the health assessment
pub async fn show_assessment(source: &Source, signals: bool, format: OutputFormat) -> Result<()> {
    let assessment = source.assessment(signals).await?;

    if format == OutputFormat::Json {
        return print_json(&assessment);
    }

    println!(
        "Score: {} ({})",
        color_score(assessment.score),
        color_level(assessment.level)
    );
    for factor in &assessment.contributing_factors {
        println!("  -{:<3} {}", factor.impact, factor.factor_name);
    }
    if assessment.confidence == monitor_lib::Confidence::Degraded {
        print_warning("Confidence degraded: container expectation not configured");
    }
    Ok(())
}

/// Show the full report with probes and recommendations
pub async fn show_report(source: &Source, signals: bool, format: OutputFormat) -> Result<()> {
    let report = source.report(signals).await?;

    if format == OutputFormat::Json {
        return print_json(&report);
    }

    print_report(&report);
    Ok(())
}

/// Show only the recommendations of a fresh report
pub async fn show_recommendations(
    source: &Source,
    signals: bool,
    format: OutputFormat,
) -> Result<()> {
    let report = source.report(signals).await?;

    if format == OutputFormat::Json {
        return print_json(&report.recommendations);
    }

    let rows: Vec<RecommendationRow> = report
        .recommendations
        .iter()
        .map(RecommendationRow::from)
        .collect();
    print_table(&rows);
    Ok(())
}

fn print_report(report: &HealthReport) {
    let status = &report.quick_status;

    let age = Utc::now().signed_duration_since(report.generated_at);
    println!(
        "{} at {} ({}s ago)",
        color_overall(report.overall_status()),
        report.generated_at.format("%Y-%m-%d %H:%M:%S UTC"),
        age.num_seconds().max(0)
    );
    println!(
        "Status: {}  Score: {} ({})  Services: {}  Containers: {}",
        color_label(status.label),
        color_score(report.assessment.score),
        color_level(report.assessment.level),
        format_ratio(status.services_available, status.services_total),
        format_ratio(status.containers_running, status.containers_expected),
    );
    println!();

    let probes: Vec<ProbeRow> = report.probes.results.iter().map(ProbeRow::from).collect();
    print_table(&probes);
    println!();

    if let Some(signals) = &report.signals {
        let rate = signals
            .log_error_rate
            .map(|r| format!("{:.1}%", r * 100.0))
            .unwrap_or_else(|| "unavailable".to_string());
        let pressure = signals
            .resource_pressure
            .map(|p| format!("{:.0}%", p * 100.0))
            .unwrap_or_else(|| "unavailable".to_string());
        print_info(&format!("Log error rate: {rate}  Resource pressure: {pressure}"));
    }
    let logs = report
        .logs
        .as_ref()
        .map(|l| format!("{} ({} entries)", l.summary(), l.total_entries))
        .unwrap_or_else(|| "not collected".to_string());
    print_info(&format!("Performance: {}  Logs: {logs}", report.performance));
    for issue in &report.config_issues {
        print_warning(issue);
    }

    let recommendations: Vec<RecommendationRow> = report
        .recommendations
        .iter()
        .map(RecommendationRow::from)
        .collect();
    print_table(&recommendations);
}
