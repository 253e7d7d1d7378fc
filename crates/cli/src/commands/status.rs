//! Quick status and target listing

use anyhow::Result;
use monitor_lib::{StatusLabel, Target};
use tabled::Tabled;

use crate::output::{
    color_label, format_ratio, print_error, print_info, print_json, print_success, print_table,
    print_warning, OutputFormat,
};
use crate::source::Source;

/// Row for targets table
#[derive(Tabled)]
struct TargetRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Address")]
    address: String,
    #[tabled(rename = "Timeout")]
    timeout: String,
    #[tabled(rename = "Critical")]
    critical: String,
    #[tabled(rename = "Expected")]
    expected: String,
}

impl From<&Target> for TargetRow {
    fn from(target: &Target) -> Self {
        Self {
            name: target.name.clone(),
            kind: target.kind.to_string(),
            address: target.address.clone(),
            timeout: format!("{}ms", target.timeout_ms),
            critical: if target.critical { "yes" } else { "no" }.to_string(),
            expected: target
                .expected
                .map(|e| e.to_string())
                .unwrap_or_else(|| "-".to_string()),
        }
    }
}

/// Show the quick status snapshot
pub async fn show_status(source: &Source, format: OutputFormat) -> Result<()> {
    let status = source.quick_status().await?;

    if format == OutputFormat::Json {
        return print_json(&status);
    }

    println!("Status: {}", color_label(status.label));
    println!(
        "Services:   {}",
        format_ratio(status.services_available, status.services_total)
    );
    println!(
        "Containers: {}",
        format_ratio(status.containers_running, status.containers_expected)
    );
    println!("Elapsed:    {}ms", status.elapsed.as_millis());
    println!();

    if !status.expectation_configured {
        print_warning("Container expectation not configured; container count not scored");
    }
    match status.label {
        StatusLabel::Ok => print_success("All services and containers are up"),
        StatusLabel::Partial => print_warning("Some services or containers are down"),
        StatusLabel::Critical => print_error("Most services are unavailable"),
    }

    Ok(())
}

/// List configured targets
pub async fn list_targets(source: &Source, format: OutputFormat) -> Result<()> {
    let targets = source.targets().await?;

    if format == OutputFormat::Json {
        return print_json(&targets);
    }

    let rows: Vec<TargetRow> = targets.iter().map(TargetRow::from).collect();
    print_table(&rows);
    print_info(&format!("{} targets configured", targets.len()));
    Ok(())
}
