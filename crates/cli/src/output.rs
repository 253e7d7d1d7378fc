//! Output formatting utilities

use clap::ValueEnum;
use colored::Colorize;
use monitor_lib::{HealthLevel, OverallStatus, StatusLabel};
use serde::Serialize;
use std::time::Duration;
use tabled::{settings::Style, Table, Tabled};

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

/// Print rows as a rounded table
pub fn print_table<T: Tabled>(rows: &[T]) {
    if rows.is_empty() {
        println!("{}", "No items found".yellow());
        return;
    }
    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{}", table);
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

/// Print an error message
pub fn print_error(message: &str) {
    println!("{} {}", "✗".red().bold(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Format a latency for tables
pub fn format_latency(latency: Option<Duration>) -> String {
    match latency {
        Some(d) if d.as_millis() >= 1000 => format!("{:.2}s", d.as_secs_f64()),
        Some(d) => format!("{}ms", d.as_millis()),
        None => "-".to_string(),
    }
}

/// Format `available/total` as a ratio
pub fn format_ratio(available: u32, total: u32) -> String {
    format!("{}/{}", available, total)
}

pub fn color_label(label: StatusLabel) -> String {
    let text = label.to_string();
    match label {
        StatusLabel::Ok => text.green().bold().to_string(),
        StatusLabel::Partial => text.yellow().bold().to_string(),
        StatusLabel::Critical => text.red().bold().to_string(),
    }
}

pub fn color_level(level: HealthLevel) -> String {
    let text = level.to_string();
    match level {
        HealthLevel::Excellent | HealthLevel::Good => text.green().to_string(),
        HealthLevel::Degraded => text.yellow().to_string(),
        HealthLevel::Critical => text.red().to_string(),
    }
}

pub fn color_overall(status: OverallStatus) -> String {
    let text = status.to_string();
    match status {
        OverallStatus::Normal => text.green().bold().to_string(),
        OverallStatus::Warning => text.yellow().bold().to_string(),
        OverallStatus::Critical => text.red().bold().to_string(),
    }
}

/// Color a score using the default level bands
pub fn color_score(score: u8) -> String {
    let formatted = score.to_string();
    if score >= 90 {
        formatted.green().to_string()
    } else if score >= 70 {
        formatted.cyan().to_string()
    } else if score >= 40 {
        formatted.yellow().to_string()
    } else {
        formatted.red().to_string()
    }
}

pub fn color_reachable(reachable: bool) -> String {
    if reachable {
        "up".green().to_string()
    } else {
        "down".red().to_string()
    }
}
