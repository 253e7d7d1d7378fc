//! Pattern-based log analysis

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Family of problems a log pattern points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternFamily {
    Database,
    Performance,
    Security,
    Application,
}

impl fmt::Display for PatternFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternFamily::Database => write!(f, "database"),
            PatternFamily::Performance => write!(f, "performance"),
            PatternFamily::Security => write!(f, "security"),
            PatternFamily::Application => write!(f, "application"),
        }
    }
}

/// Built-in patterns, matched case-insensitively
pub const DEFAULT_PATTERNS: &[(PatternFamily, &[&str])] = &[
    (
        PatternFamily::Database,
        &[r"connection.*failed", r"timeout", r"deadlock"],
    ),
    (
        PatternFamily::Performance,
        &[r"high.*response", r"slow", r"timeout"],
    ),
    (
        PatternFamily::Security,
        &[r"unauthorized", r"forbidden", r"invalid.*token"],
    ),
    (
        PatternFamily::Application,
        &[r"exception", r"error", r"failed"],
    ),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AlertLevel {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelCounts {
    pub info: usize,
    pub warning: usize,
    pub error: usize,
}

/// Result of analysing one window of log lines
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogAnalysis {
    pub total_entries: usize,
    pub levels: LevelCounts,
    /// In `DEFAULT_PATTERNS` order, each family at most once
    pub detected_patterns: Vec<PatternFamily>,
    pub alert_level: AlertLevel,
}

impl LogAnalysis {
    /// Fraction of error lines; `None` when there was nothing to analyse
    pub fn error_rate(&self) -> Option<f64> {
        if self.total_entries == 0 {
            None
        } else {
            Some(self.levels.error as f64 / self.total_entries as f64)
        }
    }

    pub fn summary(&self) -> &'static str {
        if self.total_entries == 0 {
            return "No logs available for analysis";
        }
        match self.alert_level {
            AlertLevel::Error => "Critical errors detected",
            AlertLevel::Warning => "Warnings present",
            AlertLevel::Info => "All systems operating normally",
        }
    }
}

pub struct LogAnalyzer {
    families: Vec<(PatternFamily, Regex)>,
    info: Regex,
    warning: Regex,
    error: Regex,
}

impl LogAnalyzer {
    /// Compile one case-insensitive alternation per family
    pub fn with_patterns(patterns: &[(PatternFamily, &[&str])]) -> Result<Self, regex::Error> {
        let families = patterns
            .iter()
            .map(|(family, alternatives)| {
                let joined = alternatives.join("|");
                Regex::new(&format!("(?i){joined}")).map(|re| (*family, re))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            families,
            info: Regex::new(r"\bINFO\b")?,
            warning: Regex::new(r"\bWARN(ING)?\b")?,
            error: Regex::new(r"\b(ERROR|FATAL|CRITICAL)\b")?,
        })
    }

    pub fn analyze<S: AsRef<str>>(&self, lines: &[S]) -> LogAnalysis {
        let lines: Vec<&str> = lines
            .iter()
            .map(|l| l.as_ref())
            .filter(|l| !l.trim().is_empty())
            .collect();

        let mut levels = LevelCounts::default();
        for line in &lines {
            if self.error.is_match(line) {
                levels.error += 1;
            } else if self.warning.is_match(line) {
                levels.warning += 1;
            } else if self.info.is_match(line) {
                levels.info += 1;
            }
        }

        let detected_patterns = self
            .families
            .iter()
            .filter(|(_, re)| lines.iter().any(|line| re.is_match(line)))
            .map(|(family, _)| *family)
            .collect();

        let alert_level = if levels.error > 0 {
            AlertLevel::Error
        } else if levels.warning > 0 {
            AlertLevel::Warning
        } else {
            AlertLevel::Info
        };

        LogAnalysis {
            total_entries: lines.len(),
            levels,
            detected_patterns,
            alert_level,
        }
    }
}

impl Default for LogAnalyzer {
    fn default() -> Self {
        Self::with_patterns(DEFAULT_PATTERNS).expect("built-in log patterns are valid")
    }
}

impl fmt::Debug for LogAnalyzer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogAnalyzer")
            .field("families", &self.families.len())
            .finish()
    }
}
