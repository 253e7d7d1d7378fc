//! Recommendation rules
//!
//! A fixed rule table evaluated top to bottom. Rules are not mutually
//! exclusive; every match appends one recommendation. The fallback fires only
//! for EXCELLENT or GOOD assessments where nothing else matched. Output is
//! sorted by ascending priority with ties kept in rule order.

use crate::models::{
    Factor, HealthAssessment, HealthLevel, PerformanceLevel, QuickStatus, Recommendation,
};
use crate::signals::PatternFamily;

pub const FIX_INVESTIGATE_SERVICES: &str = "services.investigate";
pub const FIX_RESTART_CONTAINERS: &str = "containers.restart";
pub const FIX_INSPECT_LOGS: &str = "logs.inspect";
pub const FIX_SCALE_RESOURCES: &str = "resources.scale";
pub const FIX_CHECK_DATABASE: &str = "database.connections";
pub const FIX_ANALYZE_QUERIES: &str = "queries.analyze";
pub const FIX_TUNE_PERFORMANCE: &str = "performance.tune";

/// Cycle facts that do not affect the score but still drive advice
#[derive(Debug, Clone, Copy, Default)]
pub struct Observations<'a> {
    pub performance: PerformanceLevel,
    /// Pattern families found in recent logs
    pub log_patterns: &'a [PatternFamily],
}

impl Observations<'_> {
    fn has_pattern(&self, family: PatternFamily) -> bool {
        self.log_patterns.contains(&family)
    }
}

type Predicate = fn(&HealthAssessment, &QuickStatus, &Observations<'_>) -> bool;

struct Rule {
    text: &'static str,
    priority: u8,
    fix_id: Option<&'static str>,
    applies: Predicate,
}

const RULES: &[Rule] = &[
    Rule {
        text: "investigate unavailable services",
        priority: 1,
        fix_id: Some(FIX_INVESTIGATE_SERVICES),
        applies: |_, status, _| status.services_available < status.services_total,
    },
    Rule {
        text: "restart missing containers",
        priority: 2,
        fix_id: Some(FIX_RESTART_CONTAINERS),
        applies: |_, status, _| status.containers_running < status.containers_expected,
    },
    Rule {
        text: "escalate immediately",
        priority: 0,
        fix_id: None,
        applies: |assessment, _, _| assessment.level == HealthLevel::Critical,
    },
    Rule {
        text: "investigate errors in logs",
        priority: 3,
        fix_id: Some(FIX_INSPECT_LOGS),
        applies: |assessment, _, _| assessment.has_factor(Factor::LogErrorRate),
    },
    Rule {
        text: "relieve resource pressure",
        priority: 4,
        fix_id: Some(FIX_SCALE_RESOURCES),
        applies: |assessment, _, _| assessment.has_factor(Factor::ResourcePressure),
    },
    Rule {
        text: "check database connections",
        priority: 5,
        fix_id: Some(FIX_CHECK_DATABASE),
        applies: |_, _, seen| seen.has_pattern(PatternFamily::Database),
    },
    Rule {
        text: "analyze slow queries",
        priority: 6,
        fix_id: Some(FIX_ANALYZE_QUERIES),
        applies: |_, _, seen| seen.has_pattern(PatternFamily::Performance),
    },
    Rule {
        text: "optimize caching and database settings",
        priority: 7,
        fix_id: Some(FIX_TUNE_PERFORMANCE),
        applies: |_, _, seen| seen.performance == PerformanceLevel::Slow,
    },
];

const FALLBACK: Rule = Rule {
    text: "continue monitoring",
    priority: 9,
    fix_id: None,
    applies: |assessment, _, _| {
        matches!(assessment.level, HealthLevel::Excellent | HealthLevel::Good)
    },
};

impl Rule {
    fn to_recommendation(&self) -> Recommendation {
        Recommendation {
            priority: self.priority,
            text: self.text.to_string(),
            fix_id: self.fix_id.map(str::to_string),
        }
    }
}

/// Derive ordered recommendations from availability and score alone
pub fn recommend(assessment: &HealthAssessment, status: &QuickStatus) -> Vec<Recommendation> {
    recommend_with(assessment, status, &Observations::default())
}

/// Derive ordered recommendations, also using cycle performance and log patterns
pub fn recommend_with(
    assessment: &HealthAssessment,
    status: &QuickStatus,
    seen: &Observations<'_>,
) -> Vec<Recommendation> {
    let mut recommendations: Vec<_> = RULES
        .iter()
        .filter(|rule| (rule.applies)(assessment, status, seen))
        .map(Rule::to_recommendation)
        .collect();

    // Below GOOD at least one availability, signal or escalation rule fires
    if recommendations.is_empty() && (FALLBACK.applies)(assessment, status, seen) {
        recommendations.push(FALLBACK.to_recommendation());
    }

    recommendations.sort_by_key(|r| r.priority);
    recommendations
}
