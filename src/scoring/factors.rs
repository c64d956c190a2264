use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

use super::config::Thresholds;

const SECONDS_PER_DAY: i64 = 86_400;

/// Whole days from `earlier` to `later`, floored.
///
/// Negative when `earlier` is in the future.
pub fn elapsed_days(earlier: DateTime<Utc>, later: DateTime<Utc>) -> i64 {
    (later - earlier).num_seconds().div_euclid(SECONDS_PER_DAY)
}

/// Clamp a running score into 0..=100 and round it. Non-finite scores are 0.
pub fn clamp_score(score: f64) -> u8 {
    if !score.is_finite() {
        return 0;
    }
    score.clamp(0.0, 100.0).round() as u8
}

/// One step of the score computation, kept for observability.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FactorContribution {
    pub label: String,       // e.g. "Inactivity", "Overdue invoice"
    pub description: String, // e.g. "10 days since last activity (3 past grace)"
    pub before: f64,
    pub after: f64,
}

impl FactorContribution {
    pub fn delta(&self) -> f64 {
        self.after - self.before
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub base_score: f64,
    pub factors: Vec<FactorContribution>,
}

impl ScoreBreakdown {
    pub fn new(base_score: f64) -> Self {
        Self {
            base_score,
            factors: Vec::new(),
        }
    }

    /// Record a factor that moved the score from `before` to `after`.
    pub fn push(&mut self, label: &str, description: String, before: f64, after: f64) {
        self.factors.push(FactorContribution {
            label: label.to_string(),
            description,
            before,
            after,
        });
    }

    pub fn has(&self, label: &str) -> bool {
        self.factors.iter().any(|f| f.label == label)
    }
}

/// Badge derived from a final score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Healthy,
    Warning,
    Critical,
}

impl HealthStatus {
    pub fn from_score(score: u8, thresholds: &Thresholds) -> Self {
        if score < thresholds.critical_score {
            HealthStatus::Critical
        } else if score < thresholds.warning_score {
            HealthStatus::Warning
        } else {
            HealthStatus::Healthy
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            HealthStatus::Healthy => "healthy",
            HealthStatus::Warning => "warning",
            HealthStatus::Critical => "critical",
        };
        f.write_str(s)
    }
}

/// Severity bucket of an overdue invoice. Ordered by severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PenaltyTier {
    Warning,
    Critical,
}

impl fmt::Display for PenaltyTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PenaltyTier::Warning => f.write_str("warning"),
            PenaltyTier::Critical => f.write_str("critical"),
        }
    }
}
