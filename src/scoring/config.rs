use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::error::ScoreError;

/// Penalty and bonus weights.
///
/// Per-day and per-item weights are multiplied by the number of units past
/// their threshold; flat weights apply once.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Weights {
    /// Points lost per day of inactivity past the grace period.
    pub inactivity: f64,
    /// Flat penalty when the expected completion date has passed.
    pub eta_overrun: f64,
    /// Flat penalty for a stale project that still has work in progress.
    pub stagnation: f64,
    /// Points lost per in-progress milestone above the parallel limit.
    pub parallel_overload: f64,
    /// Flat bonus for a mostly completed milestone plan.
    pub completion_bonus: f64,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            inactivity: 2.0,
            eta_overrun: 30.0,
            stagnation: 15.0,
            parallel_overload: 10.0,
            completion_bonus: 5.0,
        }
    }
}

/// Limits the engine compares signals against.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    /// Days of inactivity tolerated before penalties start.
    pub inactivity_days: i64,
    /// In-progress milestones tolerated at once.
    pub max_parallel: usize,
    /// Completed share of milestones that must be exceeded for the bonus.
    pub completion_ratio: f64,
    /// Scores below this are critical.
    pub critical_score: u8,
    /// Scores below this (and not critical) are a warning.
    pub warning_score: u8,
    /// Crossing below this score raises a health-drop alert.
    pub alert_drop_score: u8,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            inactivity_days: 7,
            max_parallel: 3,
            completion_ratio: 0.8,
            critical_score: 60,
            warning_score: 80,
            alert_drop_score: 50,
        }
    }
}

/// Financial rules for the client relationship score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClientPolicy {
    /// Days overdue at which an unpaid invoice enters the warning tier.
    pub warning_days: i64,
    pub warning_weight: f64,
    /// Days overdue at which an unpaid invoice enters the critical tier.
    pub critical_days: i64,
    pub critical_weight: f64,
    /// How far back a settled payment counts as recent.
    pub recent_payment_window: Duration,
    /// Score floor granted by a recent payment when only warnings fired.
    pub payment_override_floor: f64,
    /// Age below which an inactive client is still learning.
    pub learning_phase: Duration,
    pub learning_phase_score: f64,
}

impl Default for ClientPolicy {
    fn default() -> Self {
        Self {
            warning_days: 1,
            warning_weight: 15.0,
            critical_days: 7,
            critical_weight: 40.0,
            recent_payment_window: Duration::days(7),
            payment_override_floor: 90.0,
            learning_phase: Duration::days(30),
            learning_phase_score: 100.0,
        }
    }
}

/// Fully resolved, immutable configuration handed to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HealthConfig {
    pub weights: Weights,
    pub thresholds: Thresholds,
    pub client: ClientPolicy,
}

impl HealthConfig {
    /// Layer partial overrides on top of this configuration.
    ///
    /// Fields absent from an override keep their current value.
    pub fn with_overrides(
        &self,
        weights: Option<&WeightOverrides>,
        thresholds: Option<&ThresholdOverrides>,
    ) -> Self {
        let mut merged = *self;
        if let Some(w) = weights {
            merged.weights = w.apply(&merged.weights);
        }
        if let Some(t) = thresholds {
            merged.thresholds = t.apply(&merged.thresholds);
        }
        merged
    }

    pub fn with_client_overrides(&self, client: &ClientOverrides) -> Result<Self, ScoreError> {
        let mut merged = *self;
        merged.client = client.apply(&merged.client)?;
        Ok(merged)
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct WeightOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inactivity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eta_overrun: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stagnation: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parallel_overload: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_bonus: Option<f64>,
}

impl WeightOverrides {
    pub fn apply(&self, base: &Weights) -> Weights {
        Weights {
            inactivity: self.inactivity.unwrap_or(base.inactivity),
            eta_overrun: self.eta_overrun.unwrap_or(base.eta_overrun),
            stagnation: self.stagnation.unwrap_or(base.stagnation),
            parallel_overload: self.parallel_overload.unwrap_or(base.parallel_overload),
            completion_bonus: self.completion_bonus.unwrap_or(base.completion_bonus),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ThresholdOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inactivity_days: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_parallel: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_ratio: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub critical_score: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning_score: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alert_drop_score: Option<u8>,
}

impl ThresholdOverrides {
    pub fn apply(&self, base: &Thresholds) -> Thresholds {
        Thresholds {
            inactivity_days: self.inactivity_days.unwrap_or(base.inactivity_days),
            max_parallel: self.max_parallel.unwrap_or(base.max_parallel),
            completion_ratio: self.completion_ratio.unwrap_or(base.completion_ratio),
            critical_score: self.critical_score.unwrap_or(base.critical_score),
            warning_score: self.warning_score.unwrap_or(base.warning_score),
            alert_drop_score: self.alert_drop_score.unwrap_or(base.alert_drop_score),
        }
    }
}

/// Client policy overrides. Durations use humantime syntax ("7d", "36h").
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ClientOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning_days: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning_weight: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub critical_days: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub critical_weight: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recent_payment_window: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_override_floor: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub learning_phase: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub learning_phase_score: Option<f64>,
}

impl ClientOverrides {
    pub fn apply(&self, base: &ClientPolicy) -> Result<ClientPolicy, ScoreError> {
        let recent_payment_window = match self.recent_payment_window {
            Some(ref s) => parse_window("recent_payment_window", s)?,
            None => base.recent_payment_window,
        };
        let learning_phase = match self.learning_phase {
            Some(ref s) => parse_window("learning_phase", s)?,
            None => base.learning_phase,
        };
        Ok(ClientPolicy {
            warning_days: self.warning_days.unwrap_or(base.warning_days),
            warning_weight: self.warning_weight.unwrap_or(base.warning_weight),
            critical_days: self.critical_days.unwrap_or(base.critical_days),
            critical_weight: self.critical_weight.unwrap_or(base.critical_weight),
            recent_payment_window,
            payment_override_floor: self
                .payment_override_floor
                .unwrap_or(base.payment_override_floor),
            learning_phase,
            learning_phase_score: self.learning_phase_score.unwrap_or(base.learning_phase_score),
        })
    }
}

/// Parse a humantime duration such as "7d" into a chrono duration.
pub fn parse_window(field: &str, s: &str) -> Result<Duration, ScoreError> {
    let std_duration = humantime::parse_duration(s.trim())
        .map_err(|e| ScoreError::Config(format!("{}: invalid duration '{}' - {}", field, s, e)))?;
    Duration::from_std(std_duration)
        .map_err(|_| ScoreError::Config(format!("{}: duration '{}' is out of range", field, s)))
}

/// Scoring section of the config file.
///
/// Every field is optional and falls back to the built-in defaults.
///
/// Example YAML:
/// ```yaml
/// scoring:
///   weights:
///     inactivity: 3
///   thresholds:
///     inactivity_days: 10
///   client:
///     critical_days: 14
///     recent_payment_window: "5d"
/// ```
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ScoringConfig {
    #[serde(default)]
    pub weights: Option<WeightOverrides>,

    #[serde(default)]
    pub thresholds: Option<ThresholdOverrides>,

    #[serde(default)]
    pub client: Option<ClientOverrides>,
}

impl ScoringConfig {
    /// Resolve the overrides against the built-in defaults.
    pub fn resolve(&self) -> Result<HealthConfig, ScoreError> {
        let config =
            HealthConfig::default().with_overrides(self.weights.as_ref(), self.thresholds.as_ref());
        match self.client {
            Some(ref client) => config.with_client_overrides(client),
            None => Ok(config),
        }
    }
}
