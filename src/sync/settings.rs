use serde::{Deserialize, Serialize};

use crate::scoring::validation::check_weights;
use crate::scoring::{HealthConfig, ThresholdOverrides, WeightOverrides};

fn default_true() -> bool {
    true
}

/// Per-workspace health settings, as stored next to the workspace profile.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct WorkspaceSettings {
    /// Partial weight overrides; missing weights fall back to the base config.
    #[serde(default)]
    pub health_weights: Option<WeightOverrides>,

    /// Inactivity grace period in days. Zero or negative means unset.
    #[serde(default)]
    pub stale_alert_days: Option<i64>,

    #[serde(default = "default_true")]
    pub notify_on_health_drop: bool,
}

impl Default for WorkspaceSettings {
    fn default() -> Self {
        Self {
            health_weights: None,
            stale_alert_days: None,
            notify_on_health_drop: true,
        }
    }
}

impl WorkspaceSettings {
    /// Layer these settings over `base`.
    pub fn apply(&self, base: &HealthConfig) -> HealthConfig {
        let thresholds = ThresholdOverrides {
            inactivity_days: self.stale_alert_days.filter(|days| *days > 0),
            ..Default::default()
        };
        base.with_overrides(self.health_weights.as_ref(), Some(&thresholds))
    }
}

/// Check stored settings with the same weight rules as the config file.
pub fn validate_settings(settings: &WorkspaceSettings) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();
    if let Some(ref weights) = settings.health_weights {
        check_weights(&mut errors, "settings.health_weights", weights);
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Whether a settings update changes any input of the score and so needs
/// every project of the workspace to be recomputed.
pub fn settings_require_resync(old: &WorkspaceSettings, new: &WorkspaceSettings) -> bool {
    old.stale_alert_days != new.stale_alert_days || old.health_weights != new.health_weights
}
