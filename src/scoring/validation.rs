use chrono::Duration;

use super::config::{parse_window, ClientPolicy, ScoringConfig, Thresholds, WeightOverrides};

/// Longest accepted duration window (100 years).
const MAX_WINDOW_DAYS: i64 = 36_525;

fn check_weight(errors: &mut Vec<String>, field: &str, value: Option<f64>) {
    if let Some(v) = value {
        if !v.is_finite() {
            errors.push(format!("{}: must be a finite number", field));
        } else if v < 0.0 {
            errors.push(format!("{}: must be non-negative", field));
        }
    }
}

/// Check every weight of a partial override, reporting fields under `prefix`.
pub(crate) fn check_weights(errors: &mut Vec<String>, prefix: &str, weights: &WeightOverrides) {
    for (field, value) in [
        ("inactivity", weights.inactivity),
        ("eta_overrun", weights.eta_overrun),
        ("stagnation", weights.stagnation),
        ("parallel_overload", weights.parallel_overload),
        ("completion_bonus", weights.completion_bonus),
    ] {
        check_weight(errors, &format!("{}.{}", prefix, field), value);
    }
}

fn check_window(errors: &mut Vec<String>, field: &str, value: Option<&String>) {
    let Some(s) = value else {
        return;
    };
    match parse_window(field, s) {
        Ok(window) if window > Duration::days(MAX_WINDOW_DAYS) => {
            errors.push(format!("{}: must be at most 100 years", field));
        }
        Ok(_) => {}
        Err(e) => errors.push(e.to_string()),
    }
}

fn check_score(errors: &mut Vec<String>, field: &str, value: Option<f64>) {
    if let Some(v) = value {
        if !v.is_finite() || !(0.0..=100.0).contains(&v) {
            errors.push(format!("{}: must be between 0 and 100", field));
        }
    }
}

/// Validate scoring configuration at startup.
/// Returns all validation errors at once (not just the first).
pub fn validate_scoring(config: &ScoringConfig) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    if let Some(ref w) = config.weights {
        check_weights(&mut errors, "scoring.weights", w);
    }

    if let Some(ref t) = config.thresholds {
        let defaults = Thresholds::default();
        if let Some(days) = t.inactivity_days {
            if days < 0 {
                errors.push("scoring.thresholds.inactivity_days: must be non-negative".to_string());
            }
        }
        if let Some(ratio) = t.completion_ratio {
            if !ratio.is_finite() || !(0.0..=1.0).contains(&ratio) {
                errors.push("scoring.thresholds.completion_ratio: must be between 0 and 1".to_string());
            }
        }
        for (field, value) in [
            ("critical_score", t.critical_score),
            ("warning_score", t.warning_score),
            ("alert_drop_score", t.alert_drop_score),
        ] {
            if let Some(v) = value {
                if v > 100 {
                    errors.push(format!("scoring.thresholds.{}: must be at most 100", field));
                }
            }
        }
        let critical = t.critical_score.unwrap_or(defaults.critical_score);
        let warning = t.warning_score.unwrap_or(defaults.warning_score);
        if critical > warning {
            errors.push(format!(
                "scoring.thresholds: critical_score ({}) must not exceed warning_score ({})",
                critical, warning
            ));
        }
    }

    if let Some(ref c) = config.client {
        let defaults = ClientPolicy::default();
        check_weight(&mut errors, "scoring.client.warning_weight", c.warning_weight);
        check_weight(&mut errors, "scoring.client.critical_weight", c.critical_weight);
        check_score(&mut errors, "scoring.client.payment_override_floor", c.payment_override_floor);
        check_score(&mut errors, "scoring.client.learning_phase_score", c.learning_phase_score);

        let warning_days = c.warning_days.unwrap_or(defaults.warning_days);
        let critical_days = c.critical_days.unwrap_or(defaults.critical_days);
        if warning_days < 0 {
            errors.push("scoring.client.warning_days: must be non-negative".to_string());
        }
        if warning_days >= critical_days {
            errors.push(format!(
                "scoring.client: warning_days ({}) must be less than critical_days ({})",
                warning_days, critical_days
            ));
        }

        check_window(
            &mut errors,
            "scoring.client.recent_payment_window",
            c.recent_payment_window.as_ref(),
        );
        check_window(&mut errors, "scoring.client.learning_phase", c.learning_phase.as_ref());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
