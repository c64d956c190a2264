use chrono::{DateTime, Utc};
use serde::Serialize;

use super::config::HealthConfig;
use super::engine::{BASE_SCORE, LABEL_INACTIVITY};
use super::factors::{clamp_score, elapsed_days, HealthStatus, PenaltyTier, ScoreBreakdown};
use crate::snapshot::{Client, ClientActivity, ClientSnapshot, PaymentEvent};

pub const LABEL_OVERDUE_WARNING: &str = "Overdue invoice (warning)";
pub const LABEL_OVERDUE_CRITICAL: &str = "Overdue invoice (critical)";
pub const LABEL_LEARNING_PHASE: &str = "Learning phase";
pub const LABEL_PAYMENT_OVERRIDE: &str = "Recent payment";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientPhase {
    /// New client with nothing recorded yet; penalties are not evaluated.
    Learning,
    Scored,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientScoreResult {
    pub score: u8,
    pub status: HealthStatus,
    pub phase: ClientPhase,
    /// Most severe overdue tier that fired, if any.
    pub worst_tier: Option<PenaltyTier>,
    pub override_applied: bool,
    pub breakdown: ScoreBreakdown,
}

/// Score a client relationship from engagement and invoice signals.
///
/// Additive penalties are computed first. The recent-payment floor is a
/// separate final step keyed on which tiers fired: a warning is forgiven by
/// a recent payment, a critical lateness is not.
pub fn calculate_client_health(
    client: &Client,
    activity: &ClientActivity,
    config: &HealthConfig,
    now: DateTime<Utc>,
) -> ClientScoreResult {
    let policy = &config.client;
    let thresholds = &config.thresholds;
    let mut breakdown = ScoreBreakdown::new(BASE_SCORE);

    let age = now - client.created_at;
    if activity.is_empty() && age < policy.learning_phase {
        let score = clamp_score(policy.learning_phase_score);
        breakdown.push(
            LABEL_LEARNING_PHASE,
            format!("client for {} days with no activity yet", age.num_days()),
            BASE_SCORE,
            policy.learning_phase_score,
        );
        return ClientScoreResult {
            score,
            status: HealthStatus::from_score(score, thresholds),
            phase: ClientPhase::Learning,
            worst_tier: None,
            override_applied: false,
            breakdown,
        };
    }

    let mut score = BASE_SCORE;

    let last_seen = [client.last_sign_in_at, activity.latest_interaction()]
        .into_iter()
        .flatten()
        .max()
        .unwrap_or(now);
    let days_idle = elapsed_days(last_seen, now);
    let grace = thresholds.inactivity_days.max(0);
    if days_idle > grace {
        let before = score;
        let overdue_days = days_idle.saturating_sub(grace);
        score -= overdue_days as f64 * config.weights.inactivity;
        breakdown.push(
            LABEL_INACTIVITY,
            format!(
                "{} days since last sign-in or interaction ({} past {}-day grace)",
                days_idle, overdue_days, grace
            ),
            before,
            score,
        );
    }

    let mut worst_tier: Option<PenaltyTier> = None;
    for invoice in activity.invoices.iter().filter(|i| i.is_unpaid()) {
        let Some(due) = invoice.due_date else {
            continue;
        };
        let days_overdue = elapsed_days(due, now);
        let tier = if days_overdue >= policy.critical_days {
            PenaltyTier::Critical
        } else if days_overdue >= policy.warning_days {
            PenaltyTier::Warning
        } else {
            continue;
        };

        let before = score;
        let label = match tier {
            PenaltyTier::Warning => {
                score -= policy.warning_weight;
                LABEL_OVERDUE_WARNING
            }
            PenaltyTier::Critical => {
                score -= policy.critical_weight;
                LABEL_OVERDUE_CRITICAL
            }
        };
        breakdown.push(
            label,
            format!("invoice {} is {} days overdue", invoice.id, days_overdue),
            before,
            score,
        );
        worst_tier = worst_tier.max(Some(tier));
    }

    score = score.clamp(0.0, 100.0);

    let mut override_applied = false;
    if worst_tier == Some(PenaltyTier::Warning) {
        if let Some(payment) = recent_payment(activity, config, now) {
            if score < policy.payment_override_floor {
                let before = score;
                score = policy.payment_override_floor;
                override_applied = true;
                breakdown.push(
                    LABEL_PAYMENT_OVERRIDE,
                    format!(
                        "payment {} on {} forgives warning-tier lateness",
                        payment.id,
                        payment.updated_at.format("%Y-%m-%d")
                    ),
                    before,
                    score,
                );
            }
        }
    }

    let final_score = clamp_score(score);
    ClientScoreResult {
        score: final_score,
        status: HealthStatus::from_score(final_score, thresholds),
        phase: ClientPhase::Scored,
        worst_tier,
        override_applied,
        breakdown,
    }
}

/// Most recent settled payment inside the trailing window.
fn recent_payment<'a>(
    activity: &'a ClientActivity,
    config: &HealthConfig,
    now: DateTime<Utc>,
) -> Option<&'a PaymentEvent> {
    // A window reaching past the representable range covers every past payment
    let window_start = now.checked_sub_signed(config.client.recent_payment_window);
    activity
        .recent_payments
        .iter()
        .filter(|p| p.is_settled() && p.updated_at <= now)
        .filter(|p| window_start.map_or(true, |start| p.updated_at >= start))
        .max_by_key(|p| p.updated_at)
}

pub fn score_client(
    snapshot: &ClientSnapshot,
    config: &HealthConfig,
    now: DateTime<Utc>,
) -> ClientScoreResult {
    calculate_client_health(&snapshot.client, &snapshot.activity, config, now)
}
