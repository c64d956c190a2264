use chrono::{DateTime, Utc};
use serde::Serialize;

use super::config::HealthConfig;
use super::factors::{clamp_score, elapsed_days, HealthStatus, ScoreBreakdown};
use crate::snapshot::{Milestone, ProjectSnapshot, ScoreSubject};

pub const BASE_SCORE: f64 = 100.0;

pub const LABEL_INACTIVITY: &str = "Inactivity";
pub const LABEL_ETA_OVERRUN: &str = "ETA overrun";
pub const LABEL_PARALLEL_OVERLOAD: &str = "Parallel overload";
pub const LABEL_STAGNATION: &str = "Stagnation";
pub const LABEL_COMPLETION_BONUS: &str = "Completion bonus";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreResult {
    pub score: u8,
    pub status: HealthStatus,
    pub breakdown: ScoreBreakdown,
}

/// Score a project from a snapshot of its activity and milestones.
///
/// Pure: the result depends only on the arguments, so recomputing from the
/// same snapshot and `now` always yields the same score.
pub fn calculate_project_health(
    subject: &ScoreSubject,
    milestones: &[Milestone],
    config: &HealthConfig,
    now: DateTime<Utc>,
) -> ScoreResult {
    let weights = &config.weights;
    let thresholds = &config.thresholds;
    let mut score = BASE_SCORE;
    let mut breakdown = ScoreBreakdown::new(BASE_SCORE);

    // A negative grace period is treated as none
    let grace = thresholds.inactivity_days.max(0);
    let days_idle = elapsed_days(subject.last_activity(now), now);
    let stale = days_idle > grace;

    // Inactivity: linear per day past the grace period, uncapped
    if stale {
        let before = score;
        let overdue_days = days_idle.saturating_sub(grace);
        score -= overdue_days as f64 * weights.inactivity;
        breakdown.push(
            LABEL_INACTIVITY,
            format!(
                "{} days since last activity ({} past {}-day grace)",
                days_idle, overdue_days, grace
            ),
            before,
            score,
        );
    }

    // Deadline overrun: flat, applied once however late
    if let Some(eta) = subject.expected_completion_date {
        if now > eta && !subject.is_done() {
            let before = score;
            score -= weights.eta_overrun;
            breakdown.push(
                LABEL_ETA_OVERRUN,
                format!("expected completion {} has passed", eta.format("%Y-%m-%d")),
                before,
                score,
            );
        }
    }

    let active = milestones.iter().filter(|m| m.is_in_progress()).count();
    let completed = milestones.iter().filter(|m| m.is_done()).count();

    if active > thresholds.max_parallel {
        let before = score;
        let excess = active - thresholds.max_parallel;
        score -= excess as f64 * weights.parallel_overload;
        breakdown.push(
            LABEL_PARALLEL_OVERLOAD,
            format!(
                "{} milestones in progress (limit {})",
                active, thresholds.max_parallel
            ),
            before,
            score,
        );
    }

    // Stagnation stacks on top of inactivity for stale projects with open work
    if stale && active > 0 {
        let before = score;
        score -= weights.stagnation;
        breakdown.push(
            LABEL_STAGNATION,
            format!("stale for {} days with {} milestones in progress", days_idle, active),
            before,
            score,
        );
    }

    if !milestones.is_empty() {
        let completion_rate = completed as f64 / milestones.len() as f64;
        if completion_rate > thresholds.completion_ratio {
            let before = score;
            score += weights.completion_bonus;
            breakdown.push(
                LABEL_COMPLETION_BONUS,
                format!("{}/{} milestones done", completed, milestones.len()),
                before,
                score,
            );
        }
    }

    let final_score = clamp_score(score);
    ScoreResult {
        score: final_score,
        status: HealthStatus::from_score(final_score, thresholds),
        breakdown,
    }
}

/// Convenience wrapper over [`calculate_project_health`] for a full snapshot.
pub fn score_project(
    snapshot: &ProjectSnapshot,
    config: &HealthConfig,
    now: DateTime<Utc>,
) -> ScoreResult {
    calculate_project_health(&snapshot.subject, &snapshot.milestones, config, now)
}
