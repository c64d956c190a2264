pub mod client;
pub mod config;
pub mod engine;
pub mod factors;
pub mod summary;
pub mod validation;

pub use client::{calculate_client_health, score_client, ClientPhase, ClientScoreResult};
pub use config::*;
pub use engine::{calculate_project_health, score_project, ScoreResult};
pub use factors::{FactorContribution, HealthStatus, PenaltyTier, ScoreBreakdown};
pub use summary::average_health;
pub use validation::validate_scoring;
