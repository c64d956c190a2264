use thiserror::Error;

/// Errors raised at the library boundary.
///
/// The scoring functions themselves are total and never return these; they
/// surface when snapshots are parsed, overrides are resolved or a store fails.
#[derive(Debug, Error)]
pub enum ScoreError {
    #[error("invalid {what} snapshot: {source}")]
    InvalidInput {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid scoring configuration: {0}")]
    Config(String),

    #[error("store error: {0}")]
    Store(String),

    #[error("unsupported workspace file version: {0}")]
    UnsupportedVersion(u32),
}

impl ScoreError {
    pub fn invalid_input(what: &'static str, source: serde_json::Error) -> Self {
        ScoreError::InvalidInput { what, source }
    }

    /// Whether the caller handed over data the engine cannot score.
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, ScoreError::InvalidInput { .. })
    }
}
