pub mod config;
pub mod error;
pub mod output;
pub mod scoring;
pub mod snapshot;
pub mod store;
pub mod sync;

pub use error::ScoreError;
