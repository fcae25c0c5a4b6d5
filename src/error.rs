//! Error types for the service layer.
//!
//! The spawn sequencer itself has no error type: a target that goes stale
//! mid-sequence is an expected race and ends the spawn silently.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SpawnError {
    #[error("invalid spawn request: {0}")]
    InvalidRequest(#[source] serde_json::Error),

    #[error("failed to encode event: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("invalid scenario: {0}")]
    Scenario(String),
}

pub type Result<T> = std::result::Result<T, SpawnError>;
