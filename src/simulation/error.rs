//! Error types for space operations.

use thiserror::Error;

use crate::simulation::states::BodyId;

/// Errors that can occur when mutating or (de)serializing a space.
#[derive(Debug, Error)]
pub enum SpaceError {
    /// The body is not in the space's live sequence.
    #[error("body not found: {0}")]
    BodyNotFound(BodyId),

    /// A snapshot or scenario failed validation; the space was left untouched.
    #[error("invalid snapshot: {0}")]
    InvalidSnapshot(String),

    /// Run parameters of a scenario are unusable.
    #[error("invalid scenario: {0}")]
    InvalidScenario(String),

    #[error("snapshot JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("scenario YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl SpaceError {
    /// Create an invalid snapshot error.
    pub fn invalid_snapshot(msg: impl Into<String>) -> Self {
        Self::InvalidSnapshot(msg.into())
    }
}
