//! Configuration errors

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),

    #[error("backend.timeout_seconds cannot be 0")]
    ZeroTimeout,

    #[error("model name cannot be empty (models entry #{0})")]
    EmptyModelName(usize),

    #[error("duplicate model name: {0}")]
    DuplicateModel(String),

    #[error("tier thresholds must increase: balanced {balanced} >= powerful {powerful}")]
    InvertedThresholds { balanced: f64, powerful: f64 },

    #[error("model {model}: {message}")]
    InvalidModel { model: String, message: String },

    #[error("moderator model '{0}' is not in the model list")]
    UnknownModerator(String),

    #[error("orchestration.{field} must be at least 1")]
    ZeroLimit { field: &'static str },
}
