//! Domain error types

use crate::routing::tier::Tier;
use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    /// Every tier in the fallback chain was exhausted.
    #[error("No available model for tier {requested} (tried: {tried})")]
    NoAvailableModel { requested: Tier, tried: String },

    #[error("Invalid question: {0}")]
    InvalidQuestion(String),

    #[error("Invalid model selection: {0}")]
    InvalidSelection(String),

    #[error("Operation cancelled")]
    Cancelled,
}

impl DomainError {
    /// Build a [`DomainError::NoAvailableModel`] from the tiers that were tried.
    pub fn no_available_model(requested: Tier, tried: &[Tier]) -> Self {
        let tried = tried
            .iter()
            .map(|t| t.as_str())
            .collect::<Vec<_>>()
            .join(" -> ");
        DomainError::NoAvailableModel { requested, tried }
    }

    /// Check if this error represents a cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, DomainError::Cancelled)
    }
}
