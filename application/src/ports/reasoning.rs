//! Iterative reasoning port
//!
//! Used only by the moderator. Each call produces one thought given the
//! task prompt and the thoughts so far, plus a flag telling whether the
//! reasoner has nothing further to add.

use async_trait::async_trait;
use parley_domain::Model;
use thiserror::Error;

/// Errors from the reasoning capability
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReasoningError {
    /// The capability is not configured or cannot be reached
    #[error("Reasoning unavailable: {0}")]
    Unavailable(String),

    #[error("Reasoning failed: {0}")]
    Failed(String),
}

/// One reasoning iteration.
#[derive(Debug, Clone, PartialEq)]
pub struct ReasoningStep {
    pub thought: String,
    /// No further thought is needed
    pub done: bool,
}

impl ReasoningStep {
    pub fn thought(thought: impl Into<String>) -> Self {
        Self {
            thought: thought.into(),
            done: false,
        }
    }

    pub fn last(thought: impl Into<String>) -> Self {
        Self {
            thought: thought.into(),
            done: true,
        }
    }
}

#[async_trait]
pub trait ReasoningEngine: Send + Sync {
    async fn next_step(
        &self,
        prompt: &str,
        prior_steps: &[String],
    ) -> Result<ReasoningStep, ReasoningError>;

    /// Model answering the reasoning calls, if the engine is model-backed.
    fn backing_model(&self) -> Option<&Model> {
        None
    }
}

/// Reasoner used when none is configured.
pub struct UnavailableReasoning;

#[async_trait]
impl ReasoningEngine for UnavailableReasoning {
    async fn next_step(
        &self,
        _prompt: &str,
        _prior_steps: &[String],
    ) -> Result<ReasoningStep, ReasoningError> {
        Err(ReasoningError::Unavailable(
            "no reasoning engine configured".to_string(),
        ))
    }
}
