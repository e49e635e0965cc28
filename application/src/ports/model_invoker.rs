//! Model invocation port
//!
//! Defines the single capability every orchestration path depends on:
//! send one prompt to one model and get `{text, usage}` back. Transport,
//! process lifecycle and response-shape normalization belong to adapters
//! in the infrastructure layer.

use async_trait::async_trait;
use parley_domain::{Model, TokenUsage};
use thiserror::Error;

/// Errors that can occur while invoking a model
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InvocationError {
    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Timed out after {0}s")]
    Timeout(u64),

    #[error("Model not available: {0}")]
    ModelUnavailable(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Other error: {0}")]
    Other(String),
}

/// One prompt plus its generation limits.
#[derive(Debug, Clone, PartialEq)]
pub struct InvocationRequest {
    pub prompt: String,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

impl InvocationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            max_tokens: None,
            temperature: None,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }
}

/// Normalized model output.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Completion {
    pub text: String,
    pub usage: TokenUsage,
}

impl Completion {
    pub fn new(text: impl Into<String>, usage: TokenUsage) -> Self {
        Self {
            text: text.into(),
            usage,
        }
    }
}

/// Capability to run one prompt against one model.
///
/// Implementations must enforce their own per-invocation timeout and report
/// it as [`InvocationError::Timeout`]; callers treat it like any other
/// failure.
#[async_trait]
pub trait ModelInvoker: Send + Sync {
    async fn invoke(
        &self,
        model: &Model,
        request: &InvocationRequest,
    ) -> Result<Completion, InvocationError>;
}
