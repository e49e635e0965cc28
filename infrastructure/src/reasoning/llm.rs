//! Iterative reasoning on top of a regular model.
//!
//! Each step is one model call: the task prompt, the observations so far,
//! and an instruction to add exactly one more. The model signals it is
//! finished by emitting [`PromptTemplate::ANALYSIS_DONE_MARKER`].

use async_trait::async_trait;
use parley_application::ports::model_invoker::{InvocationError, InvocationRequest, ModelInvoker};
use parley_application::ports::reasoning::{ReasoningEngine, ReasoningError, ReasoningStep};
use parley_domain::{Model, PromptTemplate};
use std::sync::Arc;
use tracing::debug;

pub struct LlmReasoningEngine {
    invoker: Arc<dyn ModelInvoker>,
    model: Model,
    max_tokens: Option<u32>,
    temperature: Option<f32>,
}

impl LlmReasoningEngine {
    pub fn new(invoker: Arc<dyn ModelInvoker>, model: Model) -> Self {
        Self {
            invoker,
            model,
            max_tokens: Some(256),
            temperature: Some(0.2),
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

    pub fn model(&self) -> &Model {
        &self.model
    }
}

#[async_trait]
impl ReasoningEngine for LlmReasoningEngine {
    async fn next_step(
        &self,
        prompt: &str,
        prior_steps: &[String],
    ) -> Result<ReasoningStep, ReasoningError> {
        let request = InvocationRequest::new(PromptTemplate::reasoning_step_prompt(
            prompt,
            prior_steps,
        ))
        .with_max_tokens(self.max_tokens)
        .with_temperature(self.temperature);

        let completion = self
            .invoker
            .invoke(&self.model, &request)
            .await
            .map_err(|e| match e {
                InvocationError::ModelUnavailable(msg) => ReasoningError::Unavailable(msg),
                other => ReasoningError::Failed(other.to_string()),
            })?;

        let text = completion.text.trim();
        let step = match text.find(PromptTemplate::ANALYSIS_DONE_MARKER) {
            Some(idx) => {
                let mut thought = text[..idx].to_string();
                thought.push_str(&text[idx + PromptTemplate::ANALYSIS_DONE_MARKER.len()..]);
                ReasoningStep::last(thought.trim())
            }
            None => ReasoningStep::thought(text),
        };
        debug!(
            "Reasoning step via {} ({} prior, done={})",
            self.model,
            prior_steps.len(),
            step.done
        );
        Ok(step)
    }

    fn backing_model(&self) -> Option<&Model> {
        Some(&self.model)
    }
}
