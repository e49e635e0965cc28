//! Reasoning engine adapters for the moderator pass.

mod llm;

pub use llm::LlmReasoningEngine;
