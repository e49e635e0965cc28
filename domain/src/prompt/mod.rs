//! Prompt domain
//!
//! Templates for every model-facing prompt: stage answers, dialogue turns,
//! synthesis, moderator reasoning and benchmark runs.

mod template;

pub use template::PromptTemplate;
