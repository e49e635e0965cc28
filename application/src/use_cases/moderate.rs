//! Moderator use case
//!
//! Optional post-hoc analysis of a finished dialogue. Runs an iterative
//! reasoning loop that yields one tagged observation per iteration, bounded
//! by a hard iteration cap. Reasoning failures never propagate: they become
//! [`ModeratorOutcome::Unavailable`] and a warning in the log.

use crate::ports::conversation_logger::{
    ConversationEvent, ConversationLogger, NoConversationLogger,
};
use crate::ports::progress::{NoProgress, Phase, ProgressNotifier};
use crate::ports::reasoning::ReasoningEngine;
use parley_domain::{
    DialogueState, Model, ModelSelection, ModeratorAnalysis, ModeratorOutcome, PromptTemplate,
    Question,
};
use serde_json::json;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Default hard cap on reasoning iterations.
pub const DEFAULT_MAX_ITERATIONS: usize = 30;

pub struct Moderator {
    reasoning: Arc<dyn ReasoningEngine>,
    max_iterations: usize,
    selection: Option<ModelSelection>,
    logger: Arc<dyn ConversationLogger>,
}

impl Moderator {
    pub fn new(reasoning: Arc<dyn ReasoningEngine>) -> Self {
        Self {
            reasoning,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            selection: None,
            logger: Arc::new(NoConversationLogger),
        }
    }

    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max.max(1);
        self
    }

    /// Attribute the analysis to the catalogued model behind the reasoner.
    pub fn with_selection(mut self, selection: ModelSelection) -> Self {
        self.selection = Some(selection);
        self
    }

    pub fn with_conversation_logger(mut self, logger: Arc<dyn ConversationLogger>) -> Self {
        self.logger = logger;
        self
    }

    pub async fn analyze(&self, state: &DialogueState, question: &Question) -> ModeratorOutcome {
        self.analyze_with_progress(state, question, &NoProgress, &CancellationToken::new())
            .await
    }

    /// Analyze a dialogue that has reached DONE.
    pub async fn analyze_with_progress(
        &self,
        state: &DialogueState,
        question: &Question,
        progress: &dyn ProgressNotifier,
        cancel: &CancellationToken,
    ) -> ModeratorOutcome {
        if !state.is_done() {
            warn!("Moderator called on an unfinished dialogue");
            return ModeratorOutcome::Unavailable {
                reason: "dialogue has not finished".to_string(),
            };
        }

        info!("Moderator: analyzing {} turns", state.turns().len());
        progress.on_phase_start(Phase::Moderator, self.max_iterations);

        let prompt =
            PromptTemplate::moderator_prompt(state.kind(), question.content(), &state.transcript());
        let moderator_model = self
            .selection
            .as_ref()
            .map(|s| s.model().clone())
            .unwrap_or_else(|| Model::new("moderator"));

        let mut thoughts: Vec<String> = Vec::new();
        let mut iterations = 0;
        let mut finished = false;

        while iterations < self.max_iterations {
            if cancel.is_cancelled() {
                return self.unavailable("cancelled", progress);
            }
            iterations += 1;

            let step = match self.reasoning.next_step(&prompt, &thoughts).await {
                Ok(step) => step,
                Err(e) => {
                    warn!("Moderator reasoning failed at iteration {}: {}", iterations, e);
                    return self.unavailable(&e.to_string(), progress);
                }
            };

            let thought = step.thought.trim();
            if !thought.is_empty() && thought != PromptTemplate::ANALYSIS_DONE_MARKER {
                debug!("Moderator step {}: {}", iterations, thought);
                thoughts.push(thought.to_string());
            }
            progress.on_task_complete(Phase::Moderator, &moderator_model, true);

            if step.done {
                finished = true;
                break;
            }
        }

        if !finished {
            warn!(
                "Moderator stopped at the {}-iteration safety cap",
                self.max_iterations
            );
        }

        let mut analysis = ModeratorAnalysis::from_thoughts(thoughts, !finished);
        analysis.reasoning_steps = iterations;
        analysis.moderator = self.selection.clone();

        info!(
            "Moderator finished in {} steps (verdict: {})",
            iterations,
            analysis
                .verdict
                .as_ref()
                .map(|v| v.winner.as_str())
                .unwrap_or("none")
        );
        progress.on_phase_complete(Phase::Moderator);
        self.logger.log(ConversationEvent::new(
            "moderator_completed",
            json!({
                "model": moderator_model.as_str(),
                "steps": analysis.reasoning_steps,
                "hit_iteration_cap": analysis.hit_iteration_cap,
                "transcript": analysis.reasoning_transcript,
            }),
        ));

        ModeratorOutcome::Produced { analysis }
    }

    fn unavailable(&self, reason: &str, progress: &dyn ProgressNotifier) -> ModeratorOutcome {
        progress.on_phase_complete(Phase::Moderator);
        self.logger.log(ConversationEvent::new(
            "moderator_completed",
            json!({ "unavailable": reason }),
        ));
        ModeratorOutcome::Unavailable {
            reason: reason.to_string(),
        }
    }
}
