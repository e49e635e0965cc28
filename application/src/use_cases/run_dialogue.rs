//! Dialogue engine use case
//!
//! Drives a [`DialogueState`] through `INIT → TURN(n) → TERMINATE →
//! SYNTHESIZE → DONE`. Turns are strictly sequential: each prompt carries the
//! full prior transcript. A failed invocation still appends a turn with
//! placeholder text; only a round in which every participant failed aborts
//! the dialogue.

use crate::ports::conversation_logger::{
    ConversationEvent, ConversationLogger, NoConversationLogger,
};
use crate::ports::model_invoker::{InvocationRequest, ModelInvoker};
use crate::ports::progress::{NoProgress, Phase, ProgressNotifier};
use crate::use_cases::shared::{check_cancelled, invoke_timed};
use parley_domain::{
    ConvergencePolicy, DialogueKind, DialogueState, DomainError, JaccardConvergence,
    ModelSelection, PromptTemplate, Question, Synthesis, TerminationReason, Turn, TurnRole,
};
use serde_json::json;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Input for one dialogue run
#[derive(Debug, Clone)]
pub struct DialogueInput {
    pub question: Question,
    pub kind: DialogueKind,
    /// Speakers in round-robin order
    pub participants: Vec<ModelSelection>,
    pub max_turns: usize,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

impl DialogueInput {
    pub fn new(
        question: Question,
        kind: DialogueKind,
        participants: Vec<ModelSelection>,
        max_turns: usize,
    ) -> Self {
        Self {
            question,
            kind,
            participants,
            max_turns,
            max_tokens: None,
            temperature: None,
        }
    }

    pub fn with_limits(mut self, max_tokens: Option<u32>, temperature: Option<f32>) -> Self {
        self.max_tokens = max_tokens;
        self.temperature = temperature;
        self
    }

    fn request(&self, prompt: String) -> InvocationRequest {
        InvocationRequest::new(prompt)
            .with_max_tokens(self.max_tokens)
            .with_temperature(self.temperature)
    }
}

/// Runs Consensus and Debate dialogues against an injected invoker
pub struct DialogueEngine<I: ModelInvoker + ?Sized + 'static> {
    invoker: Arc<I>,
    convergence: Arc<dyn ConvergencePolicy>,
    logger: Arc<dyn ConversationLogger>,
}

impl<I: ModelInvoker + ?Sized + 'static> DialogueEngine<I> {
    pub fn new(invoker: Arc<I>) -> Self {
        Self {
            invoker,
            convergence: Arc::new(JaccardConvergence::default()),
            logger: Arc::new(NoConversationLogger),
        }
    }

    pub fn with_convergence(mut self, policy: Arc<dyn ConvergencePolicy>) -> Self {
        self.convergence = policy;
        self
    }

    pub fn with_conversation_logger(mut self, logger: Arc<dyn ConversationLogger>) -> Self {
        self.logger = logger;
        self
    }

    /// Run with no progress reporting and no cancellation
    pub async fn run(&self, input: DialogueInput) -> Result<DialogueState, DomainError> {
        self.run_with_progress(input, &NoProgress, &CancellationToken::new())
            .await
    }

    /// Run the dialogue to DONE.
    ///
    /// Errors only for an invalid participant set or cancellation; model
    /// failures are recorded in the returned state.
    pub async fn run_with_progress(
        &self,
        input: DialogueInput,
        progress: &dyn ProgressNotifier,
        cancel: &CancellationToken,
    ) -> Result<DialogueState, DomainError> {
        let mut state = DialogueState::new(
            input.kind,
            input.participants.clone(),
            input.max_turns,
        )?;

        info!(
            "Starting {} with {} participants (max {} turns, convergence: {})",
            input.kind,
            input.participants.len(),
            input.max_turns,
            self.convergence.name()
        );
        progress.on_phase_start(Phase::Dialogue, input.max_turns);

        self.take_turns(&input, &mut state, progress, cancel).await?;

        let reason = state
            .termination()
            .unwrap_or(TerminationReason::MaxTurnsReached);
        info!(
            "Dialogue terminated after {} turns: {}",
            state.turns().len(),
            reason
        );
        progress.on_dialogue_terminated(reason);
        progress.on_phase_complete(Phase::Dialogue);
        self.logger.log(ConversationEvent::new(
            "dialogue_terminated",
            json!({
                "kind": input.kind.as_str(),
                "reason": reason.as_str(),
                "turns": state.turns().len(),
                "failed_turns": state.failed_turns().count(),
            }),
        ));

        check_cancelled(cancel)?;
        let synthesis = self.synthesize(&input, &state, progress).await;
        state.finalize(synthesis)?;
        Ok(state)
    }

    /// TURN(n) loop. Leaves the state terminated.
    async fn take_turns(
        &self,
        input: &DialogueInput,
        state: &mut DialogueState,
        progress: &dyn ProgressNotifier,
        cancel: &CancellationToken,
    ) -> Result<(), DomainError> {
        while !state.is_full() {
            check_cancelled(cancel)?;

            let speaker = state.next_speaker().clone();
            let role = TurnRole::for_selection(speaker.role()).ok_or_else(|| {
                DomainError::InvalidSelection(format!(
                    "{} cannot take part in a dialogue",
                    speaker
                ))
            })?;
            let sequence = state.next_sequence();
            let round = state.next_round();
            let prompt = PromptTemplate::turn_prompt(
                input.question.content(),
                role,
                &state.transcript(),
                round,
            );

            debug!("Turn {} (round {}): {} as {}", sequence, round, speaker.model(), role);
            let request = input.request(prompt.clone());
            let (result, latency_ms) =
                invoke_timed(self.invoker.as_ref(), speaker.model(), &request).await;

            let turn = match result {
                Ok(completion) => Turn::success(
                    sequence,
                    round,
                    speaker.model().clone(),
                    role,
                    prompt,
                    completion.text,
                    completion.usage,
                    latency_ms,
                ),
                Err(e) => {
                    warn!("Turn {} by {} failed: {}", sequence, speaker.model(), e);
                    Turn::failure(
                        sequence,
                        round,
                        speaker.model().clone(),
                        role,
                        prompt,
                        e.to_string(),
                        latency_ms,
                    )
                }
            };

            progress.on_task_complete(Phase::Dialogue, speaker.model(), turn.success);
            progress.on_turn(&turn, input.max_turns);
            self.logger.log(ConversationEvent::new(
                "dialogue_turn",
                json!({
                    "sequence": turn.sequence,
                    "round": turn.round,
                    "model": turn.speaker.as_str(),
                    "role": turn.role.as_str(),
                    "success": turn.success,
                    "latency_ms": turn.latency_ms,
                    "response": turn.response,
                    "error": turn.error,
                }),
            ));
            state.append_turn(turn)?;

            if state.round_complete() {
                let round = state.completed_rounds();
                if state.round_turns(round).all(|t| !t.success) {
                    warn!("Every participant failed in round {}; aborting dialogue", round);
                    return state.terminate(TerminationReason::ErrorAbort);
                }
                if input.kind == DialogueKind::Consensus && self.convergence.has_converged(state) {
                    info!("Consensus detected after round {}", round);
                    return state.terminate(TerminationReason::ConsensusDetected);
                }
            }
        }

        state.terminate(TerminationReason::MaxTurnsReached)
    }

    /// SYNTHESIZE: one of the participants consolidates the transcript.
    ///
    /// Never fails: if the synthesizer errors, the text is assembled from
    /// the last successful turn (or a placeholder when there is none).
    async fn synthesize(
        &self,
        input: &DialogueInput,
        state: &DialogueState,
        progress: &dyn ProgressNotifier,
    ) -> Synthesis {
        let synthesizer = synthesizer_for(state).clone();
        progress.on_phase_start(Phase::Synthesis, 1);

        let prompt = PromptTemplate::synthesis_prompt(
            input.kind,
            input.question.content(),
            &state.transcript(),
        );
        let request = input.request(prompt);
        let (result, latency_ms) =
            invoke_timed(self.invoker.as_ref(), synthesizer.model(), &request).await;

        let synthesis = match result {
            Ok(completion) if !completion.text.trim().is_empty() => Synthesis {
                model: synthesizer.model().clone(),
                text: completion.text,
                usage: completion.usage,
                latency_ms,
                success: true,
                error: None,
            },
            Ok(completion) => local_synthesis(
                state,
                &synthesizer,
                completion.usage,
                latency_ms,
                "synthesizer returned empty text".to_string(),
            ),
            Err(e) => {
                warn!("Synthesis by {} failed: {}", synthesizer.model(), e);
                local_synthesis(state, &synthesizer, Default::default(), latency_ms, e.to_string())
            }
        };

        progress.on_task_complete(Phase::Synthesis, synthesizer.model(), synthesis.success);
        progress.on_phase_complete(Phase::Synthesis);
        synthesis
    }
}

/// The participant with the most recent successful turn, else the first one.
fn synthesizer_for(state: &DialogueState) -> &ModelSelection {
    let participants = state.participants();
    state
        .turns()
        .iter()
        .rev()
        .find(|t| t.success)
        .and_then(|t| participants.iter().find(|p| p.model() == &t.speaker))
        .unwrap_or(&participants[0])
}

fn local_synthesis(
    state: &DialogueState,
    synthesizer: &ModelSelection,
    usage: parley_domain::TokenUsage,
    latency_ms: u64,
    error: String,
) -> Synthesis {
    let text = state
        .turns()
        .iter()
        .rev()
        .find(|t| t.success && !t.response.trim().is_empty())
        .map(|t| t.response.clone())
        .unwrap_or_else(|| {
            format!(
                "[no synthesis: all {} turns failed; last error: {}]",
                state.turns().len(),
                error
            )
        });
    Synthesis {
        model: synthesizer.model().clone(),
        text,
        usage,
        latency_ms,
        success: false,
        error: Some(error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::model_invoker::{Completion, InvocationError};
    use async_trait::async_trait;
    use parley_domain::{
        AgreementMarker, Model, NeverConverge, SelectionRole, Tier, TokenUsage,
    };
    use std::collections::HashSet;
    use std::sync::Mutex;

    // ==================== Test Mocks ====================

    /// Echoes a fixed reply per model; models in `failing` always error.
    struct ScriptedInvoker {
        reply: String,
        failing: HashSet<String>,
        prompts: Mutex<Vec<(String, String)>>,
    }

    impl ScriptedInvoker {
        fn new(reply: &str) -> Self {
            Self {
                reply: reply.to_string(),
                failing: HashSet::new(),
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn failing(mut self, models: &[&str]) -> Self {
            self.failing = models.iter().map(|m| m.to_string()).collect();
            self
        }

        fn prompts(&self) -> Vec<(String, String)> {
            self.prompts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ModelInvoker for ScriptedInvoker {
        async fn invoke(
            &self,
            model: &Model,
            request: &InvocationRequest,
        ) -> Result<Completion, InvocationError> {
            self.prompts
                .lock()
                .unwrap()
                .push((model.to_string(), request.prompt.clone()));
            if self.failing.contains(model.as_str()) {
                return Err(InvocationError::RequestFailed("backend down".to_string()));
            }
            Ok(Completion::new(
                format!("{} says {}", model, self.reply),
                TokenUsage::new(10, 5),
            ))
        }
    }

    fn debaters() -> Vec<ModelSelection> {
        vec![
            ModelSelection::new(Model::new("alpha"), Tier::Powerful, SelectionRole::ParticipantPro),
            ModelSelection::new(Model::new("beta"), Tier::Balanced, SelectionRole::ParticipantCon),
        ]
    }

    fn consensus_group() -> Vec<ModelSelection> {
        ["a", "b", "c"]
            .iter()
            .map(|m| {
                ModelSelection::new(
                    Model::new(*m),
                    Tier::Balanced,
                    SelectionRole::ParticipantConsensus,
                )
            })
            .collect()
    }

    fn question() -> Question {
        Question::new("Should we rewrite it in Rust?").unwrap()
    }

    #[tokio::test]
    async fn test_debate_runs_to_max_turns_and_synthesizes() {
        let invoker = Arc::new(ScriptedInvoker::new("something"));
        let engine = DialogueEngine::new(invoker.clone());

        let state = engine
            .run(DialogueInput::new(question(), DialogueKind::Debate, debaters(), 4))
            .await
            .unwrap();

        assert!(state.is_done());
        assert_eq!(state.turns().len(), 4);
        assert_eq!(state.termination(), Some(TerminationReason::MaxTurnsReached));
        let speakers: Vec<&str> = state.turns().iter().map(|t| t.speaker.as_str()).collect();
        assert_eq!(speakers, vec!["alpha", "beta", "alpha", "beta"]);
        assert_eq!(state.turns()[1].role, TurnRole::ArgueAgainst);

        let synthesis = state.synthesis().unwrap();
        assert!(synthesis.success);
        // Last successful speaker synthesizes
        assert_eq!(synthesis.model, Model::new("beta"));
        // 4 turns + 1 synthesis
        assert_eq!(invoker.prompts().len(), 5);
    }

    #[tokio::test]
    async fn test_turn_prompts_carry_prior_transcript() {
        let invoker = Arc::new(ScriptedInvoker::new("hello"));
        let engine = DialogueEngine::new(invoker.clone());

        engine
            .run(DialogueInput::new(question(), DialogueKind::Debate, debaters(), 2))
            .await
            .unwrap();

        let prompts = invoker.prompts();
        assert!(prompts[0].1.contains("opening statement"));
        assert!(prompts[1].1.contains("alpha says hello"));
    }

    #[tokio::test]
    async fn test_debate_with_every_turn_failing_still_has_text() {
        let invoker = Arc::new(ScriptedInvoker::new("x").failing(&["alpha", "beta"]));
        let engine = DialogueEngine::new(invoker);

        let state = engine
            .run(DialogueInput::new(question(), DialogueKind::Debate, debaters(), 6))
            .await
            .unwrap();

        // First round fails completely
        assert_eq!(state.termination(), Some(TerminationReason::ErrorAbort));
        assert_eq!(state.turns().len(), 2);
        assert!(state.turns().iter().all(|t| !t.success));
        assert!(state.turns()[0].response.contains("no response"));

        let synthesis = state.synthesis().unwrap();
        assert!(!synthesis.success);
        assert!(!synthesis.text.trim().is_empty());
        assert_eq!(synthesis.model, Model::new("alpha"));
    }

    #[tokio::test]
    async fn test_single_failing_participant_does_not_abort() {
        let invoker = Arc::new(ScriptedInvoker::new("point").failing(&["beta"]));
        let engine = DialogueEngine::new(invoker);

        let state = engine
            .run(DialogueInput::new(question(), DialogueKind::Debate, debaters(), 4))
            .await
            .unwrap();

        assert_eq!(state.termination(), Some(TerminationReason::MaxTurnsReached));
        assert_eq!(state.turns().len(), 4);
        assert_eq!(state.failed_turns().count(), 2);
        assert!(state.synthesis().unwrap().success);
    }

    #[tokio::test]
    async fn test_consensus_reaches_max_turns_without_convergence() {
        let invoker = Arc::new(ScriptedInvoker::new("agree"));
        let engine = DialogueEngine::new(invoker.clone()).with_convergence(Arc::new(NeverConverge));

        let state = engine
            .run(DialogueInput::new(
                question(),
                DialogueKind::Consensus,
                consensus_group(),
                6,
            ))
            .await
            .unwrap();

        assert_eq!(state.termination(), Some(TerminationReason::MaxTurnsReached));
        assert_eq!(state.turns().len(), 6);
        assert!(!state.synthesis().unwrap().text.is_empty());

        let prompts = invoker.prompts();
        let synthesis_prompt = &prompts.last().unwrap().1;
        assert!(synthesis_prompt.contains("[Turn 6 |"));
    }

    #[tokio::test]
    async fn test_consensus_stops_on_convergence() {
        // Identical replies every round: Jaccard similarity 1.0 after round 2
        let invoker = Arc::new(ScriptedInvoker::new("we agree on tabs"));
        let engine = DialogueEngine::new(invoker);

        let state = engine
            .run(DialogueInput::new(
                question(),
                DialogueKind::Consensus,
                consensus_group(),
                12,
            ))
            .await
            .unwrap();

        assert_eq!(state.termination(), Some(TerminationReason::ConsensusDetected));
        assert_eq!(state.turns().len(), 6);
    }

    #[tokio::test]
    async fn test_agreement_marker_policy() {
        let invoker = Arc::new(ScriptedInvoker::new("fine. CONSENSUS REACHED"));
        let engine =
            DialogueEngine::new(invoker).with_convergence(Arc::new(AgreementMarker::default()));

        let state = engine
            .run(DialogueInput::new(
                question(),
                DialogueKind::Consensus,
                consensus_group(),
                9,
            ))
            .await
            .unwrap();

        assert_eq!(state.termination(), Some(TerminationReason::ConsensusDetected));
        assert_eq!(state.turns().len(), 3);
    }

    #[tokio::test]
    async fn test_debate_ignores_convergence() {
        let invoker = Arc::new(ScriptedInvoker::new("same words"));
        let engine = DialogueEngine::new(invoker);

        let state = engine
            .run(DialogueInput::new(question(), DialogueKind::Debate, debaters(), 6))
            .await
            .unwrap();

        assert_eq!(state.termination(), Some(TerminationReason::MaxTurnsReached));
        assert_eq!(state.turns().len(), 6);
    }

    #[tokio::test]
    async fn test_turn_count_never_exceeds_bound() {
        for max_turns in 1..=7 {
            let invoker = Arc::new(ScriptedInvoker::new("r"));
            let engine =
                DialogueEngine::new(invoker).with_convergence(Arc::new(NeverConverge));
            let state = engine
                .run(DialogueInput::new(
                    question(),
                    DialogueKind::Consensus,
                    consensus_group(),
                    max_turns,
                ))
                .await
                .unwrap();
            assert_eq!(state.turns().len(), max_turns);
            assert!(state.is_done());
        }
    }

    #[tokio::test]
    async fn test_invalid_participants_rejected_before_invocation() {
        let invoker = Arc::new(ScriptedInvoker::new("x"));
        let engine = DialogueEngine::new(invoker.clone());

        let result = engine
            .run(DialogueInput::new(
                question(),
                DialogueKind::Debate,
                debaters()[..1].to_vec(),
                4,
            ))
            .await;

        assert!(matches!(result, Err(DomainError::InvalidSelection(_))));
        assert!(invoker.prompts().is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_before_first_turn() {
        let invoker = Arc::new(ScriptedInvoker::new("x"));
        let engine = DialogueEngine::new(invoker.clone());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = engine
            .run_with_progress(
                DialogueInput::new(question(), DialogueKind::Debate, debaters(), 4),
                &NoProgress,
                &cancel,
            )
            .await;

        assert!(matches!(result, Err(DomainError::Cancelled)));
        assert!(invoker.prompts().is_empty());
    }
}
