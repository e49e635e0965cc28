//! Stage pipeline use case
//!
//! Single-model paths of the dispatcher: Simple (one routed model answers)
//! and Two-Stage (a FAST draft over retrieved context, refined by a stronger
//! model). Also owns context retrieval, which is shared with benchmarks.

use crate::ports::context_retriever::{ContextRetriever, NoContext};
use crate::ports::conversation_logger::{
    ConversationEvent, ConversationLogger, NoConversationLogger,
};
use crate::ports::model_invoker::{InvocationRequest, ModelInvoker};
use crate::ports::progress::{Phase, ProgressNotifier};
use crate::use_cases::dispatch_query::DispatchError;
use crate::use_cases::shared::{check_cancelled, invoke_timed};
use parley_domain::{
    ComponentFailure, ModelSelection, PromptTemplate, Question, StageKind, StageResponse,
    TwoStageSelection, render_context, util::millis,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Generation limits applied to every stage invocation.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StageLimits {
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

impl StageLimits {
    fn request(&self, prompt: String) -> InvocationRequest {
        InvocationRequest::new(prompt)
            .with_max_tokens(self.max_tokens)
            .with_temperature(self.temperature)
    }
}

/// Retrieved context, rendered for prompting.
#[derive(Debug, Clone, Default)]
pub struct RetrievedContext {
    /// Prompt section, `None` when nothing was found
    pub rendered: Option<String>,
    pub sources: Vec<String>,
    /// Retrieval error absorbed on the way
    pub failure: Option<ComponentFailure>,
    pub elapsed_ms: u64,
}

/// Result of a stage pipeline.
#[derive(Debug, Clone)]
pub struct StageOutcome {
    pub answer: String,
    pub stages: Vec<StageResponse>,
    pub failures: Vec<ComponentFailure>,
}

impl StageOutcome {
    /// Time spent across all stage invocations.
    pub fn processing_ms(&self) -> u64 {
        self.stages.iter().map(|s| s.latency_ms).sum()
    }
}

pub struct StagePipeline<I: ModelInvoker + ?Sized + 'static> {
    invoker: Arc<I>,
    retriever: Arc<dyn ContextRetriever>,
    logger: Arc<dyn ConversationLogger>,
}

impl<I: ModelInvoker + ?Sized + 'static> StagePipeline<I> {
    pub fn new(invoker: Arc<I>) -> Self {
        Self {
            invoker,
            retriever: Arc::new(NoContext),
            logger: Arc::new(NoConversationLogger),
        }
    }

    pub fn with_retriever(mut self, retriever: Arc<dyn ContextRetriever>) -> Self {
        self.retriever = retriever;
        self
    }

    pub fn with_conversation_logger(mut self, logger: Arc<dyn ConversationLogger>) -> Self {
        self.logger = logger;
        self
    }

    /// Retrieve context once. Failures are absorbed and reported.
    pub async fn retrieve(
        &self,
        question: &Question,
        token_budget: usize,
        progress: &dyn ProgressNotifier,
    ) -> RetrievedContext {
        progress.on_phase_start(Phase::Retrieval, 1);
        let started = Instant::now();
        let result = self.retriever.retrieve(question.content(), token_budget).await;
        let elapsed_ms = millis(started.elapsed());
        progress.on_phase_complete(Phase::Retrieval);

        match result {
            Ok(artifacts) => {
                debug!("Retrieved {} context artifacts", artifacts.len());
                RetrievedContext {
                    rendered: render_context(&artifacts),
                    sources: artifacts.iter().map(|a| a.source_path.clone()).collect(),
                    failure: None,
                    elapsed_ms,
                }
            }
            Err(e) => {
                warn!("Context retrieval failed: {}", e);
                RetrievedContext {
                    failure: Some(ComponentFailure::new("retrieval", e.to_string())),
                    elapsed_ms,
                    ..Default::default()
                }
            }
        }
    }

    /// One routed model answers directly.
    pub async fn run_simple(
        &self,
        question: &Question,
        selection: &ModelSelection,
        context: Option<&str>,
        limits: StageLimits,
        progress: &dyn ProgressNotifier,
        cancel: &CancellationToken,
    ) -> Result<StageOutcome, DispatchError> {
        check_cancelled(cancel)?;
        let prompt = PromptTemplate::answer_prompt(question.content(), context);
        let stage = self
            .run_stage(StageKind::Answer, Phase::Answer, selection, prompt, limits, progress)
            .await;

        if let Some(error) = &stage.error {
            return Err(DispatchError::Invocation {
                model: selection.model().clone(),
                message: error.clone(),
            });
        }

        Ok(StageOutcome {
            answer: stage.text.clone(),
            stages: vec![stage],
            failures: Vec::new(),
        })
    }

    /// FAST draft, then refinement by the stronger model.
    ///
    /// A failed draft lets the refine stage answer from scratch; a failed
    /// refinement falls back to the draft. Only both failing is an error.
    pub async fn run_two_stage(
        &self,
        question: &Question,
        selection: &TwoStageSelection,
        context: Option<&str>,
        limits: StageLimits,
        progress: &dyn ProgressNotifier,
        cancel: &CancellationToken,
    ) -> Result<StageOutcome, DispatchError> {
        info!(
            "Two-stage: draft by {}, refine by {}",
            selection.draft.model(),
            selection.refine.model()
        );
        let mut failures = Vec::new();

        check_cancelled(cancel)?;
        let draft_prompt = PromptTemplate::draft_prompt(question.content(), context);
        let draft = self
            .run_stage(
                StageKind::Draft,
                Phase::Draft,
                &selection.draft,
                draft_prompt,
                limits,
                progress,
            )
            .await;
        if let Some(error) = &draft.error {
            failures.push(
                ComponentFailure::new("draft", error.clone())
                    .with_model(selection.draft.model().clone()),
            );
        }

        check_cancelled(cancel)?;
        let draft_text = draft.success.then_some(draft.text.as_str());
        let refine_prompt =
            PromptTemplate::refine_prompt(question.content(), draft_text, context);
        let refine = self
            .run_stage(
                StageKind::Refine,
                Phase::Refine,
                &selection.refine,
                refine_prompt,
                limits,
                progress,
            )
            .await;

        let answer = match (&refine.error, draft.success) {
            (None, _) => refine.text.clone(),
            (Some(error), true) => {
                warn!("Refinement failed, answering with the draft");
                failures.push(
                    ComponentFailure::new("refine", error.clone())
                        .with_model(selection.refine.model().clone()),
                );
                draft.text.clone()
            }
            (Some(error), false) => {
                return Err(DispatchError::Invocation {
                    model: selection.refine.model().clone(),
                    message: error.clone(),
                });
            }
        };

        Ok(StageOutcome {
            answer,
            stages: vec![draft, refine],
            failures,
        })
    }

    async fn run_stage(
        &self,
        stage: StageKind,
        phase: Phase,
        selection: &ModelSelection,
        prompt: String,
        limits: StageLimits,
        progress: &dyn ProgressNotifier,
    ) -> StageResponse {
        progress.on_phase_start(phase, 1);
        let request = limits.request(prompt);
        let (result, latency_ms) =
            invoke_timed(self.invoker.as_ref(), selection.model(), &request).await;

        let response = match result {
            Ok(completion) => StageResponse::success(
                stage,
                selection.clone(),
                completion.text,
                completion.usage,
                latency_ms,
            ),
            Err(e) => {
                warn!("{} stage on {} failed: {}", stage, selection.model(), e);
                StageResponse::failure(stage, selection.clone(), e.to_string(), latency_ms)
            }
        };

        progress.on_task_complete(phase, selection.model(), response.success);
        progress.on_phase_complete(phase);
        self.logger.log(ConversationEvent::new(
            "stage_completed",
            json!({
                "stage": stage.as_str(),
                "model": selection.model().as_str(),
                "tier": selection.tier().as_str(),
                "success": response.success,
                "latency_ms": response.latency_ms,
                "prompt": request.prompt,
                "response": response.text,
                "error": response.error,
            }),
        ));
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::context_retriever::RetrievalError;
    use crate::ports::model_invoker::{Completion, InvocationError};
    use crate::ports::progress::NoProgress;
    use async_trait::async_trait;
    use parley_domain::{Artifact, Model, SelectionRole, Tier, TokenUsage};
    use std::sync::Mutex;

    // ==================== Test Mocks ====================

    struct RecordingInvoker {
        failing: Vec<String>,
        prompts: Mutex<Vec<(String, String)>>,
    }

    impl RecordingInvoker {
        fn new(failing: &[&str]) -> Self {
            Self {
                failing: failing.iter().map(|s| s.to_string()).collect(),
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn prompt_for(&self, model: &str) -> Option<String> {
            self.prompts
                .lock()
                .unwrap()
                .iter()
                .find(|(m, _)| m == model)
                .map(|(_, p)| p.clone())
        }
    }

    #[async_trait]
    impl ModelInvoker for RecordingInvoker {
        async fn invoke(
            &self,
            model: &Model,
            request: &InvocationRequest,
        ) -> Result<Completion, InvocationError> {
            self.prompts
                .lock()
                .unwrap()
                .push((model.to_string(), request.prompt.clone()));
            if self.failing.iter().any(|f| f == model.as_str()) {
                return Err(InvocationError::Timeout(30));
            }
            Ok(Completion::new(
                format!("answer from {}", model),
                TokenUsage::new(5, 5),
            ))
        }
    }

    struct StaticRetriever(Result<Vec<Artifact>, RetrievalError>);

    #[async_trait]
    impl ContextRetriever for StaticRetriever {
        async fn retrieve(
            &self,
            _query: &str,
            _token_budget: usize,
        ) -> Result<Vec<Artifact>, RetrievalError> {
            self.0.clone()
        }
    }

    fn two_stage() -> TwoStageSelection {
        TwoStageSelection {
            draft: ModelSelection::new(Model::new("small"), Tier::Fast, SelectionRole::Primary),
            refine: ModelSelection::new(Model::new("large"), Tier::Powerful, SelectionRole::Primary),
        }
    }

    fn question() -> Question {
        Question::new("How do lifetimes work?").unwrap()
    }

    #[tokio::test]
    async fn test_two_stage_refines_the_draft() {
        let invoker = Arc::new(RecordingInvoker::new(&[]));
        let pipeline = StagePipeline::new(invoker.clone());

        let outcome = pipeline
            .run_two_stage(
                &question(),
                &two_stage(),
                Some("Relevant context:\nborrowck docs"),
                StageLimits::default(),
                &NoProgress,
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(outcome.answer, "answer from large");
        assert_eq!(outcome.stages.len(), 2);
        assert_eq!(outcome.stages[0].stage, StageKind::Draft);
        assert!(outcome.failures.is_empty());

        let draft_prompt = invoker.prompt_for("small").unwrap();
        assert!(draft_prompt.contains("borrowck docs"));
        let refine_prompt = invoker.prompt_for("large").unwrap();
        assert!(refine_prompt.contains("answer from small"));
    }

    #[tokio::test]
    async fn test_two_stage_failed_draft_still_refines() {
        let invoker = Arc::new(RecordingInvoker::new(&["small"]));
        let pipeline = StagePipeline::new(invoker.clone());

        let outcome = pipeline
            .run_two_stage(
                &question(),
                &two_stage(),
                None,
                StageLimits::default(),
                &NoProgress,
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(outcome.answer, "answer from large");
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].model, Some(Model::new("small")));
        assert!(!invoker.prompt_for("large").unwrap().contains("Draft"));
    }

    #[tokio::test]
    async fn test_two_stage_failed_refine_falls_back_to_draft() {
        let pipeline = StagePipeline::new(Arc::new(RecordingInvoker::new(&["large"])));

        let outcome = pipeline
            .run_two_stage(
                &question(),
                &two_stage(),
                None,
                StageLimits::default(),
                &NoProgress,
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(outcome.answer, "answer from small");
        assert_eq!(outcome.failures[0].component, "refine");
    }

    #[tokio::test]
    async fn test_two_stage_both_failing_is_an_error() {
        let pipeline = StagePipeline::new(Arc::new(RecordingInvoker::new(&["small", "large"])));

        let result = pipeline
            .run_two_stage(
                &question(),
                &two_stage(),
                None,
                StageLimits::default(),
                &NoProgress,
                &CancellationToken::new(),
            )
            .await;

        assert!(matches!(result, Err(DispatchError::Invocation { .. })));
    }

    #[tokio::test]
    async fn test_simple_failure_is_an_error() {
        let pipeline = StagePipeline::new(Arc::new(RecordingInvoker::new(&["small"])));

        let result = pipeline
            .run_simple(
                &question(),
                &two_stage().draft,
                None,
                StageLimits::default(),
                &NoProgress,
                &CancellationToken::new(),
            )
            .await;

        match result {
            Err(DispatchError::Invocation { model, message }) => {
                assert_eq!(model, Model::new("small"));
                assert!(message.contains("Timed out"));
            }
            other => panic!("expected invocation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_retrieval_failure_is_absorbed() {
        let pipeline = StagePipeline::new(Arc::new(RecordingInvoker::new(&[])))
            .with_retriever(Arc::new(StaticRetriever(Err(RetrievalError::Unavailable(
                "index missing".to_string(),
            )))));

        let context = pipeline.retrieve(&question(), 512, &NoProgress).await;

        assert!(context.rendered.is_none());
        assert_eq!(context.failure.unwrap().component, "retrieval");
    }

    #[tokio::test]
    async fn test_retrieval_renders_sources() {
        let pipeline = StagePipeline::new(Arc::new(RecordingInvoker::new(&[]))).with_retriever(
            Arc::new(StaticRetriever(Ok(vec![
                Artifact::new("docs/a.md", "alpha", 0.4),
                Artifact::new("docs/b.md", "beta", 0.9),
            ]))),
        );

        let context = pipeline.retrieve(&question(), 512, &NoProgress).await;

        assert_eq!(context.sources, vec!["docs/a.md", "docs/b.md"]);
        let rendered = context.rendered.unwrap();
        assert!(rendered.find("docs/b.md").unwrap() < rendered.find("docs/a.md").unwrap());
    }
}
