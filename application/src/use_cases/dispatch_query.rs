//! Query dispatcher use case
//!
//! Top-level entry point. Validates the mode's requirements against the
//! per-query model catalog before doing any work, runs the mode's pipeline,
//! and assembles one [`ResponseEnvelope`]. Failures confined to one
//! participant or candidate are recorded in the envelope; only what prevents
//! any usable answer is returned as an error.

use crate::config::OrchestrationParams;
use crate::ports::context_retriever::{ContextRetriever, NoContext};
use crate::ports::conversation_logger::{
    ConversationEvent, ConversationLogger, NoConversationLogger,
};
use crate::ports::model_invoker::{InvocationRequest, ModelInvoker};
use crate::ports::progress::{NoProgress, ProgressNotifier};
use crate::ports::reasoning::{ReasoningEngine, UnavailableReasoning};
use crate::use_cases::moderate::Moderator;
use crate::use_cases::run_benchmark::{BenchmarkCandidate, BenchmarkCoordinator, BenchmarkInput};
use crate::use_cases::run_dialogue::{DialogueEngine, DialogueInput};
use crate::use_cases::run_stages::{RetrievedContext, StageLimits, StagePipeline};
use crate::use_cases::shared::check_cancelled;
use parley_domain::{
    BenchmarkReport, ComplexityAssessor, ComplexityBreakdown, ComponentFailure, DialogueKind,
    DialogueState, DomainError, Mode, Model, ModelCatalog, ModelSelection, ModeratorOutcome,
    PromptTemplate, Query, ResponseEnvelope, ResponseMetadata, SelectionRole, Tier, TierRouter,
    TwoStageSelection, util::millis,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Errors that fail a whole query
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DispatchError {
    /// Invalid mode/parameter combination; nothing was executed
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Tier fallback exhausted
    #[error("No available model for tier {requested} (tried: {tried})")]
    NoAvailableModel { requested: Tier, tried: String },

    /// A model failure that left no usable answer
    #[error("Invocation of {model} failed: {message}")]
    Invocation { model: Model, message: String },

    #[error("Query cancelled")]
    Cancelled,
}

impl DispatchError {
    pub fn is_configuration(&self) -> bool {
        matches!(self, DispatchError::Configuration(_))
    }
}

impl From<DomainError> for DispatchError {
    fn from(error: DomainError) -> Self {
        match error {
            DomainError::NoAvailableModel { requested, tried } => {
                DispatchError::NoAvailableModel { requested, tried }
            }
            DomainError::InvalidQuestion(msg) | DomainError::InvalidSelection(msg) => {
                DispatchError::Configuration(msg)
            }
            DomainError::Cancelled => DispatchError::Cancelled,
        }
    }
}

/// Models chosen for a query, resolved before anything runs.
enum Plan {
    Simple(ModelSelection),
    TwoStage(TwoStageSelection),
    Dialogue {
        kind: DialogueKind,
        participants: Vec<ModelSelection>,
        moderator: Option<ModelSelection>,
    },
    Benchmark(Vec<BenchmarkCandidate>),
}

/// What a mode's pipeline produced.
struct Executed {
    answer: String,
    metadata: ResponseMetadata,
    failures: Vec<ComponentFailure>,
    processing_ms: u64,
}

pub struct QueryDispatcher<I: ModelInvoker + ?Sized + 'static> {
    invoker: Arc<I>,
    retriever: Arc<dyn ContextRetriever>,
    reasoning: Arc<dyn ReasoningEngine>,
    logger: Arc<dyn ConversationLogger>,
    params: OrchestrationParams,
    assessor: ComplexityAssessor,
}

impl<I: ModelInvoker + ?Sized + 'static> QueryDispatcher<I> {
    pub fn new(invoker: Arc<I>) -> Self {
        Self {
            invoker,
            retriever: Arc::new(NoContext),
            reasoning: Arc::new(UnavailableReasoning),
            logger: Arc::new(NoConversationLogger),
            params: OrchestrationParams::default(),
            assessor: ComplexityAssessor::new(),
        }
    }

    pub fn with_retriever(mut self, retriever: Arc<dyn ContextRetriever>) -> Self {
        self.retriever = retriever;
        self
    }

    pub fn with_reasoning(mut self, reasoning: Arc<dyn ReasoningEngine>) -> Self {
        self.reasoning = reasoning;
        self
    }

    pub fn with_conversation_logger(mut self, logger: Arc<dyn ConversationLogger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn with_params(mut self, params: OrchestrationParams) -> Self {
        self.params = params;
        self
    }

    pub fn params(&self) -> &OrchestrationParams {
        &self.params
    }

    /// Dispatch with no progress reporting
    pub async fn dispatch(
        &self,
        query: &Query,
        catalog: &ModelCatalog,
        cancel: &CancellationToken,
    ) -> Result<ResponseEnvelope, DispatchError> {
        self.dispatch_with_progress(query, catalog, &NoProgress, cancel)
            .await
    }

    /// Dispatch a query against an explicit catalog handle.
    pub async fn dispatch_with_progress(
        &self,
        query: &Query,
        catalog: &ModelCatalog,
        progress: &dyn ProgressNotifier,
        cancel: &CancellationToken,
    ) -> Result<ResponseEnvelope, DispatchError> {
        let started = Instant::now();
        let params = self.params.merged(query.params());
        validate_params(&params)?;

        let complexity = self.assessor.breakdown(query.text());
        let plan = self.plan(query, catalog, &params, &complexity)?;

        info!(
            "Dispatching {} query (complexity {:.1})",
            query.mode(),
            complexity.total.value()
        );
        self.logger.log(ConversationEvent::new(
            "query_dispatched",
            json!({
                "mode": query.mode().as_str(),
                "question": query.text(),
                "complexity": complexity.total.value(),
            }),
        ));
        check_cancelled(cancel)?;

        let executed = match plan {
            Plan::Simple(selection) => {
                self.execute_simple(query, &selection, &params, progress, cancel)
                    .await?
            }
            Plan::TwoStage(selection) => {
                self.execute_two_stage(query, &selection, &params, progress, cancel)
                    .await?
            }
            Plan::Dialogue {
                kind,
                participants,
                moderator,
            } => {
                self.execute_dialogue(query, kind, participants, moderator, &params, progress, cancel)
                    .await?
            }
            Plan::Benchmark(candidates) => {
                self.execute_benchmark(query, candidates, &params, progress, cancel)
                    .await?
            }
        };

        let envelope = ResponseEnvelope {
            answer: executed.answer,
            mode: query.mode(),
            complexity: Some(complexity),
            metadata: executed.metadata,
            failures: executed.failures,
            processing_ms: executed.processing_ms,
            elapsed_ms: millis(started.elapsed()),
        };

        info!(
            "{} query completed in {}ms ({} absorbed failures)",
            envelope.mode,
            envelope.elapsed_ms,
            envelope.failures.len()
        );
        self.logger.log(ConversationEvent::new(
            "query_completed",
            json!({
                "mode": envelope.mode.as_str(),
                "elapsed_ms": envelope.elapsed_ms,
                "processing_ms": envelope.processing_ms,
                "failures": envelope.failures.iter().map(|f| f.to_string()).collect::<Vec<_>>(),
            }),
        ));
        Ok(envelope)
    }

    // ==================== Planning ====================

    /// Resolve every model the mode needs. Runs before any invocation.
    fn plan(
        &self,
        query: &Query,
        catalog: &ModelCatalog,
        params: &OrchestrationParams,
        complexity: &ComplexityBreakdown,
    ) -> Result<Plan, DispatchError> {
        let router = TierRouter::new(catalog, params.thresholds);
        let query_params = query.params();
        let overrides = &query_params.tier_overrides;

        let plan = match query.mode() {
            Mode::Simple => {
                let tier = query_params
                    .force_tier
                    .unwrap_or_else(|| router.tier_for(complexity.total));
                Plan::Simple(router.resolve(tier, SelectionRole::Primary, overrides)?)
            }
            Mode::TwoStage => Plan::TwoStage(router.resolve_two_stage(complexity.total, overrides)?),
            Mode::Debate => {
                let [pro, con] = router.select_debaters(&query_params.participants)?;
                Plan::Dialogue {
                    kind: DialogueKind::Debate,
                    participants: vec![pro, con],
                    moderator: self.moderator_selection(&router, query),
                }
            }
            Mode::Consensus => Plan::Dialogue {
                kind: DialogueKind::Consensus,
                participants: router.select_consensus(&query_params.participants)?,
                moderator: self.moderator_selection(&router, query),
            },
            Mode::Benchmark => {
                let candidates = router.benchmark_candidates();
                if candidates.is_empty() {
                    return Err(DispatchError::Configuration(
                        "benchmark requires at least 1 enabled model".to_string(),
                    ));
                }
                Plan::Benchmark(
                    candidates
                        .into_iter()
                        .map(|s| BenchmarkCandidate::from_catalog(catalog, s))
                        .collect(),
                )
            }
        };
        Ok(plan)
    }

    /// The moderator's own model, when the query asks for analysis and the
    /// reasoner is backed by a catalogued model.
    fn moderator_selection(&self, router: &TierRouter<'_>, query: &Query) -> Option<ModelSelection> {
        if !query.params().moderator {
            return None;
        }
        let model = self.reasoning.backing_model()?;
        match router.select_moderator(model) {
            Ok(selection) => Some(selection),
            Err(e) => {
                warn!("Moderator model not resolved: {}", e);
                None
            }
        }
    }

    // ==================== Execution ====================

    fn stage_pipeline(&self) -> StagePipeline<I> {
        StagePipeline::new(Arc::clone(&self.invoker))
            .with_retriever(Arc::clone(&self.retriever))
            .with_conversation_logger(Arc::clone(&self.logger))
    }

    async fn retrieve_if(
        &self,
        wanted: bool,
        pipeline: &StagePipeline<I>,
        query: &Query,
        params: &OrchestrationParams,
        progress: &dyn ProgressNotifier,
    ) -> RetrievedContext {
        if !wanted {
            return RetrievedContext::default();
        }
        pipeline
            .retrieve(query.question(), params.context_token_budget, progress)
            .await
    }

    async fn execute_simple(
        &self,
        query: &Query,
        selection: &ModelSelection,
        params: &OrchestrationParams,
        progress: &dyn ProgressNotifier,
        cancel: &CancellationToken,
    ) -> Result<Executed, DispatchError> {
        let pipeline = self.stage_pipeline();
        let context = self
            .retrieve_if(query.params().use_context, &pipeline, query, params, progress)
            .await;

        let outcome = pipeline
            .run_simple(
                query.question(),
                selection,
                context.rendered.as_deref(),
                limits(params),
                progress,
                cancel,
            )
            .await?;

        let processing_ms = context.elapsed_ms + outcome.processing_ms();
        let mut failures: Vec<ComponentFailure> = context.failure.into_iter().collect();
        failures.extend(outcome.failures);
        let stage = outcome
            .stages
            .into_iter()
            .next()
            .ok_or_else(|| DispatchError::Configuration("simple pipeline ran no stage".into()))?;

        Ok(Executed {
            answer: outcome.answer,
            metadata: ResponseMetadata::Simple {
                stage,
                context_sources: context.sources,
            },
            failures,
            processing_ms,
        })
    }

    async fn execute_two_stage(
        &self,
        query: &Query,
        selection: &TwoStageSelection,
        params: &OrchestrationParams,
        progress: &dyn ProgressNotifier,
        cancel: &CancellationToken,
    ) -> Result<Executed, DispatchError> {
        let pipeline = self.stage_pipeline();
        let context = self
            .retrieve_if(true, &pipeline, query, params, progress)
            .await;

        let outcome = pipeline
            .run_two_stage(
                query.question(),
                selection,
                context.rendered.as_deref(),
                limits(params),
                progress,
                cancel,
            )
            .await?;

        let processing_ms = context.elapsed_ms + outcome.processing_ms();
        let mut failures: Vec<ComponentFailure> = context.failure.into_iter().collect();
        failures.extend(outcome.failures);

        Ok(Executed {
            answer: outcome.answer,
            metadata: ResponseMetadata::TwoStage {
                stages: outcome.stages,
                context_sources: context.sources,
            },
            failures,
            processing_ms,
        })
    }

    async fn execute_dialogue(
        &self,
        query: &Query,
        kind: DialogueKind,
        participants: Vec<ModelSelection>,
        moderator_selection: Option<ModelSelection>,
        params: &OrchestrationParams,
        progress: &dyn ProgressNotifier,
        cancel: &CancellationToken,
    ) -> Result<Executed, DispatchError> {
        let engine = DialogueEngine::new(Arc::clone(&self.invoker))
            .with_convergence(params.convergence_policy())
            .with_conversation_logger(Arc::clone(&self.logger));
        let input = DialogueInput::new(query.question().clone(), kind, participants, params.max_turns)
            .with_limits(params.max_tokens, params.temperature);

        let state = engine.run_with_progress(input, progress, cancel).await?;

        let (moderator, moderator_ms) = if query.params().moderator {
            let started = Instant::now();
            let mut moderator = Moderator::new(Arc::clone(&self.reasoning))
                .with_max_iterations(params.moderator_max_iterations)
                .with_conversation_logger(Arc::clone(&self.logger));
            if let Some(selection) = moderator_selection {
                moderator = moderator.with_selection(selection);
            }
            let outcome = moderator
                .analyze_with_progress(&state, query.question(), progress, cancel)
                .await;
            (outcome, millis(started.elapsed()))
        } else {
            (ModeratorOutcome::Skipped, 0)
        };
        check_cancelled(cancel)?;

        let failures = dialogue_failures(&state, &moderator);
        let synthesis_ms = state.synthesis().map(|s| s.latency_ms).unwrap_or_default();
        let turns_ms: u64 = state.turns().iter().map(|t| t.latency_ms).sum();
        let answer = state
            .synthesis()
            .map(|s| s.text.clone())
            .unwrap_or_default();

        Ok(Executed {
            answer,
            metadata: ResponseMetadata::Dialogue {
                dialogue: state,
                moderator,
            },
            failures,
            processing_ms: turns_ms + synthesis_ms + moderator_ms,
        })
    }

    async fn execute_benchmark(
        &self,
        query: &Query,
        candidates: Vec<BenchmarkCandidate>,
        params: &OrchestrationParams,
        progress: &dyn ProgressNotifier,
        cancel: &CancellationToken,
    ) -> Result<Executed, DispatchError> {
        // Context and prompt are built once and shared by every candidate
        let pipeline = self.stage_pipeline();
        let context = self
            .retrieve_if(query.params().use_context, &pipeline, query, params, progress)
            .await;
        let prompt = PromptTemplate::answer_prompt(query.text(), context.rendered.as_deref());
        let request = InvocationRequest::new(prompt)
            .with_max_tokens(params.max_tokens)
            .with_temperature(params.temperature);

        let coordinator = BenchmarkCoordinator::new(Arc::clone(&self.invoker))
            .with_conversation_logger(Arc::clone(&self.logger));
        let report = coordinator
            .run_with_progress(
                BenchmarkInput::new(request, candidates, params.benchmark_policy),
                progress,
                cancel,
            )
            .await?;

        let mut failures: Vec<ComponentFailure> = context.failure.into_iter().collect();
        failures.extend(report.results.iter().filter(|r| !r.success).map(|r| {
            ComponentFailure::new("benchmark", r.error.clone().unwrap_or_default())
                .with_model(r.model.clone())
        }));

        // Every candidate counts, even when they overlapped in wall time
        let candidates_ms: u64 = report.results.iter().map(|r| r.latency_ms).sum();

        Ok(Executed {
            answer: benchmark_answer(&report),
            processing_ms: context.elapsed_ms + candidates_ms,
            metadata: ResponseMetadata::Benchmark {
                report,
                context_sources: context.sources,
            },
            failures,
        })
    }
}

fn validate_params(params: &OrchestrationParams) -> Result<(), DispatchError> {
    if params.max_turns == 0 {
        return Err(DispatchError::Configuration(
            "max turns must be at least 1".to_string(),
        ));
    }
    if params.moderator_max_iterations == 0 {
        return Err(DispatchError::Configuration(
            "moderator iteration cap must be at least 1".to_string(),
        ));
    }
    if !(0.0..=1.0).contains(&params.convergence_threshold) {
        return Err(DispatchError::Configuration(format!(
            "convergence threshold must be within [0, 1], got {}",
            params.convergence_threshold
        )));
    }
    if !params.thresholds.is_valid() {
        return Err(DispatchError::Configuration(
            "tier thresholds must be finite and increasing".to_string(),
        ));
    }
    Ok(())
}

fn limits(params: &OrchestrationParams) -> StageLimits {
    StageLimits {
        max_tokens: params.max_tokens,
        temperature: params.temperature,
    }
}

fn dialogue_failures(state: &DialogueState, moderator: &ModeratorOutcome) -> Vec<ComponentFailure> {
    let mut failures: Vec<ComponentFailure> = state
        .failed_turns()
        .map(|t| {
            ComponentFailure::new(
                "dialogue",
                format!(
                    "turn {}: {}",
                    t.sequence,
                    t.error.as_deref().unwrap_or("invocation failed")
                ),
            )
            .with_model(t.speaker.clone())
        })
        .collect();

    if let Some(synthesis) = state.synthesis()
        && !synthesis.success
    {
        failures.push(
            ComponentFailure::new(
                "synthesis",
                synthesis.error.clone().unwrap_or_default(),
            )
            .with_model(synthesis.model.clone()),
        );
    }

    if let ModeratorOutcome::Unavailable { reason } = moderator {
        warn!("Moderator analysis omitted: {}", reason);
        failures.push(ComponentFailure::new("moderator", reason.clone()));
    }
    failures
}

/// Textual primary answer of a benchmark: the summary plus one line per model.
fn benchmark_answer(report: &BenchmarkReport) -> String {
    let mut answer = report.summary.headline();
    for result in &report.results {
        let line = if result.success {
            format!(
                "\n- {} ({}): {}ms, {} tokens",
                result.model,
                result.tier,
                result.latency_ms,
                result.usage.total()
            )
        } else {
            format!(
                "\n- {} ({}): failed: {}",
                result.model,
                result.tier,
                result.error.as_deref().unwrap_or("unknown error")
            )
        };
        answer.push_str(&line);
    }
    answer
}
