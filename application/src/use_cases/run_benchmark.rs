//! Benchmark coordinator use case
//!
//! Fans one prompt out to every candidate model and aggregates the outcomes.
//!
//! - **Serial**: one invocation at a time, never overlapping
//! - **Parallel**: every invocation is spawned before any is awaited; the
//!   coordinator then waits for the full set
//!
//! A candidate's failure is captured in its own [`BenchmarkResult`] and never
//! cancels the others. The prompt is built once by the caller and shared
//! verbatim across all candidates.

use crate::ports::conversation_logger::{
    ConversationEvent, ConversationLogger, NoConversationLogger,
};
use crate::ports::model_invoker::{InvocationRequest, ModelInvoker};
use crate::ports::progress::{NoProgress, Phase, ProgressNotifier};
use crate::use_cases::shared::{check_cancelled, invoke_timed};
use parley_domain::{
    BenchmarkReport, BenchmarkResult, BenchmarkSummary, CatalogEntry, DomainError,
    ExecutionPolicy, ModelCatalog, ModelSelection, util::millis,
};
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// One model to benchmark, with what the catalog knows about its cost.
#[derive(Debug, Clone)]
pub struct BenchmarkCandidate {
    pub selection: ModelSelection,
    pub cost_per_1k_tokens: f64,
    /// Constrained resource this backend shares with others (e.g. one GPU)
    pub resource: Option<String>,
}

impl BenchmarkCandidate {
    pub fn new(selection: ModelSelection) -> Self {
        Self {
            selection,
            cost_per_1k_tokens: 0.0,
            resource: None,
        }
    }

    /// Build a candidate, reading cost and resource group from the catalog.
    pub fn from_catalog(catalog: &ModelCatalog, selection: ModelSelection) -> Self {
        let entry: Option<&CatalogEntry> = catalog.get(selection.model());
        Self {
            cost_per_1k_tokens: entry.map(|e| e.cost_per_1k_tokens).unwrap_or_default(),
            resource: entry.and_then(|e| e.resource.clone()),
            selection,
        }
    }

    fn estimate_cost(&self, tokens: u64) -> f64 {
        tokens as f64 / 1000.0 * self.cost_per_1k_tokens
    }
}

/// Input for one benchmark run
#[derive(Debug, Clone)]
pub struct BenchmarkInput {
    /// Prompt shared by every candidate
    pub request: InvocationRequest,
    pub candidates: Vec<BenchmarkCandidate>,
    pub policy: ExecutionPolicy,
}

impl BenchmarkInput {
    pub fn new(
        request: InvocationRequest,
        candidates: Vec<BenchmarkCandidate>,
        policy: ExecutionPolicy,
    ) -> Self {
        Self {
            request,
            candidates,
            policy,
        }
    }

    /// Policy actually used: a parallel run whose candidates share a
    /// resource group is downgraded to serial.
    pub fn effective_policy(&self) -> ExecutionPolicy {
        if self.policy == ExecutionPolicy::Parallel && self.has_shared_resource() {
            ExecutionPolicy::Serial
        } else {
            self.policy
        }
    }

    fn has_shared_resource(&self) -> bool {
        let mut seen = HashSet::new();
        self.candidates
            .iter()
            .filter_map(|c| c.resource.as_deref())
            .any(|resource| !seen.insert(resource))
    }
}

pub struct BenchmarkCoordinator<I: ModelInvoker + ?Sized + 'static> {
    invoker: Arc<I>,
    logger: Arc<dyn ConversationLogger>,
}

impl<I: ModelInvoker + ?Sized + 'static> BenchmarkCoordinator<I> {
    pub fn new(invoker: Arc<I>) -> Self {
        Self {
            invoker,
            logger: Arc::new(NoConversationLogger),
        }
    }

    pub fn with_conversation_logger(mut self, logger: Arc<dyn ConversationLogger>) -> Self {
        self.logger = logger;
        self
    }

    pub async fn run(&self, input: BenchmarkInput) -> Result<BenchmarkReport, DomainError> {
        self.run_with_progress(input, &NoProgress, &CancellationToken::new())
            .await
    }

    /// Run every candidate. Errors only when there is nothing to benchmark
    /// or the run is cancelled.
    pub async fn run_with_progress(
        &self,
        input: BenchmarkInput,
        progress: &dyn ProgressNotifier,
        cancel: &CancellationToken,
    ) -> Result<BenchmarkReport, DomainError> {
        if input.candidates.is_empty() {
            return Err(DomainError::InvalidSelection(
                "benchmark requires at least 1 enabled model".to_string(),
            ));
        }

        let policy = input.effective_policy();
        if policy != input.policy {
            warn!("Candidates share a constrained resource; running benchmark serially");
        }
        info!(
            "Benchmarking {} models ({})",
            input.candidates.len(),
            policy
        );
        progress.on_benchmark_start(input.candidates.len(), policy);
        progress.on_phase_start(Phase::Benchmark, input.candidates.len());

        let started = Instant::now();
        let results = match policy {
            ExecutionPolicy::Serial => self.run_serial(&input, progress, cancel).await?,
            ExecutionPolicy::Parallel => self.run_parallel(&input, progress, cancel).await?,
        };
        let wall_time_ms = millis(started.elapsed());

        let summary = BenchmarkSummary::from_results(&results, input.policy, policy, wall_time_ms);
        info!("Benchmark finished: {}", summary.headline());
        progress.on_phase_complete(Phase::Benchmark);

        Ok(BenchmarkReport { results, summary })
    }

    async fn run_serial(
        &self,
        input: &BenchmarkInput,
        progress: &dyn ProgressNotifier,
        cancel: &CancellationToken,
    ) -> Result<Vec<BenchmarkResult>, DomainError> {
        let mut results = Vec::with_capacity(input.candidates.len());
        for candidate in &input.candidates {
            check_cancelled(cancel)?;
            let result = run_candidate(self.invoker.as_ref(), candidate, &input.request).await;
            self.record(&result, progress);
            results.push(result);
        }
        Ok(results)
    }

    async fn run_parallel(
        &self,
        input: &BenchmarkInput,
        progress: &dyn ProgressNotifier,
        cancel: &CancellationToken,
    ) -> Result<Vec<BenchmarkResult>, DomainError> {
        check_cancelled(cancel)?;

        let request = Arc::new(input.request.clone());
        let mut join_set = JoinSet::new();

        for (index, candidate) in input.candidates.iter().enumerate() {
            let invoker = Arc::clone(&self.invoker);
            let request = Arc::clone(&request);
            let candidate = candidate.clone();

            join_set.spawn(async move {
                let result = run_candidate(invoker.as_ref(), &candidate, &request).await;
                (index, result)
            });
        }

        // Slots start as failures so a panicked task still yields a result
        let mut completed = vec![false; input.candidates.len()];
        let mut results: Vec<BenchmarkResult> = input
            .candidates
            .iter()
            .map(|c| {
                BenchmarkResult::failure(
                    c.selection.model().clone(),
                    c.selection.tier(),
                    "benchmark task aborted",
                    0,
                )
            })
            .collect();

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    join_set.abort_all();
                    return Err(DomainError::Cancelled);
                }
                next = join_set.join_next() => match next {
                    None => break,
                    Some(Ok((index, result))) => {
                        self.record(&result, progress);
                        results[index] = result;
                        completed[index] = true;
                    }
                    Some(Err(e)) => warn!("Benchmark task join error: {}", e),
                },
            }
        }

        for (result, _) in results.iter().zip(&completed).filter(|(_, done)| !**done) {
            self.record(result, progress);
        }

        Ok(results)
    }

    fn record(&self, result: &BenchmarkResult, progress: &dyn ProgressNotifier) {
        if result.success {
            info!("{} answered in {}ms", result.model, result.latency_ms);
        } else {
            warn!(
                "{} failed: {}",
                result.model,
                result.error.as_deref().unwrap_or("unknown error")
            );
        }
        progress.on_task_complete(Phase::Benchmark, &result.model, result.success);
        progress.on_candidate_complete(result);
        self.logger.log(ConversationEvent::new(
            "benchmark_candidate",
            json!({
                "model": result.model.as_str(),
                "success": result.success,
                "latency_ms": result.latency_ms,
                "total_tokens": result.usage.total(),
                "response": result.response,
                "error": result.error,
            }),
        ));
    }
}

async fn run_candidate<I: ModelInvoker + ?Sized>(
    invoker: &I,
    candidate: &BenchmarkCandidate,
    request: &InvocationRequest,
) -> BenchmarkResult {
    let model = candidate.selection.model().clone();
    let tier = candidate.selection.tier();
    let (result, latency_ms) = invoke_timed(invoker, &model, request).await;
    match result {
        Ok(completion) => {
            let cost = candidate.estimate_cost(completion.usage.total());
            BenchmarkResult::success(model, tier, completion.text, latency_ms, completion.usage, cost)
        }
        Err(e) => BenchmarkResult::failure(model, tier, e.to_string(), latency_ms),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::model_invoker::{Completion, InvocationError};
    use async_trait::async_trait;
    use parley_domain::{Model, SelectionRole, Tier, TokenUsage};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    // ==================== Test Mocks ====================

    /// Replies `"<model>: <prompt>"`; models in `failing` always error.
    /// Tracks how many invocations overlap.
    struct MockInvoker {
        failing: Vec<String>,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
        prompts: Mutex<Vec<String>>,
    }

    impl MockInvoker {
        fn new(failing: &[&str]) -> Self {
            Self {
                failing: failing.iter().map(|s| s.to_string()).collect(),
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ModelInvoker for MockInvoker {
        async fn invoke(
            &self,
            model: &Model,
            request: &InvocationRequest,
        ) -> Result<Completion, InvocationError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            self.prompts.lock().unwrap().push(request.prompt.clone());

            tokio::time::sleep(Duration::from_millis(10)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if self.failing.iter().any(|f| f == model.as_str()) {
                return Err(InvocationError::RequestFailed(format!("{} is down", model)));
            }
            Ok(Completion::new(
                format!("{}: {}", model, request.prompt),
                TokenUsage::new(100, 400),
            ))
        }
    }

    /// Panics for one model, answers for the rest.
    struct PanickingInvoker {
        panics_for: &'static str,
    }

    #[async_trait]
    impl ModelInvoker for PanickingInvoker {
        async fn invoke(
            &self,
            model: &Model,
            _request: &InvocationRequest,
        ) -> Result<Completion, InvocationError> {
            if model.as_str() == self.panics_for {
                panic!("backend crashed");
            }
            Ok(Completion::new("ok", TokenUsage::new(1, 1)))
        }
    }

    #[derive(Default)]
    struct RecordingProgress {
        completed: Mutex<Vec<(String, bool)>>,
    }

    impl ProgressNotifier for RecordingProgress {
        fn on_phase_start(&self, _phase: Phase, _total_tasks: usize) {}
        fn on_task_complete(&self, _phase: Phase, _model: &Model, _success: bool) {}
        fn on_phase_complete(&self, _phase: Phase) {}

        fn on_candidate_complete(&self, result: &BenchmarkResult) {
            self.completed
                .lock()
                .unwrap()
                .push((result.model.to_string(), result.success));
        }
    }

    #[derive(Default)]
    struct RecordingLogger {
        events: Mutex<Vec<ConversationEvent>>,
    }

    impl ConversationLogger for RecordingLogger {
        fn log(&self, event: ConversationEvent) {
            self.events.lock().unwrap().push(event);
        }
    }

    fn candidates(names: &[(&str, Tier)]) -> Vec<BenchmarkCandidate> {
        names
            .iter()
            .map(|(name, tier)| {
                BenchmarkCandidate::new(ModelSelection::new(
                    Model::new(*name),
                    *tier,
                    SelectionRole::BenchmarkCandidate,
                ))
            })
            .collect()
    }

    fn three_models() -> Vec<BenchmarkCandidate> {
        candidates(&[
            ("small", Tier::Fast),
            ("medium", Tier::Balanced),
            ("large", Tier::Powerful),
        ])
    }

    #[tokio::test]
    async fn test_one_failing_model_is_recorded_in_its_own_result() {
        let invoker = Arc::new(MockInvoker::new(&["medium"]));
        let coordinator = BenchmarkCoordinator::new(invoker);

        let report = coordinator
            .run(BenchmarkInput::new(
                InvocationRequest::new("ping"),
                three_models(),
                ExecutionPolicy::Serial,
            ))
            .await
            .unwrap();

        assert_eq!(report.summary.succeeded, 2);
        assert_eq!(report.summary.failed, 1);
        let failed = report.result_for(&Model::new("medium")).unwrap();
        assert!(!failed.success);
        assert!(failed.error.as_deref().unwrap().contains("medium is down"));
        assert!(report.result_for(&Model::new("large")).unwrap().success);
        assert_eq!(report.summary.total_usage.total(), 1000);
    }

    #[tokio::test]
    async fn test_serial_and_parallel_agree() {
        let serial = BenchmarkCoordinator::new(Arc::new(MockInvoker::new(&["large"])))
            .run(BenchmarkInput::new(
                InvocationRequest::new("same prompt"),
                three_models(),
                ExecutionPolicy::Serial,
            ))
            .await
            .unwrap();
        let parallel = BenchmarkCoordinator::new(Arc::new(MockInvoker::new(&["large"])))
            .run(BenchmarkInput::new(
                InvocationRequest::new("same prompt"),
                three_models(),
                ExecutionPolicy::Parallel,
            ))
            .await
            .unwrap();

        assert_eq!(serial.summary.succeeded, parallel.summary.succeeded);
        assert_eq!(serial.summary.failed, parallel.summary.failed);
        for result in &serial.results {
            let other = parallel.result_for(&result.model).unwrap();
            assert_eq!(result.success, other.success);
            assert_eq!(result.response, other.response);
        }
        assert_eq!(parallel.summary.policy, ExecutionPolicy::Parallel);
    }

    #[tokio::test]
    async fn test_serial_never_overlaps() {
        let invoker = Arc::new(MockInvoker::new(&[]));
        BenchmarkCoordinator::new(invoker.clone())
            .run(BenchmarkInput::new(
                InvocationRequest::new("p"),
                three_models(),
                ExecutionPolicy::Serial,
            ))
            .await
            .unwrap();

        assert_eq!(invoker.max_in_flight.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_parallel_issues_all_before_awaiting() {
        let invoker = Arc::new(MockInvoker::new(&[]));
        BenchmarkCoordinator::new(invoker.clone())
            .run(BenchmarkInput::new(
                InvocationRequest::new("p"),
                three_models(),
                ExecutionPolicy::Parallel,
            ))
            .await
            .unwrap();

        assert_eq!(invoker.max_in_flight.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_prompt_shared_verbatim() {
        let invoker = Arc::new(MockInvoker::new(&[]));
        BenchmarkCoordinator::new(invoker.clone())
            .run(BenchmarkInput::new(
                InvocationRequest::new("context + question"),
                three_models(),
                ExecutionPolicy::Parallel,
            ))
            .await
            .unwrap();

        let prompts = invoker.prompts.lock().unwrap().clone();
        assert_eq!(prompts.len(), 3);
        assert!(prompts.iter().all(|p| p == "context + question"));
    }

    #[tokio::test]
    async fn test_shared_resource_downgrades_to_serial() {
        let invoker = Arc::new(MockInvoker::new(&[]));
        let mut models = three_models();
        models[0].resource = Some("gpu0".to_string());
        models[2].resource = Some("gpu0".to_string());

        let report = BenchmarkCoordinator::new(invoker.clone())
            .run(BenchmarkInput::new(
                InvocationRequest::new("p"),
                models,
                ExecutionPolicy::Parallel,
            ))
            .await
            .unwrap();

        assert_eq!(report.summary.requested_policy, ExecutionPolicy::Parallel);
        assert_eq!(report.summary.policy, ExecutionPolicy::Serial);
        assert_eq!(invoker.max_in_flight.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_panicked_candidate_is_still_reported() {
        let progress = RecordingProgress::default();
        let logger = Arc::new(RecordingLogger::default());
        let coordinator = BenchmarkCoordinator::new(Arc::new(PanickingInvoker {
            panics_for: "medium",
        }))
        .with_conversation_logger(logger.clone());

        let report = coordinator
            .run_with_progress(
                BenchmarkInput::new(
                    InvocationRequest::new("p"),
                    three_models(),
                    ExecutionPolicy::Parallel,
                ),
                &progress,
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(report.summary.failed, 1);
        assert!(!report.result_for(&Model::new("medium")).unwrap().success);

        let completed = progress.completed.lock().unwrap().clone();
        assert_eq!(completed.len(), 3);
        assert!(completed.contains(&("medium".to_string(), false)));

        let events = logger.events.lock().unwrap();
        let candidate_events: Vec<_> = events
            .iter()
            .filter(|e| e.event_type == "benchmark_candidate")
            .collect();
        assert_eq!(candidate_events.len(), 3);
        assert!(
            candidate_events
                .iter()
                .any(|e| e.payload["model"] == "medium" && e.payload["success"] == false)
        );
    }

    #[tokio::test]
    async fn test_results_keep_candidate_order() {
        let report = BenchmarkCoordinator::new(Arc::new(MockInvoker::new(&[])))
            .run(BenchmarkInput::new(
                InvocationRequest::new("p"),
                three_models(),
                ExecutionPolicy::Parallel,
            ))
            .await
            .unwrap();

        let order: Vec<&str> = report.results.iter().map(|r| r.model.as_str()).collect();
        assert_eq!(order, vec!["small", "medium", "large"]);
    }

    #[tokio::test]
    async fn test_estimated_cost_from_catalog() {
        let catalog = ModelCatalog::new(vec![
            CatalogEntry::new("small", Tier::Fast).with_cost(0.5),
        ]);
        let selection =
            ModelSelection::new(Model::new("small"), Tier::Fast, SelectionRole::BenchmarkCandidate);
        let candidate = BenchmarkCandidate::from_catalog(&catalog, selection);

        let report = BenchmarkCoordinator::new(Arc::new(MockInvoker::new(&[])))
            .run(BenchmarkInput::new(
                InvocationRequest::new("p"),
                vec![candidate],
                ExecutionPolicy::Serial,
            ))
            .await
            .unwrap();

        // 500 tokens at 0.5 per 1k
        assert!((report.results[0].estimated_cost - 0.25).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_empty_candidate_set_rejected() {
        let result = BenchmarkCoordinator::new(Arc::new(MockInvoker::new(&[])))
            .run(BenchmarkInput::new(
                InvocationRequest::new("p"),
                vec![],
                ExecutionPolicy::Serial,
            ))
            .await;

        assert!(matches!(result, Err(DomainError::InvalidSelection(_))));
    }
}
