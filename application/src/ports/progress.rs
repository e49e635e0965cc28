//! Progress notification port
//!
//! Defines the interface for reporting progress while a query is dispatched.

use parley_domain::{BenchmarkResult, ExecutionPolicy, Model, TerminationReason, Turn};

/// Coarse phases a dispatch moves through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Retrieval,
    Answer,
    Draft,
    Refine,
    Dialogue,
    Synthesis,
    Moderator,
    Benchmark,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Retrieval => "retrieval",
            Phase::Answer => "answer",
            Phase::Draft => "draft",
            Phase::Refine => "refine",
            Phase::Dialogue => "dialogue",
            Phase::Synthesis => "synthesis",
            Phase::Moderator => "moderator",
            Phase::Benchmark => "benchmark",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Callback for progress updates during dispatch
///
/// Implementations live in the presentation layer and can display
/// progress in various ways (console, web UI, etc.)
pub trait ProgressNotifier: Send + Sync {
    /// Called when a phase starts
    fn on_phase_start(&self, phase: Phase, total_tasks: usize);

    /// Called when a task completes within a phase
    fn on_task_complete(&self, phase: Phase, model: &Model, success: bool);

    /// Called when a phase completes
    fn on_phase_complete(&self, phase: Phase);

    // ==================== Dialogue Callbacks ====================

    /// Called after each dialogue turn is appended.
    fn on_turn(&self, _turn: &Turn, _max_turns: usize) {}

    /// Called once when the dialogue stops taking turns.
    fn on_dialogue_terminated(&self, _reason: TerminationReason) {}

    // ==================== Benchmark Callbacks ====================

    /// Called when a benchmark starts with the policy actually used.
    fn on_benchmark_start(&self, _candidates: usize, _policy: ExecutionPolicy) {}

    /// Called as each candidate's result becomes available.
    fn on_candidate_complete(&self, _result: &BenchmarkResult) {}
}

/// No-op progress notifier for when progress reporting is not needed
pub struct NoProgress;

impl ProgressNotifier for NoProgress {
    fn on_phase_start(&self, _phase: Phase, _total_tasks: usize) {}
    fn on_task_complete(&self, _phase: Phase, _model: &Model, _success: bool) {}
    fn on_phase_complete(&self, _phase: Phase) {}
}
