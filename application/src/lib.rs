//! Application layer for parley
//!
//! This crate contains use cases, port definitions, and application configuration.
//! It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use config::{ConvergenceStrategy, OrchestrationParams};
pub use ports::{
    context_retriever::{ContextRetriever, NoContext, RetrievalError},
    conversation_logger::{ConversationEvent, ConversationLogger, NoConversationLogger},
    model_invoker::{Completion, InvocationError, InvocationRequest, ModelInvoker},
    progress::{NoProgress, Phase, ProgressNotifier},
    reasoning::{ReasoningEngine, ReasoningError, ReasoningStep, UnavailableReasoning},
};
pub use use_cases::dispatch_query::{DispatchError, QueryDispatcher};
pub use use_cases::moderate::Moderator;
pub use use_cases::run_benchmark::{BenchmarkCandidate, BenchmarkCoordinator, BenchmarkInput};
pub use use_cases::run_dialogue::{DialogueEngine, DialogueInput};
pub use use_cases::run_stages::{RetrievedContext, StageLimits, StageOutcome, StagePipeline};
