//! Domain layer for parley
//!
//! This crate contains the core types and policies of query orchestration.
//! It has no dependencies on infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Tiers and routing
//!
//! Every model belongs to a capability [`Tier`] (FAST / BALANCED / POWERFUL).
//! The [`ComplexityAssessor`] scores a query, [`TierThresholds`] map the score
//! to a tier, and the [`TierRouter`] resolves that tier to a concrete model in
//! an explicit per-query [`ModelCatalog`], falling back deterministically.
//!
//! ## Modes
//!
//! - **Simple**: one routed model answers
//! - **Two-Stage**: a FAST draft over retrieved context, refined by a stronger model
//! - **Consensus / Debate**: a bounded multi-turn [`DialogueState`] plus synthesis
//! - **Benchmark**: every usable model answers the same prompt

pub mod benchmark;
pub mod config;
pub mod core;
pub mod dialogue;
pub mod envelope;
pub mod moderator;
pub mod prompt;
pub mod query;
pub mod retrieval;
pub mod routing;
pub mod util;

// Re-export commonly used types
pub use benchmark::{BenchmarkReport, BenchmarkResult, BenchmarkSummary};
pub use config::OutputFormat;
pub use core::{error::DomainError, model::Model, question::Question, usage::TokenUsage};
pub use dialogue::{
    AgreementMarker, ConvergencePolicy, DialogueKind, DialoguePhase, DialogueState,
    JaccardConvergence, NeverConverge, Synthesis, TerminationReason, Turn, TurnRole,
};
pub use envelope::{ComponentFailure, ResponseEnvelope, ResponseMetadata, StageKind, StageResponse};
pub use moderator::{
    ModeratorAnalysis, ModeratorOutcome, Observation, ObservationKind, Side, SideNotes, Verdict,
    Winner,
    parse_observation,
};
pub use prompt::PromptTemplate;
pub use query::{ExecutionPolicy, Mode, Query, QueryParams};
pub use retrieval::{Artifact, render_context};
pub use routing::{
    CatalogEntry, ComplexityAssessor, ComplexityBreakdown, ComplexityScore, ModelCatalog,
    ModelSelection, SelectionRole, Tier, TierOverrides, TierRouter, TierThresholds,
    TwoStageSelection,
};
