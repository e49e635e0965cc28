//! Response envelope and per-mode metadata.
//!
//! Every field serializes in camelCase, whatever the internal naming.

use crate::benchmark::BenchmarkReport;
use crate::core::model::Model;
use crate::core::usage::TokenUsage;
use crate::dialogue::DialogueState;
use crate::moderator::ModeratorOutcome;
use crate::query::mode::Mode;
use crate::routing::complexity::ComplexityBreakdown;
use crate::routing::selection::ModelSelection;
use serde::{Deserialize, Serialize};

/// Position of a single-model stage within its pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageKind {
    /// The only stage of a Simple query
    Answer,
    /// Two-Stage stage 1
    Draft,
    /// Two-Stage stage 2
    Refine,
}

impl StageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StageKind::Answer => "answer",
            StageKind::Draft => "draft",
            StageKind::Refine => "refine",
        }
    }
}

impl std::fmt::Display for StageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of one model invocation inside a stage pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageResponse {
    pub stage: StageKind,
    pub selection: ModelSelection,
    pub text: String,
    pub usage: TokenUsage,
    pub latency_ms: u64,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StageResponse {
    pub fn success(
        stage: StageKind,
        selection: ModelSelection,
        text: impl Into<String>,
        usage: TokenUsage,
        latency_ms: u64,
    ) -> Self {
        Self {
            stage,
            selection,
            text: text.into(),
            usage,
            latency_ms,
            success: true,
            error: None,
        }
    }

    pub fn failure(
        stage: StageKind,
        selection: ModelSelection,
        error: impl Into<String>,
        latency_ms: u64,
    ) -> Self {
        Self {
            stage,
            selection,
            text: String::new(),
            usage: TokenUsage::default(),
            latency_ms,
            success: false,
            error: Some(error.into()),
        }
    }
}

/// A failure absorbed somewhere in the pipeline, kept for provenance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentFailure {
    /// Component that failed, e.g. `"dialogue"`, `"benchmark"`, `"retrieval"`
    pub component: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<Model>,
    pub message: String,
}

impl ComponentFailure {
    pub fn new(component: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            model: None,
            message: message.into(),
        }
    }

    pub fn with_model(mut self, model: Model) -> Self {
        self.model = Some(model);
        self
    }
}

impl std::fmt::Display for ComponentFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.model {
            Some(model) => write!(f, "{} ({}): {}", self.component, model, self.message),
            None => write!(f, "{}: {}", self.component, self.message),
        }
    }
}

/// Mode-specific provenance attached to an envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ResponseMetadata {
    #[serde(rename_all = "camelCase")]
    Simple {
        stage: StageResponse,
        context_sources: Vec<String>,
    },
    #[serde(rename_all = "camelCase")]
    TwoStage {
        stages: Vec<StageResponse>,
        context_sources: Vec<String>,
    },
    #[serde(rename_all = "camelCase")]
    Dialogue {
        dialogue: DialogueState,
        moderator: ModeratorOutcome,
    },
    #[serde(rename_all = "camelCase")]
    Benchmark {
        report: BenchmarkReport,
        context_sources: Vec<String>,
    },
}

impl ResponseMetadata {
    pub fn dialogue(&self) -> Option<&DialogueState> {
        match self {
            ResponseMetadata::Dialogue { dialogue, .. } => Some(dialogue),
            _ => None,
        }
    }

    pub fn moderator(&self) -> Option<&ModeratorOutcome> {
        match self {
            ResponseMetadata::Dialogue { moderator, .. } => Some(moderator),
            _ => None,
        }
    }

    pub fn benchmark(&self) -> Option<&BenchmarkReport> {
        match self {
            ResponseMetadata::Benchmark { report, .. } => Some(report),
            _ => None,
        }
    }

    pub fn stages(&self) -> &[StageResponse] {
        match self {
            ResponseMetadata::Simple { stage, .. } => std::slice::from_ref(stage),
            ResponseMetadata::TwoStage { stages, .. } => stages,
            _ => &[],
        }
    }
}

/// Result of one dispatched query. Built once, never modified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseEnvelope {
    /// Primary answer text
    pub answer: String,
    pub mode: Mode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub complexity: Option<ComplexityBreakdown>,
    pub metadata: ResponseMetadata,
    /// Failures absorbed while still producing an answer
    pub failures: Vec<ComponentFailure>,
    /// Sum of time spent in every sub-stage
    pub processing_ms: u64,
    /// Wall-clock time of the whole dispatch
    pub elapsed_ms: u64,
}

impl ResponseEnvelope {
    pub fn is_degraded(&self) -> bool {
        !self.failures.is_empty()
    }
}
