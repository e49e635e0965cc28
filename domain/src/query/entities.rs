//! Query entity and per-mode parameters.

use crate::core::error::DomainError;
use crate::core::model::Model;
use crate::core::question::Question;
use crate::query::mode::{ExecutionPolicy, Mode};
use crate::routing::router::TierOverrides;
use crate::routing::tier::Tier;
use serde::{Deserialize, Serialize};

/// Optional per-mode parameters. Unset fields fall back to the
/// orchestration defaults of the dispatcher.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct QueryParams {
    /// Explicit model per tier, preferred when usable
    pub tier_overrides: TierOverrides,
    /// Skip the complexity tier in Simple mode and request this tier
    pub force_tier: Option<Tier>,
    /// Explicit dialogue participants (Debate: exactly 2, Consensus: 3+)
    pub participants: Vec<Model>,
    /// Upper bound on dialogue turns
    pub max_turns: Option<usize>,
    /// Run the moderator analysis after a dialogue
    pub moderator: bool,
    /// Safety cap on moderator reasoning iterations
    pub moderator_max_iterations: Option<usize>,
    /// Benchmark execution policy
    pub benchmark_policy: Option<ExecutionPolicy>,
    /// Retrieve context artifacts before prompting
    pub use_context: bool,
    /// Token budget handed to the context retriever
    pub context_token_budget: Option<usize>,
    /// Generation limit per invocation
    pub max_tokens: Option<u32>,
    /// Sampling temperature per invocation
    pub temperature: Option<f32>,
}

/// A caller's request. Immutable once dispatch begins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Query {
    question: Question,
    mode: Mode,
    params: QueryParams,
}

impl Query {
    pub fn new(question: Question, mode: Mode) -> Self {
        Self {
            question,
            mode,
            params: QueryParams::default(),
        }
    }

    /// Build a query from raw text, rejecting blank input.
    pub fn parse(text: impl Into<String>, mode: Mode) -> Result<Self, DomainError> {
        Ok(Self::new(Question::new(text)?, mode))
    }

    pub fn with_params(mut self, params: QueryParams) -> Self {
        self.params = params;
        self
    }

    pub fn question(&self) -> &Question {
        &self.question
    }

    pub fn text(&self) -> &str {
        self.question.content()
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn params(&self) -> &QueryParams {
        &self.params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rejects_blank() {
        assert!(Query::parse("   ", Mode::Simple).is_err());
    }

    #[test]
    fn test_params_deserialize_camel_case_with_defaults() {
        let params: QueryParams = serde_json::from_str(
            r#"{"maxTurns": 4, "moderator": true, "tierOverrides": {"fast": "tiny"}}"#,
        )
        .unwrap();
        assert_eq!(params.max_turns, Some(4));
        assert!(params.moderator);
        assert_eq!(params.tier_overrides.get(&Tier::Fast), Some(&Model::new("tiny")));
        assert!(params.participants.is_empty());
    }

    #[test]
    fn test_query_accessors() {
        let query = Query::parse("Explain lifetimes", Mode::Debate)
            .unwrap()
            .with_params(QueryParams {
                max_turns: Some(2),
                ..Default::default()
            });
        assert_eq!(query.text(), "Explain lifetimes");
        assert_eq!(query.mode(), Mode::Debate);
        assert_eq!(query.params().max_turns, Some(2));
    }
}
