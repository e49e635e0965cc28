//! Orchestration parameters: dispatcher defaults.
//!
//! [`OrchestrationParams`] holds the values a query falls back to when its
//! own [`QueryParams`] leave a field unset. [`OrchestrationParams::merged`]
//! applies a query's overrides on top.

use parley_domain::{
    AgreementMarker, ConvergencePolicy, ExecutionPolicy, JaccardConvergence, NeverConverge,
    QueryParams, TierThresholds,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Which convergence policy consensus dialogues use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConvergenceStrategy {
    /// Word-set similarity between consecutive rounds
    #[default]
    Jaccard,
    /// Every participant emits the agreement marker
    Marker,
    /// Always run to the turn bound
    Never,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrchestrationParams {
    pub thresholds: TierThresholds,
    /// Upper bound on dialogue turns
    pub max_turns: usize,
    pub convergence: ConvergenceStrategy,
    /// Similarity threshold for [`ConvergenceStrategy::Jaccard`]
    pub convergence_threshold: f64,
    /// Hard safety cap on moderator reasoning iterations
    pub moderator_max_iterations: usize,
    /// Token budget handed to the context retriever
    pub context_token_budget: usize,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub benchmark_policy: ExecutionPolicy,
}

impl Default for OrchestrationParams {
    fn default() -> Self {
        Self {
            thresholds: TierThresholds::default(),
            max_turns: 6,
            convergence: ConvergenceStrategy::default(),
            convergence_threshold: JaccardConvergence::DEFAULT_THRESHOLD,
            moderator_max_iterations: 30,
            context_token_budget: 2048,
            max_tokens: Some(1024),
            temperature: Some(0.7),
            benchmark_policy: ExecutionPolicy::Serial,
        }
    }
}

impl OrchestrationParams {
    // ==================== Builder Methods ====================

    pub fn with_thresholds(mut self, thresholds: TierThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    pub fn with_max_turns(mut self, max: usize) -> Self {
        self.max_turns = max;
        self
    }

    pub fn with_convergence(mut self, strategy: ConvergenceStrategy) -> Self {
        self.convergence = strategy;
        self
    }

    pub fn with_convergence_threshold(mut self, threshold: f64) -> Self {
        self.convergence_threshold = threshold;
        self
    }

    pub fn with_moderator_max_iterations(mut self, max: usize) -> Self {
        self.moderator_max_iterations = max;
        self
    }

    pub fn with_context_token_budget(mut self, budget: usize) -> Self {
        self.context_token_budget = budget;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_benchmark_policy(mut self, policy: ExecutionPolicy) -> Self {
        self.benchmark_policy = policy;
        self
    }

    // ==================== Derived Values ====================

    /// These defaults with a query's explicit parameters applied on top.
    pub fn merged(&self, params: &QueryParams) -> Self {
        Self {
            thresholds: self.thresholds,
            max_turns: params.max_turns.unwrap_or(self.max_turns),
            convergence: self.convergence,
            convergence_threshold: self.convergence_threshold,
            moderator_max_iterations: params
                .moderator_max_iterations
                .unwrap_or(self.moderator_max_iterations),
            context_token_budget: params
                .context_token_budget
                .unwrap_or(self.context_token_budget),
            max_tokens: params.max_tokens.or(self.max_tokens),
            temperature: params.temperature.or(self.temperature),
            benchmark_policy: params.benchmark_policy.unwrap_or(self.benchmark_policy),
        }
    }

    /// Build the configured convergence policy.
    pub fn convergence_policy(&self) -> Arc<dyn ConvergencePolicy> {
        match self.convergence {
            ConvergenceStrategy::Jaccard => {
                Arc::new(JaccardConvergence::new(self.convergence_threshold))
            }
            ConvergenceStrategy::Marker => Arc::new(AgreementMarker::default()),
            ConvergenceStrategy::Never => Arc::new(NeverConverge),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        let params = OrchestrationParams::default();
        assert_eq!(params.max_turns, 6);
        assert_eq!(params.moderator_max_iterations, 30);
        assert_eq!(params.benchmark_policy, ExecutionPolicy::Serial);
        assert_eq!(params.convergence_policy().name(), "jaccard");
    }

    #[test]
    fn test_merged_prefers_query_values() {
        let defaults = OrchestrationParams::default().with_max_tokens(None);
        let query = QueryParams {
            max_turns: Some(2),
            max_tokens: Some(64),
            benchmark_policy: Some(ExecutionPolicy::Parallel),
            ..Default::default()
        };

        let merged = defaults.merged(&query);
        assert_eq!(merged.max_turns, 2);
        assert_eq!(merged.max_tokens, Some(64));
        assert_eq!(merged.benchmark_policy, ExecutionPolicy::Parallel);
        assert_eq!(merged.temperature, Some(0.7));
        assert_eq!(merged.context_token_budget, 2048);
    }

    #[test]
    fn test_builder_selects_policy() {
        let params = OrchestrationParams::default().with_convergence(ConvergenceStrategy::Never);
        assert_eq!(params.convergence_policy().name(), "never");
        let params = OrchestrationParams::default().with_convergence(ConvergenceStrategy::Marker);
        assert_eq!(params.convergence_policy().name(), "agreement-marker");
    }
}
