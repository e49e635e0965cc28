//! Orchestration defaults from TOML (`[orchestration]` section)

use parley_application::{ConvergenceStrategy, OrchestrationParams};
use parley_domain::{ExecutionPolicy, TierThresholds};
use serde::{Deserialize, Serialize};

/// Defaults applied to every query unless the query overrides them.
///
/// # Example
///
/// ```toml
/// [orchestration]
/// max_turns = 8
/// convergence = "marker"
/// benchmark_policy = "parallel"
///
/// [orchestration.thresholds]
/// balanced = 2.5
/// powerful = 6.0
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileOrchestrationConfig {
    pub max_turns: usize,
    pub convergence: ConvergenceStrategy,
    pub convergence_threshold: f64,
    pub moderator_max_iterations: usize,
    pub context_token_budget: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    pub benchmark_policy: ExecutionPolicy,
    pub thresholds: TierThresholds,
}

impl Default for FileOrchestrationConfig {
    fn default() -> Self {
        let params = OrchestrationParams::default();
        Self {
            max_turns: params.max_turns,
            convergence: params.convergence,
            convergence_threshold: params.convergence_threshold,
            moderator_max_iterations: params.moderator_max_iterations,
            context_token_budget: params.context_token_budget,
            max_tokens: params.max_tokens,
            temperature: params.temperature,
            benchmark_policy: params.benchmark_policy,
            thresholds: params.thresholds,
        }
    }
}

impl FileOrchestrationConfig {
    pub fn to_params(&self) -> OrchestrationParams {
        OrchestrationParams::default()
            .with_thresholds(self.thresholds)
            .with_max_turns(self.max_turns)
            .with_convergence(self.convergence)
            .with_convergence_threshold(self.convergence_threshold)
            .with_moderator_max_iterations(self.moderator_max_iterations)
            .with_context_token_budget(self.context_token_budget)
            .with_max_tokens(self.max_tokens)
            .with_temperature(self.temperature)
            .with_benchmark_policy(self.benchmark_policy)
    }
}
