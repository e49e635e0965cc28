//! Per-model benchmark outcomes and their aggregate summary.
//!
//! Latency statistics (mean, median) cover successful candidates only; a
//! failed candidate's elapsed time is usually a timeout and would skew them.

use crate::core::model::Model;
use crate::core::usage::TokenUsage;
use crate::query::mode::ExecutionPolicy;
use crate::routing::tier::Tier;
use serde::{Deserialize, Serialize};

/// Outcome of one benchmark candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BenchmarkResult {
    pub model: Model,
    pub tier: Tier,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub latency_ms: u64,
    pub usage: TokenUsage,
    pub estimated_cost: f64,
}

impl BenchmarkResult {
    pub fn success(
        model: Model,
        tier: Tier,
        response: impl Into<String>,
        latency_ms: u64,
        usage: TokenUsage,
        estimated_cost: f64,
    ) -> Self {
        Self {
            model,
            tier,
            success: true,
            response: Some(response.into()),
            error: None,
            latency_ms,
            usage,
            estimated_cost,
        }
    }

    pub fn failure(model: Model, tier: Tier, error: impl Into<String>, latency_ms: u64) -> Self {
        Self {
            model,
            tier,
            success: false,
            response: None,
            error: Some(error.into()),
            latency_ms,
            usage: TokenUsage::default(),
            estimated_cost: 0.0,
        }
    }
}

/// Aggregate over all candidates of one benchmark.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BenchmarkSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub average_latency_ms: f64,
    pub median_latency_ms: f64,
    pub total_usage: TokenUsage,
    pub total_estimated_cost: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fastest_model: Option<Model>,
    /// Policy the caller asked for
    pub requested_policy: ExecutionPolicy,
    /// Policy actually used (parallel may be downgraded on resource contention)
    pub policy: ExecutionPolicy,
    pub wall_time_ms: u64,
}

impl BenchmarkSummary {
    pub fn from_results(
        results: &[BenchmarkResult],
        requested_policy: ExecutionPolicy,
        policy: ExecutionPolicy,
        wall_time_ms: u64,
    ) -> Self {
        let successful: Vec<&BenchmarkResult> = results.iter().filter(|r| r.success).collect();

        let mut latencies: Vec<f64> = successful.iter().map(|r| r.latency_ms as f64).collect();
        latencies.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let average_latency_ms = if latencies.is_empty() {
            0.0
        } else {
            latencies.iter().sum::<f64>() / latencies.len() as f64
        };

        let median_latency_ms = match latencies.len() {
            0 => 0.0,
            n if n % 2 == 0 => (latencies[n / 2 - 1] + latencies[n / 2]) / 2.0,
            n => latencies[n / 2],
        };

        let fastest_model = successful
            .iter()
            .min_by_key(|r| r.latency_ms)
            .map(|r| r.model.clone());

        Self {
            total: results.len(),
            succeeded: successful.len(),
            failed: results.len() - successful.len(),
            average_latency_ms,
            median_latency_ms,
            total_usage: results.iter().map(|r| r.usage).sum(),
            total_estimated_cost: results.iter().map(|r| r.estimated_cost).sum(),
            fastest_model,
            requested_policy,
            policy,
            wall_time_ms,
        }
    }

    /// One-line human-readable summary.
    pub fn headline(&self) -> String {
        let mut line = format!(
            "{} models benchmarked ({}): {} succeeded, {} failed",
            self.total, self.policy, self.succeeded, self.failed
        );
        if let Some(fastest) = &self.fastest_model {
            line.push_str(&format!(
                "; fastest {}; median latency {:.0}ms",
                fastest, self.median_latency_ms
            ));
        }
        line
    }
}

/// Results plus summary of one benchmark run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkReport {
    pub results: Vec<BenchmarkResult>,
    pub summary: BenchmarkSummary,
}

impl BenchmarkReport {
    pub fn result_for(&self, model: &Model) -> Option<&BenchmarkResult> {
        self.results.iter().find(|r| &r.model == model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok(model: &str, latency: u64, tokens: u64) -> BenchmarkResult {
        BenchmarkResult::success(
            Model::new(model),
            Tier::Fast,
            "answer",
            latency,
            TokenUsage::new(tokens, 0),
            1.0,
        )
    }

    #[test]
    fn test_summary_counts_and_stats() {
        let results = vec![
            ok("a", 100, 10),
            ok("b", 300, 20),
            BenchmarkResult::failure(Model::new("c"), Tier::Powerful, "timeout", 30_000),
        ];
        let summary = BenchmarkSummary::from_results(
            &results,
            ExecutionPolicy::Parallel,
            ExecutionPolicy::Parallel,
            30_000,
        );
        assert_eq!(summary.total, 3);
        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.average_latency_ms, 200.0);
        assert_eq!(summary.median_latency_ms, 200.0);
        assert_eq!(summary.total_usage.total(), 30);
        assert_eq!(summary.total_estimated_cost, 2.0);
        assert_eq!(summary.fastest_model, Some(Model::new("a")));
    }

    #[test]
    fn test_median_odd_count() {
        let results = vec![ok("a", 10, 0), ok("b", 50, 0), ok("c", 20, 0)];
        let summary = BenchmarkSummary::from_results(
            &results,
            ExecutionPolicy::Serial,
            ExecutionPolicy::Serial,
            80,
        );
        assert_eq!(summary.median_latency_ms, 20.0);
    }

    #[test]
    fn test_all_failed_summary() {
        let results = vec![BenchmarkResult::failure(
            Model::new("a"),
            Tier::Fast,
            "down",
            5,
        )];
        let summary = BenchmarkSummary::from_results(
            &results,
            ExecutionPolicy::Serial,
            ExecutionPolicy::Serial,
            5,
        );
        assert_eq!(summary.succeeded, 0);
        assert_eq!(summary.average_latency_ms, 0.0);
        assert!(summary.fastest_model.is_none());
        assert!(summary.headline().contains("0 succeeded, 1 failed"));
    }
}
