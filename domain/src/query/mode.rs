//! Processing modes and benchmark execution policies.

use serde::{Deserialize, Serialize};

/// Strategy the dispatcher applies to a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Mode {
    /// One complexity-routed model answers directly
    #[default]
    Simple,
    /// FAST draft with retrieved context, refined by a stronger model
    TwoStage,
    /// Several models converge toward agreement over multiple turns
    Consensus,
    /// Two models argue opposing positions, then one synthesizes
    Debate,
    /// Every usable model answers the same prompt for comparison
    Benchmark,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Simple => "simple",
            Mode::TwoStage => "two-stage",
            Mode::Consensus => "consensus",
            Mode::Debate => "debate",
            Mode::Benchmark => "benchmark",
        }
    }

    /// Modes that run the dialogue engine.
    pub fn is_dialogue(&self) -> bool {
        matches!(self, Mode::Consensus | Mode::Debate)
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "simple" => Ok(Mode::Simple),
            "two-stage" | "two_stage" | "twostage" => Ok(Mode::TwoStage),
            "consensus" => Ok(Mode::Consensus),
            "debate" => Ok(Mode::Debate),
            "benchmark" => Ok(Mode::Benchmark),
            other => Err(format!("unknown mode '{}'", other)),
        }
    }
}

/// How benchmark candidates are invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionPolicy {
    /// One model at a time; required when backends share a constrained resource
    #[default]
    Serial,
    /// All invocations issued before any is awaited
    Parallel,
}

impl ExecutionPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionPolicy::Serial => "serial",
            ExecutionPolicy::Parallel => "parallel",
        }
    }
}

impl std::fmt::Display for ExecutionPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
