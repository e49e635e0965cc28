//! CLI command definitions

use clap::Parser;
use parley_domain::{ExecutionPolicy, Mode, Model, OutputFormat, QueryParams, Tier, TierOverrides};
use std::path::PathBuf;

/// CLI arguments for parley
#[derive(Parser, Debug)]
#[command(name = "parley")]
#[command(author, version, about = "Route questions across local LLMs: simple, two-stage, debate, consensus and benchmark modes")]
#[command(long_about = r#"
parley sends a question to one or more locally hosted models.

Modes:
  simple      One model picked by question complexity answers
  two-stage   A fast model drafts, a stronger model refines
  debate      Two models argue for and against, then synthesize
  consensus   Three or more models discuss until they converge
  benchmark   Every enabled model answers the same prompt

Configuration files are loaded from (in priority order):
1. PARLEY_* environment variables
2. --config <path>     Explicit config file
3. ./parley.toml       Project-level config
4. ~/.config/parley/config.toml   Global config

Example:
  parley "What is a monad?"
  parley -m two-stage --context "Explain the borrow checker"
  parley -m debate --moderator "Tabs or spaces?"
  parley -m benchmark --parallel -o full "Summarize RFC 2119"
"#)]
pub struct Cli {
    /// The question to ask
    pub question: Option<String>,

    /// Orchestration mode
    #[arg(short, long, default_value = "simple", value_name = "MODE")]
    pub mode: Mode,

    /// Force the tier used in simple mode
    #[arg(long, value_name = "TIER")]
    pub tier: Option<Tier>,

    /// Prefer a model for a tier (TIER=MODEL, repeatable)
    #[arg(long = "prefer", value_name = "TIER=MODEL")]
    pub prefer: Vec<String>,

    /// Dialogue participants (repeatable; defaults to the catalog)
    #[arg(short, long = "participant", value_name = "MODEL")]
    pub participants: Vec<String>,

    /// Upper bound on dialogue turns
    #[arg(long, value_name = "N")]
    pub max_turns: Option<usize>,

    /// Run the moderator analysis after a dialogue
    #[arg(long)]
    pub moderator: bool,

    /// Cap on moderator reasoning iterations
    #[arg(long, value_name = "N")]
    pub moderator_iterations: Option<usize>,

    /// Benchmark all candidates concurrently
    #[arg(long)]
    pub parallel: bool,

    /// Retrieve context for simple and benchmark modes
    #[arg(long)]
    pub context: bool,

    /// Token budget for retrieved context
    #[arg(long, value_name = "TOKENS")]
    pub context_budget: Option<usize>,

    /// Maximum tokens per model response
    #[arg(long, value_name = "TOKENS")]
    pub max_tokens: Option<u32>,

    /// Sampling temperature
    #[arg(long)]
    pub temperature: Option<f32>,

    /// Output format (answer, full, json)
    #[arg(short, long, value_name = "FORMAT")]
    pub output: Option<OutputFormat>,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long)]
    pub no_config: bool,

    /// Print the effective configuration and its sources, then exit
    #[arg(long)]
    pub show_config: bool,
}

impl Cli {
    /// Per-query parameters from the flags. Unset flags stay `None` so
    /// configured defaults apply.
    pub fn query_params(&self) -> Result<QueryParams, String> {
        Ok(QueryParams {
            tier_overrides: parse_overrides(&self.prefer)?,
            force_tier: self.tier,
            participants: self.participants.iter().map(|p| Model::new(p.trim())).collect(),
            max_turns: self.max_turns,
            moderator: self.moderator,
            moderator_max_iterations: self.moderator_iterations,
            benchmark_policy: self.parallel.then_some(ExecutionPolicy::Parallel),
            use_context: self.context,
            context_token_budget: self.context_budget,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        })
    }
}

fn parse_overrides(values: &[String]) -> Result<TierOverrides, String> {
    let mut overrides = TierOverrides::new();
    for value in values {
        let (tier, model) = value
            .split_once('=')
            .ok_or_else(|| format!("expected TIER=MODEL, got '{}'", value))?;
        let model = model.trim();
        if model.is_empty() {
            return Err(format!("missing model in '{}'", value));
        }
        overrides.insert(tier.parse::<Tier>()?, Model::new(model));
    }
    Ok(overrides)
}
