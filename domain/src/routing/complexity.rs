//! Query complexity scoring.
//!
//! Derives a [`ComplexityScore`] in `0.0..=10.0` from lightweight text
//! features. The score feeds [`TierThresholds`](super::tier::TierThresholds).
//!
//! ## Signals
//!
//! | Signal | Contribution |
//! |--------|--------------|
//! | Length | +1 over 40 words, +2 over 120, +3 over 300 |
//! | Multi-part questions | +1.5 for 2 question marks, +2 for 3 or more |
//! | Enumerated steps | +1.5 for 2 or more numbered/bulleted lines |
//! | Code blocks | +1.5 when a fenced block is present |
//! | Domain keywords | +0.75 per distinct keyword, capped at +3 |
//!
//! The raw sum is clamped to `[0.0, 10.0]`.

use serde::{Deserialize, Serialize};

/// Upper bound of the score scale.
pub const MAX_SCORE: f64 = 10.0;

const DOMAIN_KEYWORDS: &[&str] = &[
    "analyze",
    "analyse",
    "compare",
    "contrast",
    "prove",
    "derive",
    "architecture",
    "algorithm",
    "trade-off",
    "tradeoff",
    "optimize",
    "optimise",
    "evaluate",
    "design",
    "concurrency",
    "distributed",
    "theorem",
    "complexity",
    "security",
    "implications",
    "step-by-step",
];

/// Numeric complexity estimate of a query, clamped to `0.0..=10.0`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComplexityScore(f64);

impl ComplexityScore {
    /// Create a score, clamping into the valid range. NaN maps to zero.
    pub fn new(value: f64) -> Self {
        if value.is_nan() {
            return Self(0.0);
        }
        Self(value.clamp(0.0, MAX_SCORE))
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

impl std::fmt::Display for ComplexityScore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.1}", self.0)
    }
}

/// Per-signal contributions of an assessment, for logging and provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplexityBreakdown {
    pub length: f64,
    pub multi_part: f64,
    pub enumerated_steps: f64,
    pub code_blocks: f64,
    pub domain_keywords: f64,
    pub total: ComplexityScore,
}

/// Stateless scorer for query text.
#[derive(Debug, Clone, Default)]
pub struct ComplexityAssessor;

impl ComplexityAssessor {
    pub fn new() -> Self {
        Self
    }

    /// Score a query.
    pub fn assess(&self, text: &str) -> ComplexityScore {
        self.breakdown(text).total
    }

    /// Score a query and report every signal's contribution.
    pub fn breakdown(&self, text: &str) -> ComplexityBreakdown {
        let length = length_signal(text);
        let multi_part = multi_part_signal(text);
        let enumerated_steps = enumerated_steps_signal(text);
        let code_blocks = code_block_signal(text);
        let domain_keywords = domain_keyword_signal(text);

        ComplexityBreakdown {
            length,
            multi_part,
            enumerated_steps,
            code_blocks,
            domain_keywords,
            total: ComplexityScore::new(
                length + multi_part + enumerated_steps + code_blocks + domain_keywords,
            ),
        }
    }
}

// ==================== Signals ====================

fn length_signal(text: &str) -> f64 {
    match text.split_whitespace().count() {
        n if n > 300 => 3.0,
        n if n > 120 => 2.0,
        n if n > 40 => 1.0,
        _ => 0.0,
    }
}

fn multi_part_signal(text: &str) -> f64 {
    match text.matches('?').count() {
        n if n >= 3 => 2.0,
        2 => 1.5,
        _ => 0.0,
    }
}

fn enumerated_steps_signal(text: &str) -> f64 {
    let items = text
        .lines()
        .map(str::trim_start)
        .filter(|line| is_enumerated_item(line))
        .count();
    if items >= 2 { 1.5 } else { 0.0 }
}

/// `1. foo`, `12) foo`, `- foo`, `* foo`
fn is_enumerated_item(line: &str) -> bool {
    if line.starts_with("- ") || line.starts_with("* ") {
        return true;
    }
    let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();
    digits > 0 && matches!(line[digits..].chars().next(), Some('.') | Some(')'))
}

fn code_block_signal(text: &str) -> f64 {
    if text.contains("```") { 1.5 } else { 0.0 }
}

fn domain_keyword_signal(text: &str) -> f64 {
    let lower = text.to_lowercase();
    let hits = DOMAIN_KEYWORDS
        .iter()
        .filter(|keyword| lower.contains(*keyword))
        .count();
    (hits as f64 * 0.75).min(3.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::tier::{Tier, TierThresholds};

    #[test]
    fn test_trivial_query_scores_zero() {
        let score = ComplexityAssessor::new().assess("What is 2 + 2");
        assert_eq!(score.value(), 0.0);
        assert_eq!(TierThresholds::default().tier_for(score), Tier::Fast);
    }

    #[test]
    fn test_score_is_clamped() {
        assert_eq!(ComplexityScore::new(42.0).value(), MAX_SCORE);
        assert_eq!(ComplexityScore::new(-1.0).value(), 0.0);
        assert_eq!(ComplexityScore::new(f64::NAN).value(), 0.0);
    }

    #[test]
    fn test_multi_part_and_keywords_reach_balanced() {
        let text = "Compare the two designs. Which one scales better? Why?";
        let breakdown = ComplexityAssessor::new().breakdown(text);
        assert_eq!(breakdown.multi_part, 1.5);
        // "compare" + "design"
        assert_eq!(breakdown.domain_keywords, 1.5);
        assert_eq!(
            TierThresholds::default().tier_for(breakdown.total),
            Tier::Balanced
        );
    }

    #[test]
    fn test_complex_query_reaches_powerful() {
        let filler = "context ".repeat(130);
        let text = format!(
            "Analyze the architecture below and evaluate the security implications.\n\
             1. Derive the algorithm complexity\n\
             2. Compare concurrency trade-off options\n\
             ```rust\nfn main() {{}}\n```\n\
             What breaks first? What would you change? Why? {}",
            filler
        );
        let breakdown = ComplexityAssessor::new().breakdown(&text);
        assert_eq!(breakdown.length, 2.0);
        assert_eq!(breakdown.enumerated_steps, 1.5);
        assert_eq!(breakdown.code_blocks, 1.5);
        assert_eq!(breakdown.domain_keywords, 3.0);
        assert!(breakdown.total.value() >= 7.0);
        assert_eq!(
            TierThresholds::default().tier_for(breakdown.total),
            Tier::Powerful
        );
    }

    #[test]
    fn test_enumerated_item_detection() {
        assert!(is_enumerated_item("1. first"));
        assert!(is_enumerated_item("12) twelfth"));
        assert!(is_enumerated_item("- bullet"));
        assert!(!is_enumerated_item("2024 was a year"));
        assert!(!is_enumerated_item("plain text"));
    }

    #[test]
    fn test_assess_is_deterministic() {
        let assessor = ComplexityAssessor::new();
        let text = "Design a distributed cache? Explain eviction?";
        assert_eq!(assessor.assess(text), assessor.assess(text));
    }
}
