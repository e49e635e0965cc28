//! Capability tiers and the score → tier threshold table.

use crate::routing::complexity::ComplexityScore;
use serde::{Deserialize, Serialize};

/// Capability class of a model, trading speed for quality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Fast,
    Balanced,
    Powerful,
}

impl Tier {
    /// All tiers, weakest first.
    pub const ALL: [Tier; 3] = [Tier::Fast, Tier::Balanced, Tier::Powerful];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Fast => "fast",
            Tier::Balanced => "balanced",
            Tier::Powerful => "powerful",
        }
    }

    /// Deterministic order in which tiers are tried when this tier has no
    /// usable model.
    ///
    /// Stronger requests degrade downward first; a FAST request can only
    /// escalate upward.
    ///
    /// | Requested | Chain |
    /// |-----------|-------|
    /// | powerful  | powerful → balanced → fast |
    /// | balanced  | balanced → fast → powerful |
    /// | fast      | fast → balanced → powerful |
    pub fn fallback_chain(&self) -> [Tier; 3] {
        match self {
            Tier::Powerful => [Tier::Powerful, Tier::Balanced, Tier::Fast],
            Tier::Balanced => [Tier::Balanced, Tier::Fast, Tier::Powerful],
            Tier::Fast => [Tier::Fast, Tier::Balanced, Tier::Powerful],
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Tier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fast" => Ok(Tier::Fast),
            "balanced" => Ok(Tier::Balanced),
            "powerful" => Ok(Tier::Powerful),
            other => Err(format!(
                "unknown tier '{}' (expected fast, balanced or powerful)",
                other
            )),
        }
    }
}

/// Fixed threshold table mapping a complexity score to a tier.
///
/// `score < balanced` → FAST, `balanced <= score < powerful` → BALANCED,
/// `score >= powerful` → POWERFUL.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TierThresholds {
    pub balanced: f64,
    pub powerful: f64,
}

impl Default for TierThresholds {
    fn default() -> Self {
        Self {
            balanced: 3.0,
            powerful: 7.0,
        }
    }
}

impl TierThresholds {
    /// Map a score to a tier. Pure function of the score and the table.
    pub fn tier_for(&self, score: ComplexityScore) -> Tier {
        let value = score.value();
        if value >= self.powerful {
            Tier::Powerful
        } else if value >= self.balanced {
            Tier::Balanced
        } else {
            Tier::Fast
        }
    }

    /// Thresholds must be finite and strictly increasing.
    pub fn is_valid(&self) -> bool {
        self.balanced.is_finite() && self.powerful.is_finite() && self.balanced < self.powerful
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tier(value: f64) -> Tier {
        TierThresholds::default().tier_for(ComplexityScore::new(value))
    }

    #[test]
    fn test_threshold_boundaries() {
        assert_eq!(tier(0.0), Tier::Fast);
        assert_eq!(tier(2.99), Tier::Fast);
        assert_eq!(tier(3.0), Tier::Balanced);
        assert_eq!(tier(6.99), Tier::Balanced);
        assert_eq!(tier(7.0), Tier::Powerful);
        assert_eq!(tier(8.2), Tier::Powerful);
        assert_eq!(tier(10.0), Tier::Powerful);
    }

    #[test]
    fn test_tier_for_is_deterministic() {
        let thresholds = TierThresholds::default();
        for step in 0..=100 {
            let score = ComplexityScore::new(step as f64 / 10.0);
            assert_eq!(thresholds.tier_for(score), thresholds.tier_for(score));
        }
    }

    #[test]
    fn test_fallback_chains() {
        assert_eq!(
            Tier::Powerful.fallback_chain(),
            [Tier::Powerful, Tier::Balanced, Tier::Fast]
        );
        assert_eq!(
            Tier::Fast.fallback_chain(),
            [Tier::Fast, Tier::Balanced, Tier::Powerful]
        );
        assert_eq!(Tier::Balanced.fallback_chain()[0], Tier::Balanced);
    }

    #[test]
    fn test_tier_parse_and_serde() {
        assert_eq!("POWERFUL".parse::<Tier>().unwrap(), Tier::Powerful);
        assert!("huge".parse::<Tier>().is_err());
        assert_eq!(serde_json::to_string(&Tier::Balanced).unwrap(), "\"balanced\"");
    }

    #[test]
    fn test_threshold_validity() {
        assert!(TierThresholds::default().is_valid());
        let inverted = TierThresholds {
            balanced: 7.0,
            powerful: 3.0,
        };
        assert!(!inverted.is_valid());
    }
}
