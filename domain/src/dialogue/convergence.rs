//! Pluggable "consensus detected" policies.
//!
//! The dialogue engine asks its policy after every completed round whether
//! the participants have converged. Policies must be deterministic: the same
//! transcript always yields the same answer.
//!
//! | Policy | Converged when |
//! |--------|----------------|
//! | [`JaccardConvergence`] | mean word-set overlap between each participant's last two responses reaches the threshold |
//! | [`AgreementMarker`] | every participant's latest response carries the agreement marker |
//! | [`NeverConverge`] | never; the dialogue always runs to its turn bound |

use crate::dialogue::state::DialogueState;
use crate::dialogue::turn::Turn;
use std::collections::HashSet;

/// Decides whether a dialogue has converged.
pub trait ConvergencePolicy: Send + Sync + std::fmt::Debug {
    /// Short identifier reported in metadata.
    fn name(&self) -> &'static str;

    /// Called after each completed round.
    fn has_converged(&self, state: &DialogueState) -> bool;
}

/// Word-set similarity between consecutive rounds.
///
/// For every participant that answered successfully in both of the last two
/// completed rounds, the Jaccard index of the two responses' word sets is
/// computed; the dialogue converges when their mean reaches `threshold`.
/// Needs at least two completed rounds and one comparable participant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JaccardConvergence {
    pub threshold: f64,
}

impl JaccardConvergence {
    pub const DEFAULT_THRESHOLD: f64 = 0.75;

    pub fn new(threshold: f64) -> Self {
        Self {
            threshold: threshold.clamp(0.0, 1.0),
        }
    }

    /// Mean similarity of the last two completed rounds, if comparable.
    pub fn round_similarity(&self, state: &DialogueState) -> Option<f64> {
        let rounds = state.completed_rounds();
        if rounds < 2 {
            return None;
        }

        let previous: Vec<&Turn> = state.round_turns(rounds - 1).collect();
        let latest: Vec<&Turn> = state.round_turns(rounds).collect();

        let scores: Vec<f64> = latest
            .iter()
            .filter(|t| t.success)
            .filter_map(|current| {
                previous
                    .iter()
                    .find(|p| p.success && p.speaker == current.speaker)
                    .map(|p| jaccard_similarity(&p.response, &current.response))
            })
            .collect();

        if scores.is_empty() {
            return None;
        }
        Some(scores.iter().sum::<f64>() / scores.len() as f64)
    }
}

impl Default for JaccardConvergence {
    fn default() -> Self {
        Self::new(Self::DEFAULT_THRESHOLD)
    }
}

impl ConvergencePolicy for JaccardConvergence {
    fn name(&self) -> &'static str {
        "jaccard"
    }

    fn has_converged(&self, state: &DialogueState) -> bool {
        self.round_similarity(state)
            .is_some_and(|similarity| similarity >= self.threshold)
    }
}

/// Explicit agreement: every participant's latest turn in the last completed
/// round succeeded and contains the marker (case-insensitive).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgreementMarker {
    pub marker: String,
}

impl AgreementMarker {
    pub const DEFAULT_MARKER: &'static str = "CONSENSUS REACHED";

    pub fn new(marker: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
        }
    }
}

impl Default for AgreementMarker {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MARKER)
    }
}

impl ConvergencePolicy for AgreementMarker {
    fn name(&self) -> &'static str {
        "agreement-marker"
    }

    fn has_converged(&self, state: &DialogueState) -> bool {
        let rounds = state.completed_rounds();
        if rounds == 0 {
            return false;
        }
        let marker = self.marker.to_uppercase();
        let mut latest = state.round_turns(rounds).peekable();
        latest.peek().is_some()
            && latest.all(|t| t.success && t.response.to_uppercase().contains(&marker))
    }
}

/// Never converges.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NeverConverge;

impl ConvergencePolicy for NeverConverge {
    fn name(&self) -> &'static str {
        "never"
    }

    fn has_converged(&self, _state: &DialogueState) -> bool {
        false
    }
}

/// Jaccard index of two texts over normalised (lowercase, alphanumeric)
/// word sets. Two empty texts are identical.
pub fn jaccard_similarity(a: &str, b: &str) -> f64 {
    let set_a = word_set(a);
    let set_b = word_set(b);
    if set_a.is_empty() && set_b.is_empty() {
        return 1.0;
    }
    let intersection = set_a.intersection(&set_b).count();
    let union = set_a.union(&set_b).count();
    intersection as f64 / union as f64
}

fn word_set(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}
