//! Moderator analysis result types.

use crate::moderator::parsing::{ObservationKind, Side, parse_observation};
use crate::routing::selection::ModelSelection;
use serde::{Deserialize, Serialize};

/// Observations grouped by the side they concern.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SideNotes {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pro: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub con: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub general: Vec<String>,
}

impl SideNotes {
    fn push(&mut self, side: Side, text: String) {
        match side {
            Side::Pro => self.pro.push(text),
            Side::Con => self.con.push(text),
            Side::General => self.general.push(text),
        }
    }

    pub fn len(&self) -> usize {
        self.pro.len() + self.con.len() + self.general.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Winner {
    Pro,
    Con,
    Draw,
}

impl Winner {
    pub fn as_str(&self) -> &'static str {
        match self {
            Winner::Pro => "pro",
            Winner::Con => "con",
            Winner::Draw => "draw",
        }
    }
}

impl std::fmt::Display for Winner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Winner judgment. The last verdict of the reasoning run stands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub winner: Winner,
    pub rationale: String,
}

impl Verdict {
    /// Parse a verdict body such as `PRO - stronger evidence`.
    pub fn parse(body: &str) -> Option<Self> {
        let body = body.trim();
        let first = body
            .split(|c: char| !c.is_ascii_alphabetic())
            .find(|w| !w.is_empty())?;
        let winner = match first.to_ascii_uppercase().as_str() {
            "PRO" | "FOR" => Winner::Pro,
            "CON" | "AGAINST" => Winner::Con,
            "DRAW" | "TIE" | "NONE" => Winner::Draw,
            _ => return None,
        };
        let start = body.find(first).unwrap_or(0) + first.len();
        let rationale = body[start..]
            .trim_start_matches(|c: char| c.is_whitespace() || matches!(c, '-' | '—' | ':' | ',' | '.'))
            .trim()
            .to_string();
        Some(Self { winner, rationale })
    }
}

/// Structured breakdown of a completed dialogue.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModeratorAnalysis {
    pub strengths: SideNotes,
    pub weaknesses: SideNotes,
    pub fallacies: Vec<String>,
    pub rhetorical_notes: Vec<String>,
    pub gaps: Vec<String>,
    pub verdict: Option<Verdict>,
    pub notes: Vec<String>,
    /// Raw thoughts in the order they were produced
    pub reasoning_transcript: Vec<String>,
    /// Iterations consumed
    pub reasoning_steps: usize,
    /// Whether the safety cap stopped the loop before the reasoner finished
    pub hit_iteration_cap: bool,
    /// Catalogued model backing the reasoner, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub moderator: Option<ModelSelection>,
}

impl ModeratorAnalysis {
    /// Fold raw thoughts into a breakdown.
    pub fn from_thoughts(thoughts: Vec<String>, hit_iteration_cap: bool) -> Self {
        let mut analysis = Self {
            reasoning_steps: thoughts.len(),
            hit_iteration_cap,
            ..Default::default()
        };

        for thought in &thoughts {
            let observation = parse_observation(thought);
            match observation.kind {
                ObservationKind::Strength => {
                    analysis.strengths.push(observation.side, observation.text)
                }
                ObservationKind::Weakness => {
                    analysis.weaknesses.push(observation.side, observation.text)
                }
                ObservationKind::Fallacy => analysis.fallacies.push(observation.text),
                ObservationKind::Rhetoric => analysis.rhetorical_notes.push(observation.text),
                ObservationKind::Gap => analysis.gaps.push(observation.text),
                ObservationKind::Verdict => match Verdict::parse(&observation.text) {
                    Some(verdict) => analysis.verdict = Some(verdict),
                    None => analysis.notes.push(observation.text),
                },
                ObservationKind::Note => analysis.notes.push(observation.text),
            }
        }

        analysis.reasoning_transcript = thoughts;
        analysis
    }
}

/// Result of the optional moderator pass.
///
/// An unavailable reasoner is an expected outcome, not an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "status")]
pub enum ModeratorOutcome {
    /// Not requested for this query
    Skipped,
    /// Requested, but the reasoning capability was unavailable or failed
    Unavailable { reason: String },
    /// Analysis produced
    Produced { analysis: ModeratorAnalysis },
}

impl ModeratorOutcome {
    pub fn analysis(&self) -> Option<&ModeratorAnalysis> {
        match self {
            ModeratorOutcome::Produced { analysis } => Some(analysis),
            _ => None,
        }
    }

    pub fn is_produced(&self) -> bool {
        matches!(self, ModeratorOutcome::Produced { .. })
    }
}
