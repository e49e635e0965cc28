//! Observation parsing for moderator thoughts.
//!
//! The moderator asks its reasoner to prefix every thought with a tag. This
//! module recovers the tag, the side it concerns and the body. Pure text
//! handling, no I/O.
//!
//! | Tag | Example |
//! |-----|---------|
//! | `STRENGTH` | `STRENGTH (PRO): cites measured latency numbers` |
//! | `WEAKNESS` | `WEAKNESS [con]: ignores the migration cost` |
//! | `FALLACY` | `FALLACY: slippery slope in turn 4` |
//! | `RHETORIC` | `RHETORIC: appeal to authority` |
//! | `GAP` | `GAP: nobody addressed memory usage` |
//! | `VERDICT` | `VERDICT: PRO - stronger evidence throughout` |
//!
//! Anything else becomes a [`ObservationKind::Note`].

use serde::{Deserialize, Serialize};

/// Which side of a dialogue an observation concerns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Pro,
    Con,
    General,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObservationKind {
    Strength,
    Weakness,
    Fallacy,
    Rhetoric,
    Gap,
    Verdict,
    Note,
}

/// One parsed moderator thought.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation {
    pub kind: ObservationKind,
    pub side: Side,
    pub text: String,
}

/// Parse one raw thought into an observation.
pub fn parse_observation(thought: &str) -> Observation {
    let trimmed = thought.trim();
    let note = || Observation {
        kind: ObservationKind::Note,
        side: Side::General,
        text: trimmed.to_string(),
    };

    let Some((head, body)) = trimmed.split_once(':') else {
        return note();
    };

    let head_upper = head.trim().to_uppercase();
    let tag = head_upper
        .split(|c: char| c.is_whitespace() || c == '(' || c == '[')
        .next()
        .unwrap_or_default();

    let kind = match tag.trim_matches(['*', '#', '-', ' ']) {
        "STRENGTH" => ObservationKind::Strength,
        "WEAKNESS" => ObservationKind::Weakness,
        "FALLACY" => ObservationKind::Fallacy,
        "RHETORIC" => ObservationKind::Rhetoric,
        "GAP" => ObservationKind::Gap,
        "VERDICT" => ObservationKind::Verdict,
        _ => return note(),
    };

    let side = side_of(&head_upper);
    Observation {
        kind,
        side,
        text: body.trim().to_string(),
    }
}

fn side_of(head_upper: &str) -> Side {
    let words: Vec<&str> = head_upper
        .split(|c: char| !c.is_ascii_alphabetic())
        .filter(|w| !w.is_empty())
        .collect();
    if words.iter().skip(1).any(|w| *w == "PRO" || *w == "FOR") {
        Side::Pro
    } else if words.iter().skip(1).any(|w| *w == "CON" || *w == "AGAINST") {
        Side::Con
    } else {
        Side::General
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tagged_strength_with_side() {
        let obs = parse_observation("STRENGTH (PRO): cites benchmarks");
        assert_eq!(obs.kind, ObservationKind::Strength);
        assert_eq!(obs.side, Side::Pro);
        assert_eq!(obs.text, "cites benchmarks");
    }

    #[test]
    fn test_parse_bracketed_lowercase_side() {
        let obs = parse_observation("weakness [con]: ignores cost");
        assert_eq!(obs.kind, ObservationKind::Weakness);
        assert_eq!(obs.side, Side::Con);
    }

    #[test]
    fn test_parse_markdown_decorated_tag() {
        let obs = parse_observation("**FALLACY**: straw man in turn 3");
        assert_eq!(obs.kind, ObservationKind::Fallacy);
        assert_eq!(obs.side, Side::General);
        assert_eq!(obs.text, "straw man in turn 3");
    }

    #[test]
    fn test_untagged_thought_is_note() {
        let obs = parse_observation("Let me re-read the second turn.");
        assert_eq!(obs.kind, ObservationKind::Note);
        assert_eq!(obs.text, "Let me re-read the second turn.");

        let unknown = parse_observation("Summary: both sides were polite");
        assert_eq!(unknown.kind, ObservationKind::Note);
    }

    #[test]
    fn test_verdict_body_kept_for_winner_parsing() {
        let obs = parse_observation("VERDICT: CON - better sourced");
        assert_eq!(obs.kind, ObservationKind::Verdict);
        assert_eq!(obs.text, "CON - better sourced");
    }
}
