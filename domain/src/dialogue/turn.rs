//! Dialogue turns.

use crate::core::model::Model;
use crate::core::usage::TokenUsage;
use crate::routing::selection::SelectionRole;
use serde::{Deserialize, Serialize};

/// Instruction given to a speaker for its turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TurnRole {
    ArgueFor,
    ArgueAgainst,
    SeekCommonGround,
}

impl TurnRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            TurnRole::ArgueFor => "argue-for",
            TurnRole::ArgueAgainst => "argue-against",
            TurnRole::SeekCommonGround => "seek-common-ground",
        }
    }

    /// The turn role a participant selection speaks with.
    pub fn for_selection(role: SelectionRole) -> Option<Self> {
        match role {
            SelectionRole::ParticipantPro => Some(TurnRole::ArgueFor),
            SelectionRole::ParticipantCon => Some(TurnRole::ArgueAgainst),
            SelectionRole::ParticipantConsensus => Some(TurnRole::SeekCommonGround),
            _ => None,
        }
    }
}

impl std::fmt::Display for TurnRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One dialogue exchange. Never mutated after it is appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Turn {
    /// 1-based position in the dialogue
    pub sequence: usize,
    /// 1-based round (one pass over all participants)
    pub round: usize,
    pub speaker: Model,
    pub role: TurnRole,
    pub prompt: String,
    /// Model output, or placeholder text when the invocation failed
    pub response: String,
    pub usage: TokenUsage,
    pub latency_ms: u64,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Turn {
    /// Placeholder recorded in place of a failed speaker's response.
    pub fn placeholder_text(speaker: &Model) -> String {
        format!("[no response: {} failed to answer this turn]", speaker)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn success(
        sequence: usize,
        round: usize,
        speaker: Model,
        role: TurnRole,
        prompt: String,
        response: String,
        usage: TokenUsage,
        latency_ms: u64,
    ) -> Self {
        Self {
            sequence,
            round,
            speaker,
            role,
            prompt,
            response,
            usage,
            latency_ms,
            success: true,
            error: None,
        }
    }

    pub fn failure(
        sequence: usize,
        round: usize,
        speaker: Model,
        role: TurnRole,
        prompt: String,
        error: impl Into<String>,
        latency_ms: u64,
    ) -> Self {
        let response = Self::placeholder_text(&speaker);
        Self {
            sequence,
            round,
            speaker,
            role,
            prompt,
            response,
            usage: TokenUsage::default(),
            latency_ms,
            success: false,
            error: Some(error.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_turn_carries_placeholder() {
        let turn = Turn::failure(
            3,
            2,
            Model::new("mid"),
            TurnRole::ArgueAgainst,
            "prompt".to_string(),
            "timeout",
            120,
        );
        assert!(!turn.success);
        assert_eq!(turn.error.as_deref(), Some("timeout"));
        assert!(turn.response.contains("mid failed"));
        assert_eq!(turn.usage.total(), 0);
    }

    #[test]
    fn test_turn_role_for_selection() {
        assert_eq!(
            TurnRole::for_selection(SelectionRole::ParticipantPro),
            Some(TurnRole::ArgueFor)
        );
        assert_eq!(TurnRole::for_selection(SelectionRole::Moderator), None);
    }
}
