//! Dialogue state machine.

use crate::core::error::DomainError;
use crate::core::model::Model;
use crate::core::usage::TokenUsage;
use crate::dialogue::turn::{Turn, TurnRole};
use crate::routing::router::MIN_CONSENSUS_PARTICIPANTS;
use crate::routing::selection::{ModelSelection, SelectionRole};
use serde::{Deserialize, Serialize};

/// Which deliberation protocol a dialogue follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DialogueKind {
    Consensus,
    Debate,
}

impl DialogueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DialogueKind::Consensus => "consensus",
            DialogueKind::Debate => "debate",
        }
    }
}

impl std::fmt::Display for DialogueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Why a dialogue stopped taking turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TerminationReason {
    MaxTurnsReached,
    ConsensusDetected,
    /// Every participant failed within the same round
    ErrorAbort,
}

impl TerminationReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            TerminationReason::MaxTurnsReached => "max-turns-reached",
            TerminationReason::ConsensusDetected => "consensus-detected",
            TerminationReason::ErrorAbort => "error-abort",
        }
    }
}

impl std::fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Position in the `INIT → TURN(n) → SYNTHESIZE → DONE` machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "phase", content = "turn")]
pub enum DialoguePhase {
    Init,
    Turn(usize),
    Synthesize,
    Done,
}

/// Consolidated final answer of a dialogue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Synthesis {
    /// Participant that produced the synthesis
    pub model: Model,
    pub text: String,
    pub usage: TokenUsage,
    pub latency_ms: u64,
    /// False when the synthesizer failed and the text was assembled locally
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Ordered turns, termination reason and synthesis of one dialogue.
///
/// Created at dialogue start, finalized at termination, discarded once the
/// response envelope is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DialogueState {
    kind: DialogueKind,
    participants: Vec<ModelSelection>,
    max_turns: usize,
    turns: Vec<Turn>,
    termination: Option<TerminationReason>,
    synthesis: Option<Synthesis>,
}

impl DialogueState {
    /// Start a dialogue, validating the participants' role set.
    ///
    /// Debate needs exactly one pro and one con participant; Consensus needs
    /// at least three non-adversarial participants.
    pub fn new(
        kind: DialogueKind,
        participants: Vec<ModelSelection>,
        max_turns: usize,
    ) -> Result<Self, DomainError> {
        if max_turns == 0 {
            return Err(DomainError::InvalidSelection(
                "max turns must be at least 1".to_string(),
            ));
        }
        validate_roles(kind, &participants)?;
        Ok(Self {
            kind,
            participants,
            max_turns,
            turns: Vec::new(),
            termination: None,
            synthesis: None,
        })
    }

    // ==================== Accessors ====================

    pub fn kind(&self) -> DialogueKind {
        self.kind
    }

    pub fn participants(&self) -> &[ModelSelection] {
        &self.participants
    }

    pub fn max_turns(&self) -> usize {
        self.max_turns
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn termination(&self) -> Option<TerminationReason> {
        self.termination
    }

    pub fn synthesis(&self) -> Option<&Synthesis> {
        self.synthesis.as_ref()
    }

    pub fn phase(&self) -> DialoguePhase {
        match (self.termination, &self.synthesis) {
            (_, Some(_)) => DialoguePhase::Done,
            (Some(_), None) => DialoguePhase::Synthesize,
            (None, None) if self.turns.is_empty() => DialoguePhase::Init,
            (None, None) => DialoguePhase::Turn(self.turns.len()),
        }
    }

    pub fn is_done(&self) -> bool {
        self.phase() == DialoguePhase::Done
    }

    pub fn is_full(&self) -> bool {
        self.turns.len() >= self.max_turns
    }

    /// Sequence number the next turn will carry.
    pub fn next_sequence(&self) -> usize {
        self.turns.len() + 1
    }

    /// Round the next turn belongs to.
    pub fn next_round(&self) -> usize {
        self.turns.len() / self.participants.len() + 1
    }

    /// Participant speaking next (round-robin in selection order).
    pub fn next_speaker(&self) -> &ModelSelection {
        &self.participants[self.turns.len() % self.participants.len()]
    }

    /// Whether the last appended turn completed a round.
    pub fn round_complete(&self) -> bool {
        !self.turns.is_empty() && self.turns.len() % self.participants.len() == 0
    }

    /// Turns of the given round.
    pub fn round_turns(&self, round: usize) -> impl Iterator<Item = &Turn> {
        self.turns.iter().filter(move |t| t.round == round)
    }

    pub fn completed_rounds(&self) -> usize {
        self.turns.len() / self.participants.len()
    }

    pub fn successful_turns(&self) -> impl Iterator<Item = &Turn> {
        self.turns.iter().filter(|t| t.success)
    }

    pub fn failed_turns(&self) -> impl Iterator<Item = &Turn> {
        self.turns.iter().filter(|t| !t.success)
    }

    pub fn total_usage(&self) -> TokenUsage {
        let turns: TokenUsage = self.turns.iter().map(|t| t.usage).sum();
        turns + self.synthesis.as_ref().map(|s| s.usage).unwrap_or_default()
    }

    /// Full transcript, one block per turn, placeholders included.
    pub fn transcript(&self) -> String {
        let mut out = String::new();
        for turn in &self.turns {
            out.push_str(&format!(
                "[Turn {} | {} | {}]\n{}\n\n",
                turn.sequence, turn.speaker, turn.role, turn.response
            ));
        }
        out.trim_end().to_string()
    }

    // ==================== Transitions ====================

    /// Append a turn. Rejected once terminated or when the bound is reached.
    pub fn append_turn(&mut self, turn: Turn) -> Result<(), DomainError> {
        if self.termination.is_some() {
            return Err(DomainError::InvalidSelection(
                "cannot append a turn to a terminated dialogue".to_string(),
            ));
        }
        if self.is_full() {
            return Err(DomainError::InvalidSelection(format!(
                "dialogue already holds the maximum of {} turns",
                self.max_turns
            )));
        }
        self.turns.push(turn);
        Ok(())
    }

    /// Set the termination reason. Allowed exactly once.
    pub fn terminate(&mut self, reason: TerminationReason) -> Result<(), DomainError> {
        if let Some(existing) = self.termination {
            return Err(DomainError::InvalidSelection(format!(
                "dialogue already terminated ({})",
                existing
            )));
        }
        self.termination = Some(reason);
        Ok(())
    }

    /// Attach the synthesis, moving the dialogue to DONE.
    pub fn finalize(&mut self, synthesis: Synthesis) -> Result<(), DomainError> {
        if self.termination.is_none() {
            return Err(DomainError::InvalidSelection(
                "cannot synthesize before the dialogue terminates".to_string(),
            ));
        }
        if self.synthesis.is_some() {
            return Err(DomainError::InvalidSelection(
                "dialogue already synthesized".to_string(),
            ));
        }
        self.synthesis = Some(synthesis);
        Ok(())
    }
}

fn validate_roles(kind: DialogueKind, participants: &[ModelSelection]) -> Result<(), DomainError> {
    match kind {
        DialogueKind::Debate => {
            let pro = participants
                .iter()
                .filter(|p| p.role() == SelectionRole::ParticipantPro)
                .count();
            let con = participants
                .iter()
                .filter(|p| p.role() == SelectionRole::ParticipantCon)
                .count();
            if participants.len() != 2 || pro != 1 || con != 1 {
                return Err(DomainError::InvalidSelection(
                    "debate requires exactly one pro and one con participant".to_string(),
                ));
            }
        }
        DialogueKind::Consensus => {
            if participants.len() < MIN_CONSENSUS_PARTICIPANTS {
                return Err(DomainError::InvalidSelection(format!(
                    "consensus requires at least {} participants",
                    MIN_CONSENSUS_PARTICIPANTS
                )));
            }
            if participants
                .iter()
                .any(|p| TurnRole::for_selection(p.role()) != Some(TurnRole::SeekCommonGround))
            {
                return Err(DomainError::InvalidSelection(
                    "consensus participants must all seek common ground".to_string(),
                ));
            }
        }
    }
    Ok(())
}
