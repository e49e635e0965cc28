//! Resolved model selections.

use crate::core::model::Model;
use crate::routing::tier::Tier;
use serde::{Deserialize, Serialize};

/// The part a selected model plays in a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SelectionRole {
    /// Answers the query directly (Simple, Two-Stage stages)
    Primary,
    /// Argues for the proposition in a debate
    ParticipantPro,
    /// Argues against the proposition in a debate
    ParticipantCon,
    /// Seeks common ground in a consensus dialogue
    ParticipantConsensus,
    /// Post-hoc analyst of a completed dialogue
    Moderator,
    /// Candidate in a benchmark fan-out
    BenchmarkCandidate,
}

impl SelectionRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            SelectionRole::Primary => "primary",
            SelectionRole::ParticipantPro => "participant-pro",
            SelectionRole::ParticipantCon => "participant-con",
            SelectionRole::ParticipantConsensus => "participant-consensus",
            SelectionRole::Moderator => "moderator",
            SelectionRole::BenchmarkCandidate => "benchmark-candidate",
        }
    }

    /// Roles taking opposing sides of a debate.
    pub fn is_adversarial(&self) -> bool {
        matches!(
            self,
            SelectionRole::ParticipantPro | SelectionRole::ParticipantCon
        )
    }
}

impl std::fmt::Display for SelectionRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A resolved `(model, tier, role)` triple. Immutable once created by the router.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelSelection {
    model: Model,
    tier: Tier,
    role: SelectionRole,
    /// Tier originally asked for, when fallback resolved a different one
    #[serde(skip_serializing_if = "Option::is_none")]
    requested_tier: Option<Tier>,
}

impl ModelSelection {
    pub fn new(model: Model, tier: Tier, role: SelectionRole) -> Self {
        Self {
            model,
            tier,
            role,
            requested_tier: None,
        }
    }

    /// Record that this selection was reached through tier fallback.
    pub(crate) fn with_requested_tier(mut self, requested: Tier) -> Self {
        if requested != self.tier {
            self.requested_tier = Some(requested);
        }
        self
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn tier(&self) -> Tier {
        self.tier
    }

    pub fn role(&self) -> SelectionRole {
        self.role
    }

    pub fn requested_tier(&self) -> Option<Tier> {
        self.requested_tier
    }

    /// Whether tier fallback was needed to produce this selection.
    pub fn is_fallback(&self) -> bool {
        self.requested_tier.is_some()
    }
}

impl std::fmt::Display for ModelSelection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} [{}, {}]", self.model, self.tier, self.role)
    }
}
