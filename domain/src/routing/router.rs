//! Tier router: maps complexity, mode and availability to concrete models.

use crate::core::error::DomainError;
use crate::core::model::Model;
use crate::routing::catalog::{CatalogEntry, ModelCatalog};
use crate::routing::complexity::ComplexityScore;
use crate::routing::selection::{ModelSelection, SelectionRole};
use crate::routing::tier::{Tier, TierThresholds};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-query explicit model choice for a tier.
pub type TierOverrides = BTreeMap<Tier, Model>;

/// Minimum number of participants in a consensus dialogue.
pub const MIN_CONSENSUS_PARTICIPANTS: usize = 3;

/// Both selections of a Two-Stage pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TwoStageSelection {
    /// Stage 1: always resolved from the FAST tier
    pub draft: ModelSelection,
    /// Stage 2: complexity-derived tier, never below BALANCED
    pub refine: ModelSelection,
}

/// Resolves tiers to concrete models against a borrowed catalog.
///
/// The router holds no state beyond its borrows; construct one per query.
#[derive(Debug, Clone, Copy)]
pub struct TierRouter<'a> {
    catalog: &'a ModelCatalog,
    thresholds: TierThresholds,
}

impl<'a> TierRouter<'a> {
    pub fn new(catalog: &'a ModelCatalog, thresholds: TierThresholds) -> Self {
        Self {
            catalog,
            thresholds,
        }
    }

    pub fn catalog(&self) -> &'a ModelCatalog {
        self.catalog
    }

    pub fn tier_for(&self, score: ComplexityScore) -> Tier {
        self.thresholds.tier_for(score)
    }

    /// Resolve a tier to a model, walking the deterministic fallback chain.
    ///
    /// At each step an explicit override for that tier wins when it is
    /// usable and catalogued under that tier; otherwise the first usable catalog entry of the tier is taken.
    pub fn resolve(
        &self,
        tier: Tier,
        role: SelectionRole,
        overrides: &TierOverrides,
    ) -> Result<ModelSelection, DomainError> {
        let chain = tier.fallback_chain();
        for candidate in chain {
            if let Some(entry) = overrides
                .get(&candidate)
                .and_then(|model| self.catalog.get(model))
                .filter(|entry| entry.is_usable() && entry.tier == candidate)
            {
                return Ok(ModelSelection::new(entry.model.clone(), candidate, role)
                    .with_requested_tier(tier));
            }
            if let Some(entry) = self.catalog.first_usable_in(candidate) {
                return Ok(ModelSelection::new(entry.model.clone(), candidate, role)
                    .with_requested_tier(tier));
            }
        }
        Err(DomainError::no_available_model(tier, &chain))
    }

    /// Resolve the tier a score maps to.
    pub fn resolve_for_score(
        &self,
        score: ComplexityScore,
        role: SelectionRole,
        overrides: &TierOverrides,
    ) -> Result<ModelSelection, DomainError> {
        self.resolve(self.tier_for(score), role, overrides)
    }

    /// Resolve both Two-Stage selections.
    ///
    /// Stage 1 resolves FAST regardless of score: a smaller model leaves more
    /// of the fixed token budget for retrieved context. Stage 2 resolves the
    /// score's tier, raised to BALANCED when the score maps to FAST.
    pub fn resolve_two_stage(
        &self,
        score: ComplexityScore,
        overrides: &TierOverrides,
    ) -> Result<TwoStageSelection, DomainError> {
        let draft = self.resolve(Tier::Fast, SelectionRole::Primary, overrides)?;
        let refine_tier = self.tier_for(score).max(Tier::Balanced);
        let refine = self.resolve(refine_tier, SelectionRole::Primary, overrides)?;
        Ok(TwoStageSelection { draft, refine })
    }

    /// Resolve the model backing the moderator's reasoner.
    ///
    /// No tier fallback applies: the model is named explicitly and must be
    /// usable.
    pub fn select_moderator(&self, model: &Model) -> Result<ModelSelection, DomainError> {
        let entry = self
            .usable_entries_for(std::slice::from_ref(model))?
            .remove(0);
        Ok(ModelSelection::new(
            entry.model.clone(),
            entry.tier,
            SelectionRole::Moderator,
        ))
    }

    /// Pick the two debaters: `[pro, con]`.
    ///
    /// With an explicit list it must name exactly two distinct usable
    /// models. Without one, the two strongest usable models are taken
    /// (higher tier first, catalog order within a tier).
    pub fn select_debaters(&self, explicit: &[Model]) -> Result<[ModelSelection; 2], DomainError> {
        let entries = if explicit.is_empty() {
            let ranked = self.ranked_usable();
            if ranked.len() < 2 {
                return Err(DomainError::InvalidSelection(format!(
                    "debate requires exactly 2 usable models, found {}",
                    ranked.len()
                )));
            }
            vec![ranked[0], ranked[1]]
        } else {
            if explicit.len() != 2 {
                return Err(DomainError::InvalidSelection(format!(
                    "debate requires exactly 2 participants, {} given",
                    explicit.len()
                )));
            }
            self.usable_entries_for(explicit)?
        };

        Ok([
            ModelSelection::new(
                entries[0].model.clone(),
                entries[0].tier,
                SelectionRole::ParticipantPro,
            ),
            ModelSelection::new(
                entries[1].model.clone(),
                entries[1].tier,
                SelectionRole::ParticipantCon,
            ),
        ])
    }

    /// Pick consensus participants (at least [`MIN_CONSENSUS_PARTICIPANTS`]).
    ///
    /// Without an explicit list every usable model takes part.
    pub fn select_consensus(&self, explicit: &[Model]) -> Result<Vec<ModelSelection>, DomainError> {
        let entries = if explicit.is_empty() {
            self.catalog.usable().collect::<Vec<_>>()
        } else {
            self.usable_entries_for(explicit)?
        };

        if entries.len() < MIN_CONSENSUS_PARTICIPANTS {
            return Err(DomainError::InvalidSelection(format!(
                "consensus requires at least {} usable models, found {}",
                MIN_CONSENSUS_PARTICIPANTS,
                entries.len()
            )));
        }

        Ok(entries
            .into_iter()
            .map(|e| {
                ModelSelection::new(
                    e.model.clone(),
                    e.tier,
                    SelectionRole::ParticipantConsensus,
                )
            })
            .collect())
    }

    /// Every usable model, in catalog order, as a benchmark candidate.
    pub fn benchmark_candidates(&self) -> Vec<ModelSelection> {
        self.catalog
            .usable()
            .map(|e| {
                ModelSelection::new(e.model.clone(), e.tier, SelectionRole::BenchmarkCandidate)
            })
            .collect()
    }

    /// Usable entries, strongest tier first; stable within a tier.
    fn ranked_usable(&self) -> Vec<&'a CatalogEntry> {
        let mut ranked: Vec<_> = self.catalog.usable().collect();
        ranked.sort_by(|a, b| b.tier.cmp(&a.tier));
        ranked
    }

    fn usable_entries_for(&self, models: &[Model]) -> Result<Vec<&'a CatalogEntry>, DomainError> {
        let mut entries: Vec<&'a CatalogEntry> = Vec::with_capacity(models.len());
        for model in models {
            if entries.iter().any(|e| &e.model == model) {
                return Err(DomainError::InvalidSelection(format!(
                    "model '{}' listed more than once",
                    model
                )));
            }
            match self.catalog.get(model) {
                Some(entry) if entry.is_usable() => entries.push(entry),
                Some(_) => {
                    return Err(DomainError::InvalidSelection(format!(
                        "model '{}' is not enabled or not available",
                        model
                    )));
                }
                None => {
                    return Err(DomainError::InvalidSelection(format!(
                        "model '{}' is not in the catalog",
                        model
                    )));
                }
            }
        }
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_catalog() -> ModelCatalog {
        ModelCatalog::default()
            .with_entry(CatalogEntry::new("fast-1", Tier::Fast))
            .with_entry(CatalogEntry::new("mid-1", Tier::Balanced))
            .with_entry(CatalogEntry::new("big-1", Tier::Powerful))
            .with_entry(CatalogEntry::new("big-2", Tier::Powerful))
    }

    fn router(catalog: &ModelCatalog) -> TierRouter<'_> {
        TierRouter::new(catalog, TierThresholds::default())
    }

    #[test]
    fn test_resolve_direct_tier() {
        let catalog = full_catalog();
        let selection = router(&catalog)
            .resolve(Tier::Balanced, SelectionRole::Primary, &TierOverrides::new())
            .unwrap();
        assert_eq!(selection.model().as_str(), "mid-1");
        assert!(!selection.is_fallback());
    }

    #[test]
    fn test_resolve_prefers_usable_override() {
        let catalog = full_catalog();
        let mut overrides = TierOverrides::new();
        overrides.insert(Tier::Powerful, Model::new("big-2"));
        let selection = router(&catalog)
            .resolve(Tier::Powerful, SelectionRole::Primary, &overrides)
            .unwrap();
        assert_eq!(selection.model().as_str(), "big-2");
    }

    #[test]
    fn test_resolve_ignores_unusable_override() {
        let catalog = full_catalog().with_entry(CatalogEntry::new("off", Tier::Fast).disabled());
        let mut overrides = TierOverrides::new();
        overrides.insert(Tier::Fast, Model::new("off"));
        let selection = router(&catalog)
            .resolve(Tier::Fast, SelectionRole::Primary, &overrides)
            .unwrap();
        assert_eq!(selection.model().as_str(), "fast-1");
    }

    #[test]
    fn test_resolve_ignores_override_from_another_tier() {
        let catalog = full_catalog();
        let mut overrides = TierOverrides::new();
        overrides.insert(Tier::Fast, Model::new("big-1"));
        let selection = router(&catalog)
            .resolve(Tier::Fast, SelectionRole::Primary, &overrides)
            .unwrap();
        assert_eq!(selection.model().as_str(), "fast-1");
        assert_eq!(selection.tier(), Tier::Fast);
    }

    #[test]
    fn test_two_stage_draft_stays_fast_with_cross_tier_override() {
        let catalog = full_catalog();
        let mut overrides = TierOverrides::new();
        overrides.insert(Tier::Fast, Model::new("big-1"));
        let selection = router(&catalog)
            .resolve_two_stage(ComplexityScore::new(8.2), &overrides)
            .unwrap();
        let draft_entry = catalog.get(selection.draft.model()).unwrap();
        assert_eq!(selection.draft.model().as_str(), "fast-1");
        assert_eq!(selection.draft.tier(), draft_entry.tier);
        assert_eq!(draft_entry.tier, Tier::Fast);
    }

    #[test]
    fn test_powerful_falls_back_downward() {
        let catalog = ModelCatalog::default()
            .with_entry(CatalogEntry::new("fast-1", Tier::Fast))
            .with_entry(CatalogEntry::new("mid-1", Tier::Balanced))
            .with_entry(CatalogEntry::new("big-1", Tier::Powerful).unavailable());
        let selection = router(&catalog)
            .resolve(Tier::Powerful, SelectionRole::Primary, &TierOverrides::new())
            .unwrap();
        assert_eq!(selection.tier(), Tier::Balanced);
        assert_eq!(selection.requested_tier(), Some(Tier::Powerful));
    }

    #[test]
    fn test_fast_escalates_upward() {
        let catalog = ModelCatalog::default().with_entry(CatalogEntry::new("big-1", Tier::Powerful));
        let selection = router(&catalog)
            .resolve(Tier::Fast, SelectionRole::Primary, &TierOverrides::new())
            .unwrap();
        assert_eq!(selection.tier(), Tier::Powerful);
        assert!(selection.is_fallback());
    }

    #[test]
    fn test_exhausted_fallback_is_no_available_model() {
        let catalog = ModelCatalog::default().with_entry(CatalogEntry::new("x", Tier::Fast).disabled());
        let err = router(&catalog)
            .resolve(Tier::Balanced, SelectionRole::Primary, &TierOverrides::new())
            .unwrap_err();
        assert!(matches!(
            err,
            DomainError::NoAvailableModel {
                requested: Tier::Balanced,
                ..
            }
        ));
    }

    #[test]
    fn test_two_stage_high_score() {
        let catalog = full_catalog();
        let selection = router(&catalog)
            .resolve_two_stage(ComplexityScore::new(8.2), &TierOverrides::new())
            .unwrap();
        assert_eq!(selection.draft.tier(), Tier::Fast);
        assert_eq!(selection.refine.tier(), Tier::Powerful);
    }

    #[test]
    fn test_two_stage_low_score_refines_with_balanced() {
        let catalog = full_catalog();
        let selection = router(&catalog)
            .resolve_two_stage(ComplexityScore::new(1.0), &TierOverrides::new())
            .unwrap();
        assert_eq!(selection.draft.tier(), Tier::Fast);
        assert_eq!(selection.refine.tier(), Tier::Balanced);
    }

    #[test]
    fn test_select_debaters_strongest_first() {
        let catalog = full_catalog();
        let [pro, con] = router(&catalog).select_debaters(&[]).unwrap();
        assert_eq!(pro.model().as_str(), "big-1");
        assert_eq!(con.model().as_str(), "big-2");
        assert_eq!(pro.role(), SelectionRole::ParticipantPro);
        assert_eq!(con.role(), SelectionRole::ParticipantCon);
    }

    #[test]
    fn test_select_debaters_requires_two_usable() {
        let catalog = ModelCatalog::default()
            .with_entry(CatalogEntry::new("only", Tier::Balanced))
            .with_entry(CatalogEntry::new("down", Tier::Fast).unavailable());
        assert!(matches!(
            router(&catalog).select_debaters(&[]),
            Err(DomainError::InvalidSelection(_))
        ));
        assert!(
            router(&catalog)
                .select_debaters(&[Model::new("only"), Model::new("down")])
                .is_err()
        );
    }

    #[test]
    fn test_select_debaters_explicit_rejects_duplicates() {
        let catalog = full_catalog();
        let err = router(&catalog)
            .select_debaters(&[Model::new("mid-1"), Model::new("mid-1")])
            .unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn test_select_moderator_uses_catalog_tier() {
        let catalog = full_catalog().with_entry(CatalogEntry::new("off", Tier::Fast).disabled());
        let selection = router(&catalog)
            .select_moderator(&Model::new("mid-1"))
            .unwrap();
        assert_eq!(selection.role(), SelectionRole::Moderator);
        assert_eq!(selection.tier(), Tier::Balanced);
        assert!(!selection.is_fallback());

        assert!(router(&catalog).select_moderator(&Model::new("off")).is_err());
        assert!(router(&catalog).select_moderator(&Model::new("ghost")).is_err());
    }

    #[test]
    fn test_select_consensus() {
        let catalog = full_catalog();
        let participants = router(&catalog).select_consensus(&[]).unwrap();
        assert_eq!(participants.len(), 4);
        assert!(participants.iter().all(|p| !p.role().is_adversarial()));

        let two = ModelCatalog::default()
            .with_entry(CatalogEntry::new("a", Tier::Fast))
            .with_entry(CatalogEntry::new("b", Tier::Fast));
        assert!(router(&two).select_consensus(&[]).is_err());
    }

    #[test]
    fn test_benchmark_candidates_skip_unusable() {
        let catalog = full_catalog().with_entry(CatalogEntry::new("off", Tier::Fast).disabled());
        let candidates = router(&catalog).benchmark_candidates();
        assert_eq!(candidates.len(), 4);
        assert!(
            candidates
                .iter()
                .all(|c| c.role() == SelectionRole::BenchmarkCandidate)
        );
    }
}
