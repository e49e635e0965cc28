//! Post-hoc moderator analysis of a completed dialogue.
//!
//! The moderator's reasoning loop yields one tagged observation per
//! iteration. [`parsing`] turns each raw thought into an [`Observation`];
//! [`ModeratorAnalysis`] folds them into a structured breakdown.

pub mod analysis;
pub mod parsing;

pub use analysis::{ModeratorAnalysis, ModeratorOutcome, SideNotes, Verdict, Winner};
pub use parsing::{Observation, ObservationKind, Side, parse_observation};
