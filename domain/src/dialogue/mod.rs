//! Multi-turn deliberation (Consensus / Debate).
//!
//! ```text
//! INIT ──► TURN(1) ──► TURN(n) ──┬──► TURN(n+1)
//!                                └──► TERMINATE ──► SYNTHESIZE ──► DONE
//! ```
//!
//! The domain side owns the state machine and its invariants: turns are
//! append-only, the termination reason is set exactly once, and the number
//! of turns never exceeds the bound. Driving it (invoking models) is the
//! application layer's job.

pub mod convergence;
pub mod state;
pub mod turn;

pub use convergence::{AgreementMarker, ConvergencePolicy, JaccardConvergence, NeverConverge};
pub use state::{DialogueKind, DialoguePhase, DialogueState, Synthesis, TerminationReason};
pub use turn::{Turn, TurnRole};
