//! Port for structured conversation logging.
//!
//! Defines the [`ConversationLogger`] trait for recording dispatch events
//! (stage answers, dialogue turns, moderator analyses, benchmark candidates)
//! to a machine-readable log.
//!
//! This is separate from `tracing`-based diagnostics: tracing handles
//! human-readable operation messages, while this port captures the full
//! exchange with every model (JSONL in the default adapter).

use serde_json::Value;

/// A structured conversation event for logging.
pub struct ConversationEvent {
    /// Event type identifier (e.g., "dialogue_turn", "benchmark_candidate").
    pub event_type: &'static str,
    /// JSON payload with event-specific data.
    pub payload: Value,
}

impl ConversationEvent {
    pub fn new(event_type: &'static str, payload: Value) -> Self {
        Self {
            event_type,
            payload,
        }
    }
}

/// Port for logging conversation events.
///
/// `log` is synchronous and infallible; a logging failure must never fail
/// the query.
pub trait ConversationLogger: Send + Sync {
    fn log(&self, event: ConversationEvent);
}

/// No-op implementation for tests and when logging is disabled.
pub struct NoConversationLogger;

impl ConversationLogger for NoConversationLogger {
    fn log(&self, _event: ConversationEvent) {}
}
