use chrono::Utc;

use crate::core::types::DocId;

/// Side-channel notifications emitted by the façade (spec §6 "Events").
/// Every variant the spec enumerates is represented; none of them are
/// errors in the `Result` sense — they are observations a caller may log or
/// ignore.
#[derive(Debug, Clone)]
pub enum EventPayload {
    EngineInitialized,
    EngineClosed,
    SearchStart { query: String },
    SearchComplete { query: String, hits: usize, took_ms: u64 },
    SearchError { query: String, message: String },
    IndexStart { count: usize },
    IndexComplete { indexed: usize, skipped: usize },
    IndexError { message: String },
    RemoveComplete { doc_id: DocId },
    RemoveError { doc_id: DocId, message: String },
    StorageError { message: String },
    BulkUpdateComplete { updated: usize, failed: usize },
    OptimizeComplete,
    /// A regex walk or batch item hit a budget and was truncated, not
    /// failed (spec §7: `Budget` is "not an error to callers").
    Warning { message: String },
}

#[derive(Debug, Clone)]
pub struct Event {
    pub timestamp: i64,
    pub payload: EventPayload,
}

impl Event {
    pub fn now(payload: EventPayload) -> Self {
        Event {
            timestamp: Utc::now().timestamp_millis(),
            payload,
        }
    }
}

/// Installable event sink. The teacher has no pub/sub precedent to draw on
/// (`Database` reports state only through return values and `eprintln!`);
/// this is modeled on the "optional callback" shape other retrieval-engine
/// examples in the pack use for the same purpose. Default is a no-op.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: Event);
}

pub struct NoopSink;

impl EventSink for NoopSink {
    fn emit(&self, _event: Event) {}
}

pub struct CallbackSink<F: Fn(Event) + Send + Sync> {
    callback: F,
}

impl<F: Fn(Event) + Send + Sync> CallbackSink<F> {
    pub fn new(callback: F) -> Self {
        CallbackSink { callback }
    }
}

impl<F: Fn(Event) + Send + Sync> EventSink for CallbackSink<F> {
    fn emit(&self, event: Event) {
        (self.callback)(event)
    }
}
