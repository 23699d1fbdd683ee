//! Bounded, newest-first operator event log.
//!
//! Every dispatched event is rendered to a short human-readable line and
//! pushed at the head of a fixed-capacity ring; the oldest entry falls off
//! the tail. The log never blocks dispatch and keeps no history beyond its
//! capacity.

use std::collections::VecDeque;
use std::sync::Arc;

use cloudflow_core::events::{DispatchedEvent, EventKind, PushEvent};
use parking_lot::Mutex;

/// Default number of retained entries.
pub const DEFAULT_CAPACITY: usize = 10;

const MIGRATION_TOPIC: &str = "migration-events";
const EMAIL_TOPIC: &str = "email-notifications";

/// One rendered log line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogEntry {
    /// Local wall-clock arrival time, `HH:MM:SS`.
    pub timestamp: String,
    /// Feed the event belongs to.
    pub topic: &'static str,
    /// The event's kind.
    pub kind: EventKind,
    /// Rendered message line.
    pub message: String,
}

/// Bounded newest-first event log. Cheap to clone; clones share storage.
#[derive(Clone)]
pub struct EventLog {
    inner: Arc<Mutex<Inner>>,
}

struct Inner {
    capacity: usize,
    entries: VecDeque<LogEntry>,
}

impl Default for EventLog {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl EventLog {
    /// Create a log with [`DEFAULT_CAPACITY`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a log retaining at most `capacity` entries.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                capacity: capacity.max(1),
                entries: VecDeque::with_capacity(capacity.max(1)),
            })),
        }
    }

    /// Render `event` and insert it at the head, evicting the oldest entry
    /// when the log is full.
    pub fn record(&self, event: &DispatchedEvent) {
        let entry = LogEntry {
            timestamp: event.received_at.format("%H:%M:%S").to_string(),
            topic: topic_for(event.kind()),
            kind: event.kind(),
            message: render_message(&event.payload),
        };
        let mut inner = self.inner.lock();
        let capacity = inner.capacity;
        inner.entries.push_front(entry);
        inner.entries.truncate(capacity);
    }

    /// Snapshot of the current entries, newest first.
    #[must_use]
    pub fn entries(&self) -> Vec<LogEntry> {
        self.inner.lock().entries.iter().cloned().collect()
    }

    /// Current entry count.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    /// Whether the log holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.lock().entries.is_empty()
    }

    /// Maximum retained entries.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.inner.lock().capacity
    }
}

fn topic_for(kind: EventKind) -> &'static str {
    match kind {
        EventKind::EmailSent => EMAIL_TOPIC,
        _ => MIGRATION_TOPIC,
    }
}

/// Render the one-line operator message for a payload.
///
/// Migration events show the last six characters of the job id and the
/// progress percent when present and nonzero; opaque feed events show only
/// their kind.
#[must_use]
pub fn render_message(payload: &PushEvent) -> String {
    if payload.kind() == EventKind::EmailSent {
        return "email_sent: Migration completion notification".to_string();
    }
    let mut message = format!("{}:", payload.kind());
    if let Some(job_id) = payload.job_id() {
        message.push_str(" Job ");
        message.push_str(short_job_id(job_id));
    }
    if let Some(progress) = payload.progress() {
        if progress > 0.0 {
            message.push_str(&format!(" {progress}%"));
        }
    }
    message
}

fn short_job_id(job_id: &str) -> &str {
    let tail = job_id.len().saturating_sub(6);
    job_id.get(tail..).unwrap_or(job_id)
}
