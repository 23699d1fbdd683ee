//! Push-channel event types.
//!
//! Inbound frames are UTF-8 JSON objects whose `type` field selects the
//! variant. The set is closed: a frame with an unknown tag fails decode with
//! an explicit [`EventDecodeError`] instead of flowing through as an untyped
//! blob. `email_sent` is synthetic — produced client-side by the reconciler,
//! never received from the wire.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::EventDecodeError;

// ─────────────────────────────────────────────────────────────────────────────
// EventKind — discriminant for subscriptions and rule lookup
// ─────────────────────────────────────────────────────────────────────────────

/// The kind tag of a [`PushEvent`], used as the subscription key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Migration progress tick.
    MigrationUpdate,
    /// Migration finished successfully.
    MigrationComplete,
    /// Migration terminally failed.
    MigrationFailed,
    /// Broadcast progress variant from the server-side connection manager.
    MigrationProgress,
    /// Server-initiated dashboard refresh hint.
    DashboardUpdate,
    /// Alert panel feed.
    Alert,
    /// Streaming viewer feed.
    StreamEvent,
    /// Synthetic completion-notification event (client-side only).
    EmailSent,
}

impl EventKind {
    /// Every kind, in a stable order. Useful for subscribing a consumer
    /// that wants the full stream (there is no wildcard subscription).
    pub const ALL: [Self; 8] = [
        Self::MigrationUpdate,
        Self::MigrationComplete,
        Self::MigrationFailed,
        Self::MigrationProgress,
        Self::DashboardUpdate,
        Self::Alert,
        Self::StreamEvent,
        Self::EmailSent,
    ];

    /// The wire tag for this kind.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MigrationUpdate => "migration_update",
            Self::MigrationComplete => "migration_complete",
            Self::MigrationFailed => "migration_failed",
            Self::MigrationProgress => "migration_progress",
            Self::DashboardUpdate => "dashboard_update",
            Self::Alert => "alert",
            Self::StreamEvent => "stream_event",
            Self::EmailSent => "email_sent",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// PushEvent — decoded push-channel payloads
// ─────────────────────────────────────────────────────────────────────────────

/// A decoded push-channel message.
///
/// Field names match the server's JSON exactly. Optional fields tolerate
/// the server omitting them on some emission paths.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PushEvent {
    /// Migration progress tick.
    #[serde(rename = "migration_update")]
    MigrationUpdate {
        /// Migration job identifier.
        job_id: String,
        /// Progress percent (0–100).
        #[serde(skip_serializing_if = "Option::is_none")]
        progress: Option<f64>,
        /// Name of the object being migrated.
        #[serde(skip_serializing_if = "Option::is_none")]
        object_name: Option<String>,
        /// Server-side job status string.
        #[serde(skip_serializing_if = "Option::is_none")]
        status: Option<String>,
    },

    /// Migration finished successfully.
    #[serde(rename = "migration_complete")]
    MigrationComplete {
        /// Migration job identifier.
        job_id: String,
        /// Name of the migrated object.
        #[serde(skip_serializing_if = "Option::is_none")]
        object_name: Option<String>,
        /// Final progress percent (100 when present).
        #[serde(skip_serializing_if = "Option::is_none")]
        progress: Option<f64>,
    },

    /// Migration terminally failed.
    #[serde(rename = "migration_failed")]
    MigrationFailed {
        /// Migration job identifier.
        job_id: String,
        /// Name of the object that failed to migrate.
        #[serde(skip_serializing_if = "Option::is_none")]
        object_name: Option<String>,
        /// Server-provided error message.
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },

    /// Broadcast progress variant from the server connection manager.
    #[serde(rename = "migration_progress")]
    MigrationProgress {
        /// Migration job identifier.
        job_id: String,
        /// Progress percent (0–100).
        progress: f64,
        /// Server-side job status string.
        status: String,
    },

    /// Server-initiated dashboard refresh hint with an opaque payload.
    #[serde(rename = "dashboard_update")]
    DashboardUpdate {
        /// Opaque server-defined payload.
        data: Value,
    },

    /// Alert panel feed entry.
    #[serde(rename = "alert")]
    Alert {
        /// Opaque server-defined payload.
        data: Value,
    },

    /// Streaming viewer feed entry.
    #[serde(rename = "stream_event")]
    StreamEvent {
        /// Opaque server-defined payload.
        data: Value,
    },

    /// Synthetic completion-notification event. Never received from the
    /// wire; published by the reconciler after a fixed delay.
    #[serde(rename = "email_sent")]
    EmailSent {},
}

impl PushEvent {
    /// Get this event's kind.
    #[must_use]
    pub fn kind(&self) -> EventKind {
        match self {
            Self::MigrationUpdate { .. } => EventKind::MigrationUpdate,
            Self::MigrationComplete { .. } => EventKind::MigrationComplete,
            Self::MigrationFailed { .. } => EventKind::MigrationFailed,
            Self::MigrationProgress { .. } => EventKind::MigrationProgress,
            Self::DashboardUpdate { .. } => EventKind::DashboardUpdate,
            Self::Alert { .. } => EventKind::Alert,
            Self::StreamEvent { .. } => EventKind::StreamEvent,
            Self::EmailSent {} => EventKind::EmailSent,
        }
    }

    /// The job identifier, for the migration event family.
    #[must_use]
    pub fn job_id(&self) -> Option<&str> {
        match self {
            Self::MigrationUpdate { job_id, .. }
            | Self::MigrationComplete { job_id, .. }
            | Self::MigrationFailed { job_id, .. }
            | Self::MigrationProgress { job_id, .. } => Some(job_id),
            _ => None,
        }
    }

    /// The progress percent, where the variant carries one.
    #[must_use]
    pub fn progress(&self) -> Option<f64> {
        match self {
            Self::MigrationUpdate { progress, .. } | Self::MigrationComplete { progress, .. } => {
                *progress
            }
            Self::MigrationProgress { progress, .. } => Some(*progress),
            _ => None,
        }
    }

    /// The object name, where the variant carries one.
    #[must_use]
    pub fn object_name(&self) -> Option<&str> {
        match self {
            Self::MigrationUpdate { object_name, .. }
            | Self::MigrationComplete { object_name, .. }
            | Self::MigrationFailed { object_name, .. } => object_name.as_deref(),
            _ => None,
        }
    }
}

/// Decode one inbound text frame into a [`PushEvent`].
///
/// Fails explicitly on malformed JSON and on unrecognized `type` tags.
pub fn decode_frame(frame: &str) -> Result<PushEvent, EventDecodeError> {
    serde_json::from_str(frame).map_err(|source| EventDecodeError::new(source, frame))
}

// ─────────────────────────────────────────────────────────────────────────────
// DispatchedEvent — payload plus arrival timestamp
// ─────────────────────────────────────────────────────────────────────────────

/// A [`PushEvent`] with the arrival timestamp assigned at dispatch time.
///
/// Immutable once created; ownership transfers to the dispatcher at publish.
#[derive(Clone, Debug, PartialEq)]
pub struct DispatchedEvent {
    /// The decoded payload.
    pub payload: PushEvent,
    /// When the dispatcher published this event.
    pub received_at: DateTime<Utc>,
}

impl DispatchedEvent {
    /// Wrap a payload with the current UTC timestamp.
    #[must_use]
    pub fn now(payload: PushEvent) -> Self {
        Self {
            payload,
            received_at: Utc::now(),
        }
    }

    /// Get the payload's kind.
    #[must_use]
    pub fn kind(&self) -> EventKind {
        self.payload.kind()
    }
}
