//! Settings type definitions.
//!
//! All types use `#[serde(rename_all = "camelCase")]` to match the JSON wire
//! format, and `#[serde(default)]` so partial files are valid — missing
//! fields get their production default during deserialization.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root settings type for a dashboard session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CloudflowSettings {
    /// Settings schema version.
    pub version: String,
    /// Application name.
    pub name: String,
    /// Push-channel and reconciliation settings.
    pub sync: SyncSettings,
    /// REST data-access settings.
    pub api: ApiSettings,
    /// Logging configuration.
    pub logging: LoggingSettings,
}

impl Default for CloudflowSettings {
    fn default() -> Self {
        Self {
            version: "0.1.0".to_string(),
            name: "cloudflow".to_string(),
            sync: SyncSettings::default(),
            api: ApiSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

/// Push-channel connection and reconciliation settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SyncSettings {
    /// Push-channel endpoint. The client id is appended as a path segment.
    pub ws_endpoint: String,
    /// Reconnect attempt budget after an abnormal close.
    pub max_reconnect_attempts: u32,
    /// Base reconnect delay; attempt N waits N × base.
    pub base_retry_delay_ms: u64,
    /// Delay before the synthetic completion-notification event.
    pub notification_delay_ms: u64,
    /// Bounded operator event-log capacity.
    pub event_log_capacity: usize,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            ws_endpoint: "ws://localhost:8000/ws".to_string(),
            max_reconnect_attempts: 5,
            base_retry_delay_ms: 3000,
            notification_delay_ms: 500,
            event_log_capacity: 10,
        }
    }
}

impl SyncSettings {
    /// Base reconnect delay as a [`Duration`].
    #[must_use]
    pub fn base_retry_delay(&self) -> Duration {
        Duration::from_millis(self.base_retry_delay_ms)
    }

    /// Synthetic-notification delay as a [`Duration`].
    #[must_use]
    pub fn notification_delay(&self) -> Duration {
        Duration::from_millis(self.notification_delay_ms)
    }
}

/// REST data-access settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApiSettings {
    /// Base URL of the REST API.
    pub base_url: String,
    /// Bearer token attached to every request when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,
    /// Per-request timeout.
    pub request_timeout_ms: u64,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            auth_token: None,
            request_timeout_ms: 10_000,
        }
    }
}

impl ApiSettings {
    /// Request timeout as a [`Duration`].
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Logging configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    /// Default tracing filter when `RUST_LOG` is unset.
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}
