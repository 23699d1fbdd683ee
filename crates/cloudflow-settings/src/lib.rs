//! # cloudflow-settings
//!
//! Layered configuration for the CloudFlow dashboard sync layer.
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults** — [`CloudflowSettings::default()`]
//! 2. **Settings file** — JSON, partial files allowed (missing fields keep
//!    their defaults)
//! 3. **Environment variables** — `CLOUDFLOW_*` overrides (highest priority)
//!
//! There is no ambient global: the loaded value is passed explicitly into
//! the session that needs it, so construction and teardown stay visible at
//! the call site.

#![deny(unsafe_code)]

pub mod types;

pub use types::*;

use std::path::Path;

use thiserror::Error;

/// Errors raised while loading settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The settings file exists but could not be read.
    #[error("failed to read settings file: {0}")]
    Io(#[from] std::io::Error),
    /// The settings file is not valid JSON for the schema.
    #[error("failed to parse settings file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Load settings from a JSON file, then apply `CLOUDFLOW_*` env overrides.
///
/// A missing file is not an error: defaults are used. A present but
/// malformed file is an error so a typo does not silently revert the
/// operator to defaults.
pub fn load_settings_from_path(path: &Path) -> Result<CloudflowSettings, SettingsError> {
    let mut settings = if path.exists() {
        let raw = std::fs::read_to_string(path)?;
        serde_json::from_str(&raw)?
    } else {
        tracing::debug!(?path, "settings file not found, using defaults");
        CloudflowSettings::default()
    };
    apply_env_overrides(&mut settings, |name| std::env::var(name).ok());
    Ok(settings)
}

/// Apply environment overrides through a lookup function.
///
/// The indirection keeps the override logic testable without mutating
/// process-global state.
pub fn apply_env_overrides(
    settings: &mut CloudflowSettings,
    lookup: impl Fn(&str) -> Option<String>,
) {
    if let Some(endpoint) = lookup("CLOUDFLOW_WS_ENDPOINT") {
        settings.sync.ws_endpoint = endpoint;
    }
    if let Some(base_url) = lookup("CLOUDFLOW_API_BASE_URL") {
        settings.api.base_url = base_url;
    }
    if let Some(token) = lookup("CLOUDFLOW_AUTH_TOKEN") {
        settings.api.auth_token = Some(token);
    }
    if let Some(level) = lookup("CLOUDFLOW_LOG_LEVEL") {
        settings.logging.level = level;
    }
}
