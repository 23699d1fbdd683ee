//! Branded identifier types.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The push-channel connection identity, generated once per dashboard
/// session.
///
/// UUIDv7 gives the time + random construction the channel contract asks
/// for; the `client_` prefix keeps the identifier recognizable in server
/// logs alongside other id families.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(String);

impl ClientId {
    /// Generate a fresh session identity.
    #[must_use]
    pub fn generate() -> Self {
        Self(format!("client_{}", Uuid::now_v7().simple()))
    }

    /// View as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ClientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ClientId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}
