//! Error types shared across the sync layer.

use thiserror::Error;

/// Maximum number of bytes of a bad frame kept for diagnostics.
const FRAME_SNIPPET_LEN: usize = 256;

/// A push-channel frame failed to decode into a [`crate::events::PushEvent`].
///
/// Raised for both malformed JSON and well-formed JSON with an unrecognized
/// `type` tag. The connection is expected to survive this error: callers log
/// it, count it, and keep reading.
#[derive(Debug, Error)]
#[error("failed to decode push frame: {source} (frame: {frame})")]
pub struct EventDecodeError {
    /// The underlying serde error.
    #[source]
    pub source: serde_json::Error,
    /// A truncated copy of the offending frame.
    pub frame: String,
}

impl EventDecodeError {
    /// Build a decode error, truncating the frame to a bounded snippet.
    #[must_use]
    pub fn new(source: serde_json::Error, frame: &str) -> Self {
        let frame = if frame.len() > FRAME_SNIPPET_LEN {
            let mut end = FRAME_SNIPPET_LEN;
            while !frame.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}…", &frame[..end])
        } else {
            frame.to_string()
        };
        Self { source, frame }
    }
}
