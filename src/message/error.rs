//! Errors surfaced while decoding bus and control-socket messages.

use thiserror::Error;

/// Errors that can occur while decoding a message off the wire.
#[derive(Debug, Error)]
pub enum MessageError {
    #[error("malformed control envelope: {0}")]
    Envelope(#[from] serde_json::Error),

    #[error("unrecognised action '{action}' for service '{service}'")]
    UnknownAction { service: String, action: String },
}
