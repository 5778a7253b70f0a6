//! Error types for the protocol layer.
//!
//! A `ProtocolError` means the problem is in turning bytes into requests
//! (or events into bytes), never in the game itself.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into bytes).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed: malformed JSON, missing required fields,
    /// or wrong data types.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The request named an action this server doesn't implement.
    #[error("unknown action: {0}")]
    UnknownAction(String),

    /// The message passed deserialization but violates protocol rules,
    /// e.g. a request without an `action` field.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}

impl ProtocolError {
    /// The text reported back to the client that sent the bad request.
    ///
    /// Decoder internals stay in the server logs.
    pub fn client_message(&self) -> String {
        match self {
            Self::UnknownAction(action) => format!("Unknown action: {action}"),
            _ => "Invalid message".to_string(),
        }
    }
}
