//! Codec trait and implementations for serializing/deserializing messages.
//!
//! The protocol layer doesn't care HOW messages become bytes; it needs
//! something that implements [`Codec`]. [`JsonCodec`] is the one the
//! browser client speaks.

use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::{ClientRequest, ProtocolError};

/// A codec that can encode Rust types to bytes and decode bytes back.
///
/// `Send + Sync + 'static` because one codec instance is shared by every
/// connection task for the lifetime of the server.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed,
    /// incomplete, or don't match the expected type.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

/// Just enough of a request to read its `action` tag.
#[derive(Deserialize)]
struct ActionProbe {
    #[serde(default)]
    action: Option<String>,
}

/// Decodes a client request, classifying what's wrong with bad input.
///
/// Runs in two passes so an unrecognized action is reported as
/// [`ProtocolError::UnknownAction`] instead of a generic decode failure.
///
/// ```rust
/// use hangroom_protocol::{decode_request, ClientRequest, JsonCodec, ProtocolError};
///
/// let req = decode_request(&JsonCodec, br#"{"action":"guess","letter":"e"}"#).unwrap();
/// assert_eq!(req, ClientRequest::Guess { letter: "e".into() });
///
/// let err = decode_request(&JsonCodec, br#"{"action":"dance"}"#).unwrap_err();
/// assert!(matches!(err, ProtocolError::UnknownAction(a) if a == "dance"));
/// ```
pub fn decode_request<C: Codec>(codec: &C, data: &[u8]) -> Result<ClientRequest, ProtocolError> {
    let probe: ActionProbe = codec.decode(data)?;
    let action = probe
        .action
        .ok_or_else(|| ProtocolError::InvalidMessage("missing action".into()))?;
    if !ClientRequest::ACTIONS.contains(&action.as_str()) {
        return Err(ProtocolError::UnknownAction(action));
    }
    codec.decode(data)
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// Behind the `json` feature flag (enabled by default).
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
