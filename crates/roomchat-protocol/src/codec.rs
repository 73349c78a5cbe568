//! Codec for encoding and decoding roomchat messages.
//!
//! Each frame holds one JSON-encoded [`Message`]. The transport delimits
//! frames, so no length prefix is written.

use bytes::Bytes;
use thiserror::Error;

use crate::message::Message;

/// Maximum frame size (1 MiB).
pub const MAX_FRAME_SIZE: usize = 1024 * 1024;

/// Protocol errors that can occur during encoding/decoding.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Frame exceeds maximum size.
    #[error("Frame size {0} exceeds maximum {MAX_FRAME_SIZE}")]
    FrameTooLarge(usize),

    /// JSON encoding error.
    #[error("Encoding error: {0}")]
    Encode(#[source] serde_json::Error),

    /// JSON decoding error (malformed data or missing required fields).
    #[error("Decoding error: {0}")]
    Decode(#[source] serde_json::Error),
}

impl ProtocolError {
    /// Whether this error came from the decoding direction.
    #[must_use]
    pub fn is_decode(&self) -> bool {
        matches!(self, ProtocolError::Decode(_))
    }
}

/// Encode a message to a frame.
///
/// # Errors
///
/// Returns an error if the encoded frame is too large or serialization fails.
pub fn encode(message: &Message) -> Result<Bytes, ProtocolError> {
    let payload = serde_json::to_vec(message).map_err(ProtocolError::Encode)?;

    if payload.len() > MAX_FRAME_SIZE {
        return Err(ProtocolError::FrameTooLarge(payload.len()));
    }

    Ok(Bytes::from(payload))
}

/// Decode a message from a frame.
///
/// # Errors
///
/// Returns an error if the frame is too large, is not well-formed JSON, or is
/// missing the `type` or `content` field.
pub fn decode(data: &[u8]) -> Result<Message, ProtocolError> {
    if data.len() > MAX_FRAME_SIZE {
        return Err(ProtocolError::FrameTooLarge(data.len()));
    }

    serde_json::from_slice(data).map_err(ProtocolError::Decode)
}
