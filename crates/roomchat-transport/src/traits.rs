//! Transport abstraction traits for roomchat.
//!
//! A [`Connection`] is one live bidirectional frame stream to a server. It is
//! split once into a [`FrameSource`] (read half) and a [`FrameSink`] (write
//! half) so that reading and writing can progress on separate tasks without
//! sharing a lock.

use async_trait::async_trait;
use bytes::Bytes;
use std::fmt;
use thiserror::Error;

/// Unique identifier for a connection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConnectionId(pub String);

impl ConnectionId {
    /// Create a new connection ID.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a random connection ID.
    #[must_use]
    pub fn generate() -> Self {
        Self(format!("conn_{}", uuid::Uuid::new_v4().simple()))
    }

    /// Get the ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ConnectionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ConnectionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Lifecycle state of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    /// Handshake in progress.
    Connecting,
    /// Frames can flow in both directions.
    Open,
    /// Close handshake in progress.
    Closing,
    /// Fully closed.
    Closed,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConnectionState::Connecting => "connecting",
            ConnectionState::Open => "open",
            ConnectionState::Closing => "closing",
            ConnectionState::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// Transport errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Failed to establish the connection.
    #[error("Connect to {url} failed: {reason}")]
    Connect {
        /// Endpoint that was dialed.
        url: String,
        /// Underlying failure.
        reason: String,
    },

    /// Connection was closed.
    #[error("Connection closed")]
    ConnectionClosed,

    /// Failed to send data.
    #[error("Send failed: {0}")]
    SendFailed(String),

    /// Failed to receive data.
    #[error("Receive failed: {0}")]
    ReceiveFailed(String),

    /// Inbound frame exceeds the configured limit.
    #[error("Frame of {size} bytes exceeds limit of {limit} bytes")]
    FrameTooLarge {
        /// Size of the offending frame.
        size: usize,
        /// Configured maximum.
        limit: usize,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error.
    #[error("{0}")]
    Other(String),
}

impl TransportError {
    /// Whether the error ends the connection.
    ///
    /// An oversized frame is rejected on its own; the stream stays usable.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        !matches!(self, TransportError::FrameTooLarge { .. })
    }
}

/// The read half of a connection.
#[async_trait]
pub trait FrameSource: Send {
    /// Receive the next frame.
    ///
    /// Suspends until a frame arrives. Returns `Ok(None)` once the peer has
    /// closed the connection cleanly.
    async fn recv(&mut self) -> Result<Option<Bytes>, TransportError>;
}

/// The write half of a connection.
#[async_trait]
pub trait FrameSink: Send {
    /// Send one frame.
    async fn send(&mut self, frame: Bytes) -> Result<(), TransportError>;

    /// Perform the close handshake and release the stream.
    ///
    /// Calling this more than once is a no-op.
    async fn close(&mut self) -> Result<(), TransportError>;

    /// Check if the write half is still open.
    fn is_open(&self) -> bool;
}

/// An established connection to a server.
pub trait Connection: Send {
    /// Get the connection's unique identifier.
    fn id(&self) -> &ConnectionId;

    /// Get the remote endpoint, if known.
    fn remote_addr(&self) -> Option<String> {
        None
    }

    /// Split the connection into independently owned read and write halves.
    fn split(self: Box<Self>) -> (Box<dyn FrameSource>, Box<dyn FrameSink>);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_id_generation() {
        let id1 = ConnectionId::generate();
        let id2 = ConnectionId::generate();
        assert_ne!(id1, id2);
        assert!(id1.as_str().starts_with("conn_"));
    }

    #[test]
    fn test_connection_id_from_string() {
        let id: ConnectionId = "test-id".into();
        assert_eq!(id.as_str(), "test-id");
    }

    #[test]
    fn test_connection_state_display() {
        assert_eq!(ConnectionState::Open.to_string(), "open");
        assert_eq!(ConnectionState::Closed.to_string(), "closed");
    }
}
