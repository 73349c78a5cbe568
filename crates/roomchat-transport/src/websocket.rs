//! WebSocket transport implementation.
//!
//! This module provides a WebSocket client transport using tokio-tungstenite.
//! Frames are sent as text messages; binary messages are accepted on receive.

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use std::borrow::Cow;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio_tungstenite::{
    connect_async,
    tungstenite::{
        protocol::{frame::coding::CloseCode, CloseFrame},
        Error as WsError, Message,
    },
    MaybeTlsStream, WebSocketStream,
};
use tracing::{debug, error, info, trace, warn};

use crate::endpoint::Endpoint;
use crate::traits::{Connection, ConnectionId, FrameSink, FrameSource, TransportError};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// WebSocket transport configuration.
#[derive(Debug, Clone)]
pub struct WebSocketConfig {
    /// Maximum inbound message size in bytes.
    pub max_message_size: usize,
}

impl Default for WebSocketConfig {
    fn default() -> Self {
        Self {
            max_message_size: 64 * 1024, // 64 KB
        }
    }
}

/// Dial a server endpoint and complete the WebSocket handshake.
///
/// # Errors
///
/// Returns [`TransportError::Connect`] if the TCP connection, TLS session or
/// WebSocket upgrade fails.
pub async fn connect(
    endpoint: &Endpoint,
    config: &WebSocketConfig,
) -> Result<WebSocketConnection, TransportError> {
    if endpoint.is_secure() {
        install_crypto_provider();
    }

    debug!(url = %endpoint, "Dialing server");

    let (stream, response) = connect_async(endpoint.url()).await.map_err(|e| {
        error!(url = %endpoint, error = %e, "WebSocket handshake failed");
        TransportError::Connect {
            url: endpoint.url().to_string(),
            reason: e.to_string(),
        }
    })?;

    let conn = WebSocketConnection::new(stream, endpoint.url().to_string(), config.max_message_size);
    info!(
        connection = %conn.id,
        url = %endpoint,
        status = %response.status(),
        "WebSocket connected"
    );

    Ok(conn)
}

/// Install the ring provider as the process-wide rustls default.
///
/// A provider may already be installed by another component; that is fine.
fn install_crypto_provider() {
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        trace!("rustls crypto provider already installed");
    }
}

/// A WebSocket connection to a server.
pub struct WebSocketConnection {
    id: ConnectionId,
    stream: WsStream,
    remote_addr: String,
    max_message_size: usize,
}

impl WebSocketConnection {
    fn new(stream: WsStream, remote_addr: String, max_message_size: usize) -> Self {
        Self {
            id: ConnectionId::generate(),
            stream,
            remote_addr,
            max_message_size,
        }
    }
}

impl Connection for WebSocketConnection {
    fn id(&self) -> &ConnectionId {
        &self.id
    }

    fn remote_addr(&self) -> Option<String> {
        Some(self.remote_addr.clone())
    }

    fn split(self: Box<Self>) -> (Box<dyn FrameSource>, Box<dyn FrameSink>) {
        let this = *self;
        let (sink, stream) = this.stream.split();
        let is_open = Arc::new(AtomicBool::new(true));

        let reader = WebSocketReader {
            id: this.id.clone(),
            stream,
            is_open: Arc::clone(&is_open),
            max_message_size: this.max_message_size,
        };
        let writer = WebSocketWriter {
            id: this.id,
            sink,
            is_open,
            closed: false,
        };

        (Box::new(reader), Box::new(writer))
    }
}

/// Read half of a [`WebSocketConnection`].
pub struct WebSocketReader {
    id: ConnectionId,
    stream: SplitStream<WsStream>,
    is_open: Arc<AtomicBool>,
    max_message_size: usize,
}

impl WebSocketReader {
    fn check_size(&self, len: usize) -> Result<(), TransportError> {
        if len > self.max_message_size {
            warn!(
                connection = %self.id,
                "Message too large: {} bytes (max: {})",
                len,
                self.max_message_size
            );
            return Err(TransportError::FrameTooLarge {
                size: len,
                limit: self.max_message_size,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl FrameSource for WebSocketReader {
    async fn recv(&mut self) -> Result<Option<Bytes>, TransportError> {
        loop {
            match self.stream.next().await {
                Some(Ok(Message::Text(text))) => {
                    self.check_size(text.len())?;
                    return Ok(Some(Bytes::from(text)));
                }
                Some(Ok(Message::Binary(data))) => {
                    self.check_size(data.len())?;
                    return Ok(Some(Bytes::from(data)));
                }
                Some(Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_))) => {
                    // Control traffic; tungstenite queues pong replies itself
                }
                Some(Ok(Message::Close(frame))) => {
                    debug!(connection = %self.id, ?frame, "Received close frame");
                    self.is_open.store(false, Ordering::SeqCst);
                    return Ok(None);
                }
                Some(Err(WsError::ConnectionClosed | WsError::AlreadyClosed)) => {
                    debug!(connection = %self.id, "Connection closed");
                    self.is_open.store(false, Ordering::SeqCst);
                    return Ok(None);
                }
                Some(Err(e)) => {
                    error!(connection = %self.id, error = %e, "WebSocket error");
                    self.is_open.store(false, Ordering::SeqCst);
                    return Err(TransportError::ReceiveFailed(e.to_string()));
                }
                None => {
                    debug!(connection = %self.id, "WebSocket stream ended");
                    self.is_open.store(false, Ordering::SeqCst);
                    return Ok(None);
                }
            }
        }
    }
}

/// Write half of a [`WebSocketConnection`].
pub struct WebSocketWriter {
    id: ConnectionId,
    sink: SplitSink<WsStream, Message>,
    /// Cleared by either half once the connection stops carrying data.
    is_open: Arc<AtomicBool>,
    /// Set once `close` has run.
    closed: bool,
}

#[async_trait]
impl FrameSink for WebSocketWriter {
    async fn send(&mut self, frame: Bytes) -> Result<(), TransportError> {
        if !self.is_open() {
            return Err(TransportError::ConnectionClosed);
        }

        let text = String::from_utf8(frame.to_vec())
            .map_err(|e| TransportError::SendFailed(format!("frame is not UTF-8: {}", e)))?;

        self.sink
            .send(Message::Text(text))
            .await
            .map_err(|e| TransportError::SendFailed(e.to_string()))
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        let result = if self.is_open.swap(false, Ordering::SeqCst) {
            debug!(connection = %self.id, "Sending close frame");
            let frame = CloseFrame {
                code: CloseCode::Normal,
                reason: Cow::Borrowed(""),
            };
            match self.sink.send(Message::Close(Some(frame))).await {
                Ok(()) => self.sink.close().await,
                Err(e) => Err(e),
            }
        } else {
            // The peer closed first; flush the queued close reply
            debug!(connection = %self.id, "Completing close started by peer");
            self.sink.close().await
        };

        match result {
            Ok(()) | Err(WsError::ConnectionClosed | WsError::AlreadyClosed) => Ok(()),
            Err(e) => Err(TransportError::Other(format!("Failed to close: {}", e))),
        }
    }

    fn is_open(&self) -> bool {
        !self.closed && self.is_open.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_websocket_config_default() {
        let config = WebSocketConfig::default();
        assert_eq!(config.max_message_size, 64 * 1024);
    }

    #[tokio::test]
    async fn test_connect_refused() {
        // Reserve a free port, then release it so nothing is listening
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let endpoint = Endpoint::local(&addr.to_string());
        let result = connect(&endpoint, &WebSocketConfig::default()).await;
        assert!(matches!(result, Err(TransportError::Connect { .. })));
    }
}
