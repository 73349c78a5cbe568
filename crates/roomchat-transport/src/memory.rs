//! In-process loopback transport.
//!
//! [`MemoryConnection::pair`] returns a client-side [`Connection`] and a
//! [`MemoryPeer`] that plays the server. The peer can push frames, inject
//! read failures, make writes fail or stall, and close the connection, which
//! makes it the transport of choice for exercising the pump without a
//! network.

use async_trait::async_trait;
use bytes::Bytes;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Notify};
use tracing::debug;

use crate::traits::{Connection, ConnectionId, FrameSink, FrameSource, TransportError};

/// Something the peer delivers to the client's read half.
#[derive(Debug)]
enum Inbound {
    Frame(Bytes),
    Error(String),
    Close,
}

/// State shared between the client halves and the peer.
#[derive(Debug, Default)]
struct Shared {
    fail_writes: AtomicBool,
    hold_writes: AtomicBool,
    held_writes: AtomicUsize,
    release: Notify,
    close_count: AtomicUsize,
    is_open: AtomicBool,
}

/// Client side of an in-process connection.
pub struct MemoryConnection {
    id: ConnectionId,
    max_frame_size: usize,
    inbound: mpsc::UnboundedReceiver<Inbound>,
    outbound: mpsc::UnboundedSender<Bytes>,
    shared: Arc<Shared>,
}

impl MemoryConnection {
    /// Create a connected client/peer pair with no frame size limit.
    #[must_use]
    pub fn pair() -> (Self, MemoryPeer) {
        Self::pair_with_limit(usize::MAX)
    }

    /// Create a pair whose read half rejects frames longer than
    /// `max_frame_size`, like a size-limited WebSocket reader.
    #[must_use]
    pub fn pair_with_limit(max_frame_size: usize) -> (Self, MemoryPeer) {
        let (to_client, inbound) = mpsc::unbounded_channel();
        let (outbound, from_client) = mpsc::unbounded_channel();
        let shared = Arc::new(Shared {
            is_open: AtomicBool::new(true),
            ..Shared::default()
        });

        let conn = Self {
            id: ConnectionId::generate(),
            max_frame_size,
            inbound,
            outbound,
            shared: Arc::clone(&shared),
        };
        let peer = MemoryPeer {
            to_client,
            from_client,
            shared,
        };

        (conn, peer)
    }
}

impl Connection for MemoryConnection {
    fn id(&self) -> &ConnectionId {
        &self.id
    }

    fn remote_addr(&self) -> Option<String> {
        Some("memory".to_string())
    }

    fn split(self: Box<Self>) -> (Box<dyn FrameSource>, Box<dyn FrameSink>) {
        let this = *self;
        let reader = MemoryReader {
            max_frame_size: this.max_frame_size,
            inbound: this.inbound,
            shared: Arc::clone(&this.shared),
        };
        let writer = MemoryWriter {
            id: this.id,
            outbound: this.outbound,
            shared: this.shared,
        };
        (Box::new(reader), Box::new(writer))
    }
}

/// Read half of a [`MemoryConnection`].
pub struct MemoryReader {
    max_frame_size: usize,
    inbound: mpsc::UnboundedReceiver<Inbound>,
    shared: Arc<Shared>,
}

#[async_trait]
impl FrameSource for MemoryReader {
    async fn recv(&mut self) -> Result<Option<Bytes>, TransportError> {
        match self.inbound.recv().await {
            Some(Inbound::Frame(frame)) if frame.len() > self.max_frame_size => {
                Err(TransportError::FrameTooLarge {
                    size: frame.len(),
                    limit: self.max_frame_size,
                })
            }
            Some(Inbound::Frame(frame)) => Ok(Some(frame)),
            Some(Inbound::Error(reason)) => {
                self.shared.is_open.store(false, Ordering::SeqCst);
                Err(TransportError::ReceiveFailed(reason))
            }
            Some(Inbound::Close) | None => {
                self.shared.is_open.store(false, Ordering::SeqCst);
                Ok(None)
            }
        }
    }
}

/// Write half of a [`MemoryConnection`].
pub struct MemoryWriter {
    id: ConnectionId,
    outbound: mpsc::UnboundedSender<Bytes>,
    shared: Arc<Shared>,
}

impl MemoryWriter {
    async fn wait_for_release(&self) {
        loop {
            let released = self.shared.release.notified();
            if !self.shared.hold_writes.load(Ordering::SeqCst) {
                return;
            }
            self.shared.held_writes.fetch_add(1, Ordering::SeqCst);
            released.await;
            self.shared.held_writes.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

#[async_trait]
impl FrameSink for MemoryWriter {
    async fn send(&mut self, frame: Bytes) -> Result<(), TransportError> {
        self.wait_for_release().await;

        if self.shared.fail_writes.load(Ordering::SeqCst) {
            return Err(TransportError::SendFailed("injected write failure".into()));
        }
        if !self.shared.is_open.load(Ordering::SeqCst) {
            return Err(TransportError::ConnectionClosed);
        }
        self.outbound
            .send(frame)
            .map_err(|_| TransportError::SendFailed("peer dropped".into()))
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.shared.close_count.fetch_add(1, Ordering::SeqCst);
        if self.shared.is_open.swap(false, Ordering::SeqCst) {
            debug!(connection = %self.id, "Closing loopback connection");
        }
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.shared.is_open.load(Ordering::SeqCst)
    }
}

/// Server side of an in-process connection.
pub struct MemoryPeer {
    to_client: mpsc::UnboundedSender<Inbound>,
    from_client: mpsc::UnboundedReceiver<Bytes>,
    shared: Arc<Shared>,
}

impl MemoryPeer {
    /// Deliver a frame to the client. Returns `false` if the client is gone.
    pub fn push(&self, frame: impl Into<Bytes>) -> bool {
        self.to_client.send(Inbound::Frame(frame.into())).is_ok()
    }

    /// Make the client's next read fail.
    pub fn fail_read(&self, reason: impl Into<String>) -> bool {
        self.to_client.send(Inbound::Error(reason.into())).is_ok()
    }

    /// Make every subsequent client write fail.
    pub fn fail_writes(&self) {
        self.shared.fail_writes.store(true, Ordering::SeqCst);
    }

    /// Make client writes wait until [`MemoryPeer::release_writes`].
    pub fn hold_writes(&self) {
        self.shared.hold_writes.store(true, Ordering::SeqCst);
    }

    /// Let held and future client writes proceed.
    pub fn release_writes(&self) {
        self.shared.hold_writes.store(false, Ordering::SeqCst);
        self.shared.release.notify_waiters();
    }

    /// Number of client writes currently waiting on a hold.
    #[must_use]
    pub fn held_writes(&self) -> usize {
        self.shared.held_writes.load(Ordering::SeqCst)
    }

    /// Close the connection from the peer side.
    pub fn close(&self) -> bool {
        self.to_client.send(Inbound::Close).is_ok()
    }

    /// Receive the next frame the client wrote.
    pub async fn recv(&mut self) -> Option<Bytes> {
        self.from_client.recv().await
    }

    /// Receive a frame the client already wrote, without waiting.
    pub fn try_recv(&mut self) -> Option<Bytes> {
        self.from_client.try_recv().ok()
    }

    /// Number of times the client invoked `close`.
    #[must_use]
    pub fn close_calls(&self) -> usize {
        self.shared.close_count.load(Ordering::SeqCst)
    }

    /// Whether the client considers the connection open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.shared.is_open.load(Ordering::SeqCst)
    }
}
