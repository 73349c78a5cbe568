//! Duplex pump.
//!
//! Bridges one [`Connection`] into two tasks so that neither direction can
//! stall the other:
//!
//! - the **inbound loop** owns the read half, decodes frames and publishes
//!   messages on an unbounded channel;
//! - the **outbound loop** owns the write half and writes messages taken
//!   from the outbound queue.
//!
//! Either loop fires the shared [`Shutdown`] when its half of the transport
//! fails, and both exit as soon as the signal fires. [`DuplexPump::shutdown`]
//! joins both loops before running the close handshake, so a write can never
//! race the close.

use roomchat_protocol::{codec, Message};
use roomchat_transport::{Connection, ConnectionId, ConnectionState, FrameSink, FrameSource};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace, warn};

use crate::shutdown::{Shutdown, ShutdownReason};

/// The Router's ends of the pump's channels.
#[derive(Debug)]
pub struct PumpHandles {
    /// Decoded messages from the server, in receive order.
    pub inbound: mpsc::UnboundedReceiver<Message>,
    /// Queue of messages to send.
    pub outbound: mpsc::UnboundedSender<Message>,
}

/// Two concurrent loops bound to one connection.
pub struct DuplexPump {
    id: ConnectionId,
    shutdown: Shutdown,
    inbound_task: JoinHandle<()>,
    outbound_task: JoinHandle<Box<dyn FrameSink>>,
}

impl DuplexPump {
    /// Split `connection` and spawn both loops.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(connection: Box<dyn Connection>, shutdown: Shutdown) -> (Self, PumpHandles) {
        let id = connection.id().clone();
        let (reader, writer) = connection.split();

        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();

        let inbound_task = tokio::spawn(inbound_loop(
            id.clone(),
            reader,
            inbound_tx,
            shutdown.clone(),
        ));
        let outbound_task = tokio::spawn(outbound_loop(
            id.clone(),
            writer,
            outbound_rx,
            shutdown.clone(),
        ));

        debug!(connection = %id, "Duplex pump started");

        let pump = Self {
            id,
            shutdown,
            inbound_task,
            outbound_task,
        };
        let handles = PumpHandles {
            inbound: inbound_rx,
            outbound: outbound_tx,
        };

        (pump, handles)
    }

    /// The connection this pump drives.
    #[must_use]
    pub fn id(&self) -> &ConnectionId {
        &self.id
    }

    /// `Open` while either loop runs, `Closed` once both have exited.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        if self.inbound_task.is_finished() && self.outbound_task.is_finished() {
            ConnectionState::Closed
        } else {
            ConnectionState::Open
        }
    }

    /// Stop both loops and close the connection.
    ///
    /// Fires the shutdown signal if nothing else has, waits for both loops
    /// to exit, then performs the close handshake on the write half. Close
    /// failures are logged, not returned. Returns the reason the session
    /// ended.
    pub async fn shutdown(self) -> ShutdownReason {
        self.shutdown.trigger(ShutdownReason::LocalClose);

        if let Err(e) = self.inbound_task.await {
            error!(connection = %self.id, error = %e, "Inbound loop did not exit cleanly");
        }

        match self.outbound_task.await {
            Ok(mut writer) => {
                if let Err(e) = writer.close().await {
                    warn!(connection = %self.id, error = %e, "Close handshake failed");
                }
            }
            Err(e) => {
                error!(connection = %self.id, error = %e, "Outbound loop did not exit cleanly");
            }
        }

        let reason = self.shutdown.wait().await;
        info!(connection = %self.id, %reason, "Connection closed");
        reason
    }
}

async fn inbound_loop(
    id: ConnectionId,
    mut reader: Box<dyn FrameSource>,
    messages: mpsc::UnboundedSender<Message>,
    shutdown: Shutdown,
) {
    loop {
        let result = tokio::select! {
            biased;

            _ = shutdown.wait() => {
                debug!(connection = %id, "Inbound loop stopping");
                return;
            }

            result = reader.recv() => result,
        };

        match result {
            Ok(Some(frame)) => match codec::decode(&frame) {
                Ok(message) => {
                    trace!(connection = %id, kind = %message.kind, "Received message");
                    if messages.send(message).is_err() {
                        debug!(connection = %id, "Inbound receiver dropped");
                        shutdown.trigger(ShutdownReason::UiClosed);
                        return;
                    }
                }
                Err(e) => {
                    warn!(connection = %id, error = %e, "Discarding malformed frame");
                }
            },
            Ok(None) => {
                info!(connection = %id, "Server closed the connection");
                shutdown.trigger(ShutdownReason::PeerClosed);
                return;
            }
            Err(e) if !e.is_fatal() => {
                warn!(connection = %id, error = %e, "Discarding frame");
            }
            Err(e) => {
                error!(connection = %id, error = %e, "Read failed");
                shutdown.trigger(ShutdownReason::ReadFailed);
                return;
            }
        }
    }
}

async fn outbound_loop(
    id: ConnectionId,
    mut writer: Box<dyn FrameSink>,
    mut queue: mpsc::UnboundedReceiver<Message>,
    shutdown: Shutdown,
) -> Box<dyn FrameSink> {
    loop {
        let message = tokio::select! {
            biased;

            _ = shutdown.wait() => break,

            message = queue.recv() => match message {
                Some(message) => message,
                None => {
                    debug!(connection = %id, "Outbound queue closed");
                    shutdown.trigger(ShutdownReason::LocalClose);
                    break;
                }
            },
        };

        let frame = match codec::encode(&message) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(connection = %id, error = %e, "Dropping message that failed to encode");
                continue;
            }
        };

        if let Err(e) = writer.send(frame).await {
            error!(connection = %id, error = %e, "Write failed");
            shutdown.trigger(ShutdownReason::WriteFailed);
            break;
        }
        trace!(connection = %id, "Sent message");
    }

    // Anything still queued is dropped unsent
    queue.close();
    let mut dropped = 0usize;
    while queue.try_recv().is_ok() {
        dropped += 1;
    }
    if dropped > 0 {
        debug!(connection = %id, dropped, "Outbound messages dropped at shutdown");
    }

    debug!(connection = %id, "Outbound loop stopped");
    writer
}
