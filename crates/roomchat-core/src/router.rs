//! Router: the single coordination point between the pump and the UI.
//!
//! The router waits on four event sources at once:
//!
//! 1. inbound messages from the pump, which go to the [`UiSink`];
//! 2. lines submitted in the UI, which become stamped user messages on the
//!    outbound queue;
//! 3. the shutdown signal, which ends the loop;
//! 4. an operator interrupt, which fires the shutdown signal and ends the
//!    loop.

use roomchat_protocol::Message;
use std::future::Future;
use std::pin::Pin;
use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};

use crate::identity::Identity;
use crate::pump::PumpHandles;
use crate::shutdown::{Shutdown, ShutdownReason};
use crate::ui::{LineSource, UiSink};

type Interrupt = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Routes messages between the duplex pump and the terminal surface.
pub struct Router<S> {
    identity: Identity,
    sink: S,
    inbound: mpsc::UnboundedReceiver<Message>,
    outbound: mpsc::UnboundedSender<Message>,
    lines: LineSource,
    shutdown: Shutdown,
    interrupt: Option<Interrupt>,
}

impl<S: UiSink> Router<S> {
    /// Create a router over the pump's channels and the UI's endpoints.
    #[must_use]
    pub fn new(
        identity: Identity,
        sink: S,
        pump: PumpHandles,
        lines: LineSource,
        shutdown: Shutdown,
    ) -> Self {
        Self {
            identity,
            sink,
            inbound: pump.inbound,
            outbound: pump.outbound,
            lines,
            shutdown,
            interrupt: None,
        }
    }

    /// Add an operator interrupt source.
    ///
    /// When `interrupt` completes, the router fires the shutdown signal with
    /// [`ShutdownReason::Interrupted`] and stops.
    #[must_use]
    pub fn with_interrupt<F>(mut self, interrupt: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.interrupt = Some(Box::pin(interrupt));
        self
    }

    /// Run until the shutdown signal fires. Returns the reason.
    pub async fn run(mut self) -> ShutdownReason {
        let mut interrupt: Interrupt = match self.interrupt.take() {
            Some(interrupt) => interrupt,
            None => Box::pin(std::future::pending()),
        };
        let mut inbound_open = true;
        let mut lines_open = true;

        info!(room = %self.identity.room(), name = %self.identity.display_name(), "Router started");

        loop {
            tokio::select! {
                biased;

                reason = self.shutdown.wait() => {
                    self.drain_inbound();
                    debug!(%reason, "Router stopping");
                    return reason;
                }

                () = &mut interrupt => {
                    info!("Interrupt received");
                    self.shutdown.trigger(ShutdownReason::Interrupted);
                    self.drain_inbound();
                    return self.shutdown.reason().unwrap_or(ShutdownReason::Interrupted);
                }

                message = self.inbound.recv(), if inbound_open => match message {
                    Some(message) => self.dispatch(message),
                    None => {
                        // The pump fires shutdown before it drops this channel
                        debug!("Inbound channel closed");
                        inbound_open = false;
                    }
                },

                line = self.lines.recv(), if lines_open => match line {
                    Some(line) => {
                        self.submit(&line);
                    }
                    None => {
                        info!("UI input closed");
                        lines_open = false;
                        self.shutdown.trigger(ShutdownReason::UiClosed);
                    }
                },
            }
        }
    }

    /// Dispatch messages the pump published before shutdown fired.
    fn drain_inbound(&mut self) {
        let mut drained = 0usize;
        while let Ok(message) = self.inbound.try_recv() {
            self.dispatch(message);
            drained += 1;
        }
        if drained > 0 {
            debug!(drained, "Dispatched messages received before shutdown");
        }
    }

    /// Hand an inbound message to the UI sink.
    fn dispatch(&self, message: Message) {
        trace!(kind = %message.kind, "Dispatching message to UI");
        self.sink.display_message(message);
    }

    /// Stamp a submitted line and enqueue it for sending.
    ///
    /// Empty lines are ignored. Returns whether a message was enqueued.
    pub fn submit(&self, line: &str) -> bool {
        if line.is_empty() {
            trace!("Ignoring empty line");
            return false;
        }

        let message = self.identity.message(line);
        if self.outbound.send(message).is_err() {
            warn!("Outbound queue closed, message dropped");
            return false;
        }

        debug!(len = line.len(), "Queued message");
        true
    }
}
