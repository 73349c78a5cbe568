//! Session-wide shutdown signal.
//!
//! The signal fires at most once. The first caller of [`Shutdown::trigger`]
//! records why the session ends; later calls are observed as no-ops. Every
//! clone observes the same signal, and once fired it stays fired.

use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info};

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShutdownReason {
    /// The operator asked to quit (signal or quit key).
    Interrupted,
    /// Reading from the connection failed.
    ReadFailed,
    /// Writing to the connection failed.
    WriteFailed,
    /// The server closed the connection.
    PeerClosed,
    /// The terminal surface stopped producing input.
    UiClosed,
    /// The client tore the session down itself.
    LocalClose,
}

impl ShutdownReason {
    /// Whether the session ended because of a transport failure.
    #[must_use]
    pub fn is_transport_failure(&self) -> bool {
        matches!(self, ShutdownReason::ReadFailed | ShutdownReason::WriteFailed)
    }
}

impl fmt::Display for ShutdownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ShutdownReason::Interrupted => "interrupted",
            ShutdownReason::ReadFailed => "read failed",
            ShutdownReason::WriteFailed => "write failed",
            ShutdownReason::PeerClosed => "closed by server",
            ShutdownReason::UiClosed => "ui closed",
            ShutdownReason::LocalClose => "closed locally",
        };
        f.write_str(text)
    }
}

/// A fire-once, broadcast shutdown signal.
#[derive(Debug, Clone)]
pub struct Shutdown {
    state: Arc<watch::Sender<Option<ShutdownReason>>>,
}

impl Shutdown {
    /// Create a new, unfired signal.
    #[must_use]
    pub fn new() -> Self {
        let (state, _) = watch::channel(None);
        Self {
            state: Arc::new(state),
        }
    }

    /// Fire the signal.
    ///
    /// Returns `true` only for the call that actually fired it.
    pub fn trigger(&self, reason: ShutdownReason) -> bool {
        let fired = self.state.send_if_modified(|current| {
            if current.is_some() {
                return false;
            }
            *current = Some(reason);
            true
        });

        if fired {
            info!(%reason, "Shutdown triggered");
        } else {
            debug!(%reason, "Shutdown already triggered");
        }
        fired
    }

    /// Check whether the signal has fired.
    #[must_use]
    pub fn is_triggered(&self) -> bool {
        self.state.borrow().is_some()
    }

    /// The reason recorded by the firing call, if any.
    #[must_use]
    pub fn reason(&self) -> Option<ShutdownReason> {
        *self.state.borrow()
    }

    /// Wait until the signal fires and return its reason.
    ///
    /// Returns immediately if it has already fired. Cancel safe.
    pub async fn wait(&self) -> ShutdownReason {
        let mut rx = self.state.subscribe();
        loop {
            let current = *rx.borrow_and_update();
            if let Some(reason) = current {
                return reason;
            }
            if rx.changed().await.is_err() {
                // Unreachable while `self` holds the sender
                return ShutdownReason::LocalClose;
            }
        }
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
