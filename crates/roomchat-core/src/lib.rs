//! # roomchat-core
//!
//! Coordination engine for the roomchat terminal client.
//!
//! This crate wires one server connection to one terminal surface:
//!
//! - **DuplexPump** - Two loops bridging a connection to in-process channels
//! - **Router** - Moves messages between the pump and the UI
//! - **Shutdown** - Fire-once signal every task observes
//! - **Identity** - Who the local user is, stamped on every outgoing message
//! - **UiSink** - Where inbound messages are shown
//!
//! ## Architecture
//!
//! ```text
//!                     ┌─────────────┐  inbound   ┌─────────────┐
//! ┌────────────┐ ◀───▶│ DuplexPump  │───────────▶│   Router    │───▶ UiSink
//! │ Connection │      │ read | write│◀───────────│             │◀─── LineSource
//! └────────────┘      └─────────────┘  outbound  └─────────────┘
//!                            │                          │
//!                            └──────── Shutdown ────────┘
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use roomchat_core::{DuplexPump, Identity, QueueSink, Router, Shutdown};
//! use roomchat_transport::MemoryConnection;
//!
//! # async fn run() {
//! let (connection, _peer) = MemoryConnection::pair();
//! let shutdown = Shutdown::new();
//! let (pump, handles) = DuplexPump::start(Box::new(connection), shutdown.clone());
//!
//! let (sink, _displayed) = QueueSink::channel();
//! let (_lines_tx, lines) = tokio::sync::mpsc::unbounded_channel();
//! let identity = Identity::new("Bob", "lobby");
//!
//! Router::new(identity, sink, handles, lines, shutdown).run().await;
//! pump.shutdown().await;
//! # }
//! ```

pub mod identity;
pub mod pump;
pub mod router;
pub mod shutdown;
pub mod ui;

pub use identity::Identity;
pub use pump::{DuplexPump, PumpHandles};
pub use router::Router;
pub use shutdown::{Shutdown, ShutdownReason};
pub use ui::{DisplayLine, LineSource, LineStyle, QueueSink, UiSink};
