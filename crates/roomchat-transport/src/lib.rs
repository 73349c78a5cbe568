//! # roomchat-transport
//!
//! Client transport layer for the roomchat terminal client.
//!
//! This crate provides a uniform interface over the connection to a chat
//! server:
//!
//! - **WebSocket** - `ws://` to a local server or `wss://` to the hosted one
//! - **Memory** - In-process loopback used by tests
//!
//! ## Transport Abstraction
//!
//! Every transport yields a [`Connection`] that splits into a read half and a
//! write half, so that the two directions can be driven by separate tasks.
//!
//! ```rust,ignore
//! use roomchat_transport::{Connection, FrameSource};
//!
//! async fn drain(conn: Box<dyn Connection>) {
//!     let (mut reader, _writer) = conn.split();
//!     while let Ok(Some(frame)) = reader.recv().await {
//!         // Process frame
//!     }
//! }
//! ```

pub mod endpoint;
pub mod memory;
pub mod traits;

#[cfg(feature = "websocket")]
pub mod websocket;

pub use endpoint::{Endpoint, ServerMode, DEFAULT_LOCAL_ADDR, DEFAULT_REMOTE_URL};
pub use memory::{MemoryConnection, MemoryPeer};
pub use traits::{
    Connection, ConnectionId, ConnectionState, FrameSink, FrameSource, TransportError,
};

#[cfg(feature = "websocket")]
pub use websocket::{connect, WebSocketConfig, WebSocketConnection};
