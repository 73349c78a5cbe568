//! # roomchat-protocol
//!
//! Wire protocol definitions for the roomchat terminal client.
//!
//! This crate defines the message envelope exchanged with a roomchat server
//! and the JSON codec that turns it into frames.
//!
//! ## Message kinds
//!
//! - `server_message` - Notices emitted by the server
//! - `user_message` - Lines typed by users
//! - anything else - Preserved verbatim as [`MessageKind::Other`]
//!
//! ## Example
//!
//! ```rust
//! use roomchat_protocol::{codec, Message};
//!
//! let message = Message::user("3f2c", "Bob", "lobby", "hello");
//!
//! let encoded = codec::encode(&message).unwrap();
//! let decoded = codec::decode(&encoded).unwrap();
//! assert_eq!(message, decoded);
//! ```

pub mod codec;
pub mod message;

pub use codec::{decode, encode, ProtocolError, MAX_FRAME_SIZE};
pub use message::{Message, MessageKind};
