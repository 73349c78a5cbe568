//! Message envelope for the roomchat protocol.
//!
//! Every frame on the wire carries exactly one [`Message`]. The envelope is a
//! flat JSON object with the fields `id`, `type`, `name`, `room` and
//! `content`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Wire value for server-originated notices.
pub const SERVER_MESSAGE: &str = "server_message";

/// Wire value for messages typed by a user.
pub const USER_MESSAGE: &str = "user_message";

/// The kind of a message.
///
/// Kinds only drive rendering; they carry no other behaviour. Unknown kinds
/// are preserved verbatim so that re-encoding a decoded message is lossless.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MessageKind {
    /// A notice emitted by the server (joins, leaves, announcements).
    ServerNotice,
    /// A chat line typed by a user.
    UserMessage,
    /// Any other kind, kept as the raw wire value.
    Other(String),
}

impl MessageKind {
    /// Get the wire representation of this kind.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            MessageKind::ServerNotice => SERVER_MESSAGE,
            MessageKind::UserMessage => USER_MESSAGE,
            MessageKind::Other(raw) => raw,
        }
    }
}

impl From<String> for MessageKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            SERVER_MESSAGE => MessageKind::ServerNotice,
            USER_MESSAGE => MessageKind::UserMessage,
            _ => MessageKind::Other(value),
        }
    }
}

impl From<&str> for MessageKind {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<MessageKind> for String {
    fn from(kind: MessageKind) -> String {
        match kind {
            MessageKind::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A chat message as exchanged with the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Identity token of the sender.
    #[serde(default)]
    pub id: String,

    /// Message kind.
    #[serde(rename = "type")]
    pub kind: MessageKind,

    /// Display name of the sender.
    #[serde(rename = "name", default)]
    pub display_name: String,

    /// Room the message belongs to.
    #[serde(default)]
    pub room: String,

    /// Textual content.
    pub content: String,
}

impl Message {
    /// Create a new message.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        kind: MessageKind,
        display_name: impl Into<String>,
        room: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            display_name: display_name.into(),
            room: room.into(),
            content: content.into(),
        }
    }

    /// Create a user message.
    #[must_use]
    pub fn user(
        id: impl Into<String>,
        display_name: impl Into<String>,
        room: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self::new(id, MessageKind::UserMessage, display_name, room, content)
    }

    /// Create a server notice with no sender.
    #[must_use]
    pub fn notice(room: impl Into<String>, content: impl Into<String>) -> Self {
        Self::new("", MessageKind::ServerNotice, "", room, content)
    }

    /// Check whether this message was typed by a user.
    #[must_use]
    pub fn is_user_message(&self) -> bool {
        self.kind == MessageKind::UserMessage
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_wire_values() {
        assert_eq!(MessageKind::from("server_message"), MessageKind::ServerNotice);
        assert_eq!(MessageKind::from("user_message"), MessageKind::UserMessage);
        assert_eq!(
            MessageKind::from("typing"),
            MessageKind::Other("typing".to_string())
        );
    }

    #[test]
    fn test_kind_into_string_preserves_raw() {
        let raw: String = MessageKind::Other("presence".into()).into();
        assert_eq!(raw, "presence");

        let user: String = MessageKind::UserMessage.into();
        assert_eq!(user, USER_MESSAGE);
    }

    #[test]
    fn test_message_constructors() {
        let msg = Message::user("id-1", "Bob", "lobby", "hello");
        assert!(msg.is_user_message());
        assert_eq!(msg.display_name, "Bob");

        let notice = Message::notice("lobby", "Alice joined");
        assert_eq!(notice.kind, MessageKind::ServerNotice);
        assert!(notice.display_name.is_empty());
    }
}
