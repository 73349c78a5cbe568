//! Session identity.

use roomchat_protocol::Message;
use uuid::Uuid;

/// Who the local user is and which room they joined.
///
/// Created once per session before connecting and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    id: String,
    display_name: String,
    room: String,
}

impl Identity {
    /// Create an identity with a fresh random id.
    #[must_use]
    pub fn new(display_name: impl Into<String>, room: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4().to_string(), display_name, room)
    }

    /// Create an identity with a known id.
    #[must_use]
    pub fn with_id(
        id: impl Into<String>,
        display_name: impl Into<String>,
        room: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            room: room.into(),
        }
    }

    /// Opaque unique token for this session.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Name shown to other users.
    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Room this session joined.
    #[must_use]
    pub fn room(&self) -> &str {
        &self.room
    }

    /// Build a user message stamped with this identity.
    #[must_use]
    pub fn message(&self, content: impl Into<String>) -> Message {
        Message::user(&self.id, &self.display_name, &self.room, content)
    }
}
