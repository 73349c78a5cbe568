//! Interfaces to the terminal surface.
//!
//! The core never draws. It hands messages to a [`UiSink`] and reads
//! submitted lines from a [`LineSource`]. How a message looks on screen is
//! decided here by [`DisplayLine::from_message`], so every sink renders the
//! same policy.

use roomchat_protocol::{Message, MessageKind};
use std::fmt;
use tokio::sync::mpsc;
use tracing::trace;

/// Stream of lines the user submitted, one per submission.
pub type LineSource = mpsc::UnboundedReceiver<String>;

/// Something that can show messages to the user.
///
/// Implementations must be callable from any task, must not block, and must
/// swallow their own rendering failures.
pub trait UiSink: Send + Sync {
    /// Schedule a message for display.
    fn display_message(&self, message: Message);
}

/// A sink that forwards messages to the UI's own loop through a channel.
#[derive(Debug, Clone)]
pub struct QueueSink {
    tx: mpsc::UnboundedSender<Message>,
}

impl QueueSink {
    /// Create a sink and the receiver the UI loop drains.
    #[must_use]
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Message>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl UiSink for QueueSink {
    fn display_message(&self, message: Message) {
        if self.tx.send(message).is_err() {
            trace!("UI loop gone, dropping message");
        }
    }
}

/// Visual style of a rendered line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineStyle {
    /// System notice, no sender label.
    Notice,
    /// Another user's message, labelled with their name.
    User,
    /// Anything else, unlabelled.
    Plain,
    /// Local echo of the user's own submission.
    Own,
}

/// A message reduced to what the screen shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayLine {
    /// How to style the line.
    pub style: LineStyle,
    /// Sender label, if the line has one.
    pub label: Option<String>,
    /// Body text.
    pub text: String,
}

impl DisplayLine {
    /// Apply the rendering policy to an inbound message.
    #[must_use]
    pub fn from_message(message: &Message) -> Self {
        match &message.kind {
            MessageKind::ServerNotice => Self {
                style: LineStyle::Notice,
                label: None,
                text: message.content.clone(),
            },
            MessageKind::UserMessage => Self {
                style: LineStyle::User,
                label: Some(message.display_name.clone()),
                text: message.content.clone(),
            },
            MessageKind::Other(_) => Self {
                style: LineStyle::Plain,
                label: None,
                text: message.content.clone(),
            },
        }
    }

    /// Local echo of something the user typed.
    #[must_use]
    pub fn own(text: impl Into<String>) -> Self {
        Self {
            style: LineStyle::Own,
            label: Some("You".to_string()),
            text: text.into(),
        }
    }
}

impl From<&Message> for DisplayLine {
    fn from(message: &Message) -> Self {
        Self::from_message(message)
    }
}

impl fmt::Display for DisplayLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.label {
            Some(label) => write!(f, "{}: {}", label, self.text),
            None => f.write_str(&self.text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_notice_is_unlabelled() {
        let line = DisplayLine::from_message(&Message::notice("lobby", "Alice joined"));
        assert_eq!(line.style, LineStyle::Notice);
        assert_eq!(line.label, None);
        assert_eq!(line.to_string(), "Alice joined");
    }

    #[test]
    fn test_user_message_is_labelled() {
        let line = DisplayLine::from_message(&Message::user("id", "Bob", "lobby", "hello"));
        assert_eq!(line.style, LineStyle::User);
        assert_eq!(line.to_string(), "Bob: hello");
    }

    #[test]
    fn test_unknown_kind_is_plain() {
        let message = Message::new("", MessageKind::from("typing"), "Eve", "lobby", "...");
        let line = DisplayLine::from(&message);
        assert_eq!(line.style, LineStyle::Plain);
        assert_eq!(line.to_string(), "...");
    }

    #[test]
    fn test_own_echo() {
        assert_eq!(DisplayLine::own("hi").to_string(), "You: hi");
    }

    #[test]
    fn test_queue_sink_never_fails() {
        let (sink, rx) = QueueSink::channel();
        drop(rx);
        sink.display_message(Message::notice("lobby", "nobody listening"));
    }

    #[test]
    fn test_queue_sink_preserves_order() {
        let (sink, mut rx) = QueueSink::channel();
        for i in 0..3 {
            sink.display_message(Message::notice("lobby", i.to_string()));
        }
        let received: Vec<_> = std::iter::from_fn(|| rx.try_recv().ok())
            .map(|m| m.content)
            .collect();
        assert_eq!(received, ["0", "1", "2"]);
    }
}
