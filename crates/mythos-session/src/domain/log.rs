//! Append-only session log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who a log message is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    /// Narration from the game master.
    Gm,
    /// Input typed (or generated) on behalf of the player.
    Player,
    /// Engine bookkeeping such as check results and state updates.
    System,
}

impl MessageKind {
    /// Wire name of the kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Gm => "gm",
            Self::Player => "player",
            Self::System => "system",
        }
    }
}

/// A single log entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogMessage {
    /// Sequence number, unique and increasing within one log.
    pub id: u64,
    /// Message attribution.
    #[serde(rename = "type")]
    pub kind: MessageKind,
    /// Message text.
    pub text: String,
    /// Time the message was appended.
    pub timestamp: DateTime<Utc>,
}

/// Ordered history of a session. Messages are never rewritten or removed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Log {
    messages: Vec<LogMessage>,
}

impl Log {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a message and returns it.
    ///
    /// Ids continue from the last message. A timestamp earlier than the last
    /// message's is raised to it so the log stays non-decreasing.
    pub fn append(
        &mut self,
        kind: MessageKind,
        text: impl Into<String>,
        now: DateTime<Utc>,
    ) -> &LogMessage {
        let (id, timestamp) = match self.messages.last() {
            Some(last) => (last.id + 1, now.max(last.timestamp)),
            None => (1, now),
        };
        self.messages.push(LogMessage {
            id,
            kind,
            text: text.into(),
            timestamp,
        });
        &self.messages[self.messages.len() - 1]
    }

    /// All messages, oldest first.
    #[must_use]
    pub fn messages(&self) -> &[LogMessage] {
        &self.messages
    }

    /// Number of messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether the log has no messages.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// The last `count` messages, oldest first.
    #[must_use]
    pub fn recent(&self, count: usize) -> &[LogMessage] {
        let start = self.messages.len().saturating_sub(count);
        &self.messages[start..]
    }

    /// Messages appended after the first `offset`.
    #[must_use]
    pub fn since(&self, offset: usize) -> &[LogMessage] {
        self.messages.get(offset..).unwrap_or(&[])
    }

    /// Number of messages of `kind`.
    #[must_use]
    pub fn count(&self, kind: MessageKind) -> usize {
        self.messages.iter().filter(|m| m.kind == kind).count()
    }
}
