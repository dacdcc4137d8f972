//! Identifiers for participants, chats, and messages.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque identifier of a chat participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ParticipantId(pub i64);

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ChatId(pub i64);

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a message within a chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MessageId(pub i64);

/// A message, addressed by its chat and its id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageHandle {
    /// The chat the message lives in.
    pub chat: ChatId,
    /// The message id within the chat.
    pub id: MessageId,
}

impl MessageHandle {
    /// Create a handle for message `id` in `chat`.
    pub fn new(chat: ChatId, id: i64) -> Self {
        Self {
            chat,
            id: MessageId(id),
        }
    }
}

/// Someone who can take part in a game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    /// Stable identifier.
    pub id: ParticipantId,
    /// Given name, always present.
    pub first_name: String,
    /// Family name, if the participant set one.
    #[serde(default)]
    pub last_name: Option<String>,
    /// Handle without the leading `@`.
    #[serde(default)]
    pub username: Option<String>,
    /// Automated accounts cannot play.
    #[serde(default)]
    pub is_bot: bool,
}

impl Participant {
    /// Create a human participant with only a first name.
    pub fn new(id: i64, first_name: impl Into<String>) -> Self {
        Self {
            id: ParticipantId(id),
            first_name: first_name.into(),
            last_name: None,
            username: None,
            is_bot: false,
        }
    }

    /// Set the username.
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Set the last name.
    pub fn with_last_name(mut self, last_name: impl Into<String>) -> Self {
        self.last_name = Some(last_name.into());
        self
    }

    /// Mark the participant as an automated account.
    pub fn as_bot(mut self) -> Self {
        self.is_bot = true;
        self
    }

    /// First and last name joined by a space.
    pub fn full_name(&self) -> String {
        match &self.last_name {
            Some(last) if !last.is_empty() => format!("{} {}", self.first_name, last),
            _ => self.first_name.clone(),
        }
    }

    /// Username if set, otherwise the full name.
    pub fn display_name(&self) -> String {
        match &self.username {
            Some(u) if !u.is_empty() => u.clone(),
            _ => self.full_name(),
        }
    }

    /// An inline HTML link that notifies the participant.
    pub fn mention(&self) -> String {
        format!("<a href=\"tg://user?id={}\">{}</a>", self.id, self.full_name())
    }

    /// Whether `query` (`@username` or a numeric id) names this participant.
    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim();
        if let Some(name) = query.strip_prefix('@') {
            return self
                .username
                .as_deref()
                .is_some_and(|u| u.eq_ignore_ascii_case(name));
        }
        query.parse::<i64>().is_ok_and(|id| id == self.id.0)
    }
}

/// What pressing an interactive button asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AffordanceAction {
    /// Accept a pending duel.
    AcceptDuel,
    /// Decline a pending duel.
    DeclineDuel,
}

/// An interactive button attached to a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Affordance {
    /// Button caption.
    pub label: String,
    /// Action delivered back when pressed.
    pub action: AffordanceAction,
}

impl Affordance {
    /// Create a button.
    pub fn new(label: impl Into<String>, action: AffordanceAction) -> Self {
        Self {
            label: label.into(),
            action,
        }
    }
}

/// A resolved button press: who pressed which message's button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ButtonPress {
    /// Transport id used to acknowledge the press.
    pub id: String,
    /// Who pressed.
    pub presser: Participant,
    /// The message carrying the button.
    pub message: MessageHandle,
}
