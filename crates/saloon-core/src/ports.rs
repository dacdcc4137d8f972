//! Collaborator ports.
//!
//! The game engine never talks to a transport or a database directly. It
//! goes through these three traits, which a deployment implements against
//! its messaging client and row-store. [`crate::memory`] provides in-memory
//! versions.

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate};

use crate::error::PortResult;
use crate::participant::{
    Affordance, ButtonPress, ChatId, MessageHandle, Participant, ParticipantId,
};
use crate::record::{DailyPick, DuelistStats, PoolEntry};
use crate::role::ChatRole;

/// Sends and mutates chat messages.
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Post a new message, optionally with interactive buttons.
    async fn send(
        &self,
        chat: ChatId,
        text: &str,
        affordances: &[Affordance],
    ) -> PortResult<MessageHandle>;

    /// Replace the text of an existing message. An empty `affordances`
    /// slice removes any buttons.
    async fn edit(
        &self,
        message: MessageHandle,
        text: &str,
        affordances: &[Affordance],
    ) -> PortResult<MessageHandle>;

    /// Delete a message.
    async fn delete(&self, message: MessageHandle) -> PortResult<()>;

    /// Acknowledge a button press so the transport stops waiting on it.
    async fn acknowledge(&self, press: &ButtonPress) -> PortResult<()>;
}

/// Looks up and restricts chat members.
#[async_trait]
pub trait Membership: Send + Sync {
    /// The participant's role in the chat.
    async fn role_of(&self, chat: ChatId, participant: ParticipantId) -> PortResult<ChatRole>;

    /// Allow or forbid sending messages until `until`.
    async fn restrict(
        &self,
        chat: ChatId,
        participant: ParticipantId,
        until: DateTime<FixedOffset>,
        can_send_messages: bool,
    ) -> PortResult<()>;
}

/// Typed upsert and read over the persisted records.
#[async_trait]
pub trait Store: Send + Sync {
    /// Upsert a participant into the directory.
    async fn remember(&self, participant: &Participant) -> PortResult<()>;

    /// A participant by id.
    async fn participant(&self, id: ParticipantId) -> PortResult<Option<Participant>>;

    /// A participant by `@username` or numeric id.
    async fn find_participant(&self, query: &str) -> PortResult<Option<Participant>>;

    /// Duel scoreboard for a participant, if one exists.
    async fn duelist(&self, id: ParticipantId) -> PortResult<Option<DuelistStats>>;

    /// Upsert a duel scoreboard.
    async fn save_duelist(&self, stats: &DuelistStats) -> PortResult<()>;

    /// All lottery registrations, ordered by participant id.
    async fn pool(&self) -> PortResult<Vec<PoolEntry>>;

    /// Register a participant. Returns `false` when already registered.
    async fn add_to_pool(&self, entry: PoolEntry) -> PortResult<bool>;

    /// Deregister a participant. Returns `false` when not registered.
    async fn remove_from_pool(&self, id: ParticipantId) -> PortResult<bool>;

    /// The pick for a calendar date, if drawn.
    async fn daily_pick(&self, date: NaiveDate) -> PortResult<Option<DailyPick>>;

    /// Persist the pick for its date.
    async fn save_daily_pick(&self, pick: &DailyPick) -> PortResult<()>;

    /// All picks with `from <= date < until`.
    async fn picks_between(&self, from: NaiveDate, until: NaiveDate) -> PortResult<Vec<DailyPick>>;
}
