//! In-memory collaborators.
//!
//! Used by the terminal driver and by tests. [`MemoryStore`] can be saved
//! to and restored from JSON so a terminal session keeps its records.

use std::collections::{BTreeMap, HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::error::{CollaboratorError, PortResult};
use crate::participant::{
    Affordance, ButtonPress, ChatId, MessageHandle, Participant, ParticipantId,
};
use crate::ports::{Membership, Messenger, Store};
use crate::record::{DailyPick, DuelistStats, PoolEntry};
use crate::role::ChatRole;

/// Serializable contents of a [`MemoryStore`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    /// Participant directory.
    #[serde(default)]
    pub participants: Vec<Participant>,
    /// Duel scoreboards.
    #[serde(default)]
    pub duelists: Vec<DuelistStats>,
    /// Lottery registrations.
    #[serde(default)]
    pub pool: Vec<PoolEntry>,
    /// Lottery history.
    #[serde(default)]
    pub picks: Vec<DailyPick>,
}

#[derive(Debug, Default)]
struct StoreState {
    participants: BTreeMap<ParticipantId, Participant>,
    duelists: BTreeMap<ParticipantId, DuelistStats>,
    pool: BTreeMap<ParticipantId, PoolEntry>,
    picks: BTreeMap<NaiveDate, DailyPick>,
    fail_writes: bool,
}

/// A [`Store`] held entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<StoreState>,
}

impl MemoryStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// A store preloaded from a snapshot.
    pub fn from_snapshot(snapshot: StoreSnapshot) -> Self {
        let state = StoreState {
            participants: snapshot.participants.into_iter().map(|p| (p.id, p)).collect(),
            duelists: snapshot.duelists.into_iter().map(|d| (d.participant, d)).collect(),
            pool: snapshot.pool.into_iter().map(|e| (e.participant, e)).collect(),
            picks: snapshot.picks.into_iter().map(|p| (p.date, p)).collect(),
            fail_writes: false,
        };
        Self {
            state: Mutex::new(state),
        }
    }

    /// Copy out the current contents.
    pub fn snapshot(&self) -> StoreSnapshot {
        let state = self.state.lock();
        StoreSnapshot {
            participants: state.participants.values().cloned().collect(),
            duelists: state.duelists.values().copied().collect(),
            pool: state.pool.values().copied().collect(),
            picks: state.picks.values().copied().collect(),
        }
    }

    /// Make every subsequent write fail.
    pub fn fail_writes(&self, fail: bool) {
        self.state.lock().fail_writes = fail;
    }

    fn write<T>(&self, f: impl FnOnce(&mut StoreState) -> T) -> PortResult<T> {
        let mut state = self.state.lock();
        if state.fail_writes {
            return Err(CollaboratorError::Storage("store is read-only".into()));
        }
        Ok(f(&mut state))
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn remember(&self, participant: &Participant) -> PortResult<()> {
        self.write(|s| {
            s.participants.insert(participant.id, participant.clone());
        })
    }

    async fn participant(&self, id: ParticipantId) -> PortResult<Option<Participant>> {
        Ok(self.state.lock().participants.get(&id).cloned())
    }

    async fn find_participant(&self, query: &str) -> PortResult<Option<Participant>> {
        let state = self.state.lock();
        Ok(state.participants.values().find(|p| p.matches(query)).cloned())
    }

    async fn duelist(&self, id: ParticipantId) -> PortResult<Option<DuelistStats>> {
        Ok(self.state.lock().duelists.get(&id).copied())
    }

    async fn save_duelist(&self, stats: &DuelistStats) -> PortResult<()> {
        self.write(|s| {
            s.duelists.insert(stats.participant, *stats);
        })
    }

    async fn pool(&self) -> PortResult<Vec<PoolEntry>> {
        Ok(self.state.lock().pool.values().copied().collect())
    }

    async fn add_to_pool(&self, entry: PoolEntry) -> PortResult<bool> {
        self.write(|s| {
            if s.pool.contains_key(&entry.participant) {
                false
            } else {
                s.pool.insert(entry.participant, entry);
                true
            }
        })
    }

    async fn remove_from_pool(&self, id: ParticipantId) -> PortResult<bool> {
        self.write(|s| s.pool.remove(&id).is_some())
    }

    async fn daily_pick(&self, date: NaiveDate) -> PortResult<Option<DailyPick>> {
        Ok(self.state.lock().picks.get(&date).copied())
    }

    async fn save_daily_pick(&self, pick: &DailyPick) -> PortResult<()> {
        self.write(|s| {
            s.picks.insert(pick.date, *pick);
        })
    }

    async fn picks_between(&self, from: NaiveDate, until: NaiveDate) -> PortResult<Vec<DailyPick>> {
        let state = self.state.lock();
        Ok(state.picks.range(from..until).map(|(_, p)| *p).collect())
    }
}

/// One observable action taken through a [`RecordingMessenger`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// A new message was posted.
    Sent {
        /// Handle assigned to the message.
        message: MessageHandle,
        /// Message text.
        text: String,
        /// Attached buttons.
        affordances: Vec<Affordance>,
    },
    /// A message was edited.
    Edited {
        /// The edited message.
        message: MessageHandle,
        /// New text.
        text: String,
        /// Buttons after the edit.
        affordances: Vec<Affordance>,
    },
    /// A message was deleted.
    Deleted {
        /// The deleted message.
        message: MessageHandle,
    },
    /// A button press was acknowledged.
    Acknowledged {
        /// Transport id of the press.
        press: String,
    },
}

#[derive(Debug, Default)]
struct MessengerState {
    next_id: i64,
    log: Vec<Delivery>,
    fail_edits: bool,
}

/// A [`Messenger`] that records every call.
#[derive(Debug, Default)]
pub struct RecordingMessenger {
    state: Mutex<MessengerState>,
}

impl RecordingMessenger {
    /// An empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything delivered so far, in order.
    pub fn deliveries(&self) -> Vec<Delivery> {
        self.state.lock().log.clone()
    }

    /// The latest text of `message`, following edits.
    pub fn text_of(&self, message: MessageHandle) -> Option<String> {
        self.state
            .lock()
            .log
            .iter()
            .rev()
            .find_map(|d| match d {
                Delivery::Sent { message: m, text, .. } | Delivery::Edited { message: m, text, .. }
                    if *m == message =>
                {
                    Some(text.clone())
                }
                _ => None,
            })
    }

    /// Texts of every sent (not edited) message, in order.
    pub fn sent_texts(&self) -> Vec<String> {
        self.state
            .lock()
            .log
            .iter()
            .filter_map(|d| match d {
                Delivery::Sent { text, .. } => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    /// Make every subsequent edit fail.
    pub fn fail_edits(&self, fail: bool) {
        self.state.lock().fail_edits = fail;
    }
}

#[async_trait]
impl Messenger for RecordingMessenger {
    async fn send(
        &self,
        chat: ChatId,
        text: &str,
        affordances: &[Affordance],
    ) -> PortResult<MessageHandle> {
        let mut state = self.state.lock();
        state.next_id += 1;
        let message = MessageHandle::new(chat, state.next_id);
        state.log.push(Delivery::Sent {
            message,
            text: text.to_string(),
            affordances: affordances.to_vec(),
        });
        Ok(message)
    }

    async fn edit(
        &self,
        message: MessageHandle,
        text: &str,
        affordances: &[Affordance],
    ) -> PortResult<MessageHandle> {
        let mut state = self.state.lock();
        if state.fail_edits {
            return Err(CollaboratorError::Messaging("message can't be edited".into()));
        }
        state.log.push(Delivery::Edited {
            message,
            text: text.to_string(),
            affordances: affordances.to_vec(),
        });
        Ok(message)
    }

    async fn delete(&self, message: MessageHandle) -> PortResult<()> {
        self.state.lock().log.push(Delivery::Deleted { message });
        Ok(())
    }

    async fn acknowledge(&self, press: &ButtonPress) -> PortResult<()> {
        self.state.lock().log.push(Delivery::Acknowledged {
            press: press.id.clone(),
        });
        Ok(())
    }
}

/// A restriction applied through a [`StaticMembership`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Restriction {
    /// Chat the restriction applies to.
    pub chat: ChatId,
    /// Restricted participant.
    pub participant: ParticipantId,
    /// Expiry.
    pub until: DateTime<FixedOffset>,
    /// Whether messages are still allowed.
    pub can_send_messages: bool,
}

#[derive(Debug, Default)]
struct MembershipState {
    roles: HashMap<(ChatId, ParticipantId), ChatRole>,
    unreachable: HashSet<ParticipantId>,
    restrictions: Vec<Restriction>,
}

/// A [`Membership`] over a fixed role table. Unknown participants are
/// reported as having left.
#[derive(Debug, Default)]
pub struct StaticMembership {
    state: Mutex<MembershipState>,
}

impl StaticMembership {
    /// An empty role table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a participant's role in a chat.
    pub fn set_role(&self, chat: ChatId, participant: ParticipantId, role: ChatRole) {
        self.state.lock().roles.insert((chat, participant), role);
    }

    /// Make lookups for `participant` fail.
    pub fn make_unreachable(&self, participant: ParticipantId) {
        self.state.lock().unreachable.insert(participant);
    }

    /// Every restriction applied so far.
    pub fn restrictions(&self) -> Vec<Restriction> {
        self.state.lock().restrictions.clone()
    }
}

#[async_trait]
impl Membership for StaticMembership {
    async fn role_of(&self, chat: ChatId, participant: ParticipantId) -> PortResult<ChatRole> {
        let state = self.state.lock();
        if state.unreachable.contains(&participant) {
            return Err(CollaboratorError::Membership(format!(
                "user {participant} not found"
            )));
        }
        Ok(state
            .roles
            .get(&(chat, participant))
            .copied()
            .unwrap_or(ChatRole::Left))
    }

    async fn restrict(
        &self,
        chat: ChatId,
        participant: ParticipantId,
        until: DateTime<FixedOffset>,
        can_send_messages: bool,
    ) -> PortResult<()> {
        let mut state = self.state.lock();
        if state.unreachable.contains(&participant) {
            return Err(CollaboratorError::Membership(format!(
                "user {participant} not found"
            )));
        }
        state.restrictions.push(Restriction {
            chat,
            participant,
            until,
            can_send_messages,
        });
        Ok(())
    }
}
