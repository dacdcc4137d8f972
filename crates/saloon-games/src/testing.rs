//! Shared fixture for engine tests.

use std::sync::Arc;

use chrono::{DateTime, FixedOffset};

use saloon_core::memory::{MemoryStore, RecordingMessenger, StaticMembership};
use saloon_core::{
    ButtonPress, ChatId, ChatRole, ManualClock, MessageHandle, Participant, ScriptedRandom, Store,
};

use crate::config::GameConfig;
use crate::services::{Collaborators, Services};

pub(crate) const CHAT: ChatId = ChatId(-100);

pub(crate) fn start() -> DateTime<FixedOffset> {
    DateTime::parse_from_rfc3339("2024-05-01T12:00:00+03:00").unwrap()
}

pub(crate) struct Fixture {
    pub messenger: Arc<RecordingMessenger>,
    pub membership: Arc<StaticMembership>,
    pub store: Arc<MemoryStore>,
    pub clock: Arc<ManualClock>,
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            messenger: Arc::new(RecordingMessenger::new()),
            membership: Arc::new(StaticMembership::new()),
            store: Arc::new(MemoryStore::new()),
            clock: Arc::new(ManualClock::new(start())),
        }
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            messenger: self.messenger.clone(),
            membership: self.membership.clone(),
            store: self.store.clone(),
            clock: self.clock.clone(),
        }
    }

    pub fn services(&self, config: GameConfig, script: impl IntoIterator<Item = u32>) -> Services {
        self.paced_services(config.instant(), script)
    }

    /// Like [`Fixture::services`], keeping the configured narration delays.
    pub fn paced_services(
        &self,
        config: GameConfig,
        script: impl IntoIterator<Item = u32>,
    ) -> Services {
        Services::new(
            config,
            self.collaborators(),
            Box::new(ScriptedRandom::new(script)),
        )
    }

    /// A chat member with a username matching their lowercased name.
    pub async fn member(&self, id: i64, name: &str, role: ChatRole) -> Participant {
        let p = Participant::new(id, name).with_username(name.to_lowercase());
        self.membership.set_role(CHAT, p.id, role);
        self.store.remember(&p).await.unwrap();
        p
    }
}

pub(crate) fn press(presser: &Participant, message: MessageHandle) -> ButtonPress {
    ButtonPress {
        id: format!("press-{}", presser.id),
        presser: presser.clone(),
        message,
    }
}
