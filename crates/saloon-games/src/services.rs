//! Collaborators and shared state handed to every game.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::error;

use saloon_core::{Clock, Membership, Messenger, RandomSource, Store};

use crate::config::GameConfig;
use crate::error::GameError;
use crate::gate::ExclusionGate;
use crate::narration::NarrationSequencer;

/// The external collaborators a [`crate::GameHost`] is wired to.
#[derive(Clone)]
pub struct Collaborators {
    /// Message transport.
    pub messenger: Arc<dyn Messenger>,
    /// Chat membership lookups and restrictions.
    pub membership: Arc<dyn Membership>,
    /// Persisted records.
    pub store: Arc<dyn Store>,
    /// Wall clock.
    pub clock: Arc<dyn Clock>,
}

/// Counts every draw taken from the wrapped source.
struct Tally {
    source: Box<dyn RandomSource>,
    draws: u64,
}

impl RandomSource for Tally {
    fn between(&mut self, low: u32, high: u32) -> u32 {
        self.draws += 1;
        self.source.between(low, high)
    }
}

/// Everything a game needs, cheap to clone into background tasks.
#[derive(Clone)]
pub(crate) struct Services {
    pub config: Arc<GameConfig>,
    pub gate: Arc<ExclusionGate>,
    pub clock: Arc<dyn Clock>,
    pub messenger: Arc<dyn Messenger>,
    pub membership: Arc<dyn Membership>,
    pub store: Arc<dyn Store>,
    pub sequencer: NarrationSequencer,
    random: Arc<Mutex<Tally>>,
}

impl Services {
    pub fn new(
        config: GameConfig,
        collaborators: Collaborators,
        random: Box<dyn RandomSource>,
    ) -> Self {
        let Collaborators {
            messenger,
            membership,
            store,
            clock,
        } = collaborators;
        Self {
            config: Arc::new(config),
            gate: Arc::new(ExclusionGate::new(Arc::clone(&clock))),
            sequencer: NarrationSequencer::new(Arc::clone(&messenger)),
            clock,
            messenger,
            membership,
            store,
            random: Arc::new(Mutex::new(Tally {
                source: random,
                draws: 0,
            })),
        }
    }

    /// Run `f` against the shared random source.
    pub fn draw<T>(&self, f: impl FnOnce(&mut dyn RandomSource) -> T) -> T {
        let mut random = self.random.lock();
        f(&mut *random)
    }

    /// Pick one line uniformly from a fixed list.
    pub fn pick<'a>(&self, lines: &[&'a str]) -> &'a str {
        let i = self.draw(|r| r.index(lines.len())).unwrap_or(0);
        lines.get(i).copied().unwrap_or_default()
    }

    /// Total random draws taken so far.
    pub fn draws(&self) -> u64 {
        self.random.lock().draws
    }

    /// Log a failure and forward it to the operator chat, if configured.
    pub async fn report(&self, context: &str, err: &GameError) {
        error!(context, error = %err, "game operation failed");
        let Some(chat) = self.config.operator_chat else {
            return;
        };
        let text = format!(
            "An exception was raised while handling an update\n<pre>{err}</pre>\n\nContext: <code>{context}</code>"
        );
        if let Err(e) = self.messenger.send(chat, &text, &[]).await {
            error!(context, error = %e, "operator report failed");
        }
    }
}
