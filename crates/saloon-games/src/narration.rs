//! Time-paced message narration.
//!
//! A [`Narration`] owns one anchor message and mutates it step by step,
//! sleeping between steps. It captures the anchor and the session
//! generation when it is created and never looks at "the current session"
//! again, so a narration that outlives its session only ever writes to its
//! own message.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::debug;

use saloon_core::{Affordance, ChatId, MessageHandle, Messenger, PortResult};

/// Starts narrations against a messenger.
#[derive(Clone)]
pub struct NarrationSequencer {
    messenger: Arc<dyn Messenger>,
}

impl NarrationSequencer {
    /// A sequencer posting through `messenger`.
    pub fn new(messenger: Arc<dyn Messenger>) -> Self {
        Self { messenger }
    }

    /// Post the anchor message and start narrating through it.
    pub async fn begin(
        &self,
        chat: ChatId,
        text: &str,
        affordances: &[Affordance],
        generation: u64,
    ) -> PortResult<Narration> {
        let anchor = self.messenger.send(chat, text, affordances).await?;
        debug!(chat = %chat, anchor = anchor.id.0, generation, "narration started");
        Ok(self.resume(anchor, generation))
    }

    /// Continue narrating through an existing anchor message.
    pub fn resume(&self, anchor: MessageHandle, generation: u64) -> Narration {
        Narration {
            messenger: Arc::clone(&self.messenger),
            anchor,
            generation,
            steps: 0,
        }
    }

    /// Post `lines` as separate messages in the background, pausing between
    /// them. Resolves to the posted handles, in order.
    pub fn announce(
        &self,
        chat: ChatId,
        lines: Vec<String>,
        pause: Duration,
    ) -> JoinHandle<PortResult<Vec<MessageHandle>>> {
        let messenger = Arc::clone(&self.messenger);
        tokio::spawn(async move {
            let mut posted = Vec::with_capacity(lines.len());
            for (i, line) in lines.iter().enumerate() {
                if i > 0 {
                    sleep(pause).await;
                }
                posted.push(messenger.send(chat, line, &[]).await?);
            }
            Ok(posted)
        })
    }
}

/// A sequence of edits against one anchor message.
pub struct Narration {
    messenger: Arc<dyn Messenger>,
    anchor: MessageHandle,
    generation: u64,
    steps: u32,
}

impl Narration {
    /// The message being narrated through.
    pub fn anchor(&self) -> MessageHandle {
        self.anchor
    }

    /// The session generation this narration was started for.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Replace the anchor text and drop its buttons.
    pub async fn update(&mut self, text: &str) -> PortResult<()> {
        self.update_with(text, &[]).await
    }

    /// Replace the anchor text and buttons.
    pub async fn update_with(&mut self, text: &str, affordances: &[Affordance]) -> PortResult<()> {
        self.messenger.edit(self.anchor, text, affordances).await?;
        self.steps += 1;
        debug!(
            anchor = self.anchor.id.0,
            generation = self.generation,
            step = self.steps,
            "narration step"
        );
        Ok(())
    }

    /// Edit, then wait `pause` before the next step may be issued.
    pub async fn step(&mut self, text: &str, pause: Duration) -> PortResult<()> {
        self.update(text).await?;
        sleep(pause).await;
        Ok(())
    }

    /// Wait without editing.
    pub async fn pause(&self, pause: Duration) {
        sleep(pause).await;
    }
}

async fn sleep(pause: Duration) {
    if !pause.is_zero() {
        tokio::time::sleep(pause).await;
    }
}
