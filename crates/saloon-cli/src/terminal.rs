//! Collaborators that play the chat out on the terminal.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, FixedOffset};
use colored::Colorize;
use parking_lot::Mutex;

use saloon_core::memory::StaticMembership;
use saloon_core::{
    Affordance, ButtonPress, ChatId, ChatRole, Clock, Membership, MessageHandle, Messenger,
    ParticipantId, PortResult, SystemClock,
};

/// Drop markup tags, keeping their text.
pub fn plain(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_tag = false;
    for c in text.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}

/// Prints every message to stdout.
#[derive(Default)]
pub struct TerminalMessenger {
    next_id: Mutex<i64>,
}

impl TerminalMessenger {
    fn print(&self, message: MessageHandle, marker: &str, text: &str, affordances: &[Affordance]) {
        // Positive chat ids are private chats with one participant.
        let private = if message.chat.0 > 0 { " (private)" } else { "" };
        let label = format!("#{}{private}{marker}", message.id.0).dimmed();
        println!("{label} {}", plain(text));
        if !affordances.is_empty() {
            let buttons: Vec<String> = affordances
                .iter()
                .map(|a| format!("[{}]", a.label))
                .collect();
            println!("{}", buttons.join(" ").cyan());
        }
    }
}

#[async_trait]
impl Messenger for TerminalMessenger {
    async fn send(
        &self,
        chat: ChatId,
        text: &str,
        affordances: &[Affordance],
    ) -> PortResult<MessageHandle> {
        let id = {
            let mut next = self.next_id.lock();
            *next += 1;
            *next
        };
        let message = MessageHandle::new(chat, id);
        self.print(message, "", text, affordances);
        Ok(message)
    }

    async fn edit(
        &self,
        message: MessageHandle,
        text: &str,
        affordances: &[Affordance],
    ) -> PortResult<MessageHandle> {
        self.print(message, " (edited)", text, affordances);
        Ok(message)
    }

    async fn delete(&self, message: MessageHandle) -> PortResult<()> {
        println!("{}", format!("#{} (deleted)", message.id.0).dimmed());
        Ok(())
    }

    async fn acknowledge(&self, _press: &ButtonPress) -> PortResult<()> {
        Ok(())
    }
}

/// Role lookups from the roster; restrictions are announced on stdout.
#[derive(Default)]
pub struct TerminalMembership {
    roles: StaticMembership,
    names: HashMap<ParticipantId, String>,
}

impl TerminalMembership {
    pub fn add(&mut self, chat: ChatId, id: ParticipantId, name: String, role: ChatRole) {
        self.roles.set_role(chat, id, role);
        self.names.insert(id, name);
    }
}

#[async_trait]
impl Membership for TerminalMembership {
    async fn role_of(&self, chat: ChatId, participant: ParticipantId) -> PortResult<ChatRole> {
        self.roles.role_of(chat, participant).await
    }

    async fn restrict(
        &self,
        chat: ChatId,
        participant: ParticipantId,
        until: DateTime<FixedOffset>,
        can_send_messages: bool,
    ) -> PortResult<()> {
        self.roles
            .restrict(chat, participant, until, can_send_messages)
            .await?;
        let name = self
            .names
            .get(&participant)
            .cloned()
            .unwrap_or_else(|| participant.to_string());
        let state = if can_send_messages { "unmuted" } else { "muted" };
        println!(
            "{}",
            format!("{name} is {state} until {}", until.format("%Y-%m-%d %H:%M:%S")).dimmed()
        );
        Ok(())
    }
}

/// Local time, shifted forward by `/advance`.
pub struct SkewedClock {
    base: SystemClock,
    skew: Mutex<Duration>,
}

impl Default for SkewedClock {
    fn default() -> Self {
        Self {
            base: SystemClock,
            skew: Mutex::new(Duration::zero()),
        }
    }
}

impl SkewedClock {
    pub fn advance(&self, by: Duration) {
        *self.skew.lock() += by;
    }
}

impl Clock for SkewedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        self.base.now() + *self.skew.lock()
    }
}
