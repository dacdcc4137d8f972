//! Configuration for the game host.

use std::time::Duration as StdDuration;

use chrono::Duration;
use serde::Deserialize;

use saloon_core::ChatId;

use crate::error::{GameError, GameResult};

/// Upper bound for every timeout and for the restriction unit: one year.
pub const MAX_SECS: i64 = 366 * 24 * 60 * 60;

fn seconds(secs: i64) -> Duration {
    Duration::try_seconds(secs.clamp(0, MAX_SECS)).unwrap_or_else(Duration::zero)
}

/// Timeouts, pacing, and policy for the games.
///
/// All durations are whole seconds except the narration delays, which are
/// milliseconds so a terminal session can run at full speed.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// RNG seed for reproducible games. `None` seeds from the OS.
    pub seed: Option<u64>,
    /// A challenge nobody answers is abandoned after this many seconds.
    pub pending_timeout_secs: i64,
    /// A duel still running after this many seconds is considered stuck.
    pub in_progress_timeout_secs: i64,
    /// How long the narrator stays down after taking a bullet.
    pub narrator_down_secs: i64,
    /// Pause after each duel narration step.
    pub step_delay_ms: u64,
    /// Pause before the deflected-shot reveal.
    pub long_step_delay_ms: u64,
    /// Pause between lottery announcement messages.
    pub lottery_step_delay_ms: u64,
    /// Restriction length per cumulative death.
    pub restriction_unit_secs: i64,
    /// Usernames whose elimination is always deflected back to the shooter.
    pub protected_usernames: Vec<String>,
    /// Chat that receives collaborator failure reports.
    pub operator_chat: Option<ChatId>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            seed: None,
            pending_timeout_secs: 60,
            in_progress_timeout_secs: 120,
            narrator_down_secs: 3600,
            step_delay_ms: 2000,
            long_step_delay_ms: 3000,
            lottery_step_delay_ms: 2000,
            restriction_unit_secs: 600,
            protected_usernames: Vec::new(),
            operator_chat: None,
        }
    }
}

impl GameConfig {
    /// Set the RNG seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Remove every narration pause.
    pub fn instant(mut self) -> Self {
        self.step_delay_ms = 0;
        self.long_step_delay_ms = 0;
        self.lottery_step_delay_ms = 0;
        self
    }

    /// Add a username to the deflection allow-list.
    pub fn with_protected_username(mut self, username: impl Into<String>) -> Self {
        self.protected_usernames.push(username.into());
        self
    }

    /// Send failure reports to `chat`.
    pub fn with_operator_chat(mut self, chat: ChatId) -> Self {
        self.operator_chat = Some(chat);
        self
    }

    /// Check that every timeout and the restriction unit lie in
    /// `1..=MAX_SECS`.
    pub fn validate(&self) -> GameResult<()> {
        let fields = [
            ("pending_timeout_secs", self.pending_timeout_secs),
            ("in_progress_timeout_secs", self.in_progress_timeout_secs),
            ("narrator_down_secs", self.narrator_down_secs),
            ("restriction_unit_secs", self.restriction_unit_secs),
        ];
        for (name, secs) in fields {
            if !(1..=MAX_SECS).contains(&secs) {
                return Err(GameError::Config(format!(
                    "{name} must be between 1 and {MAX_SECS}, got {secs}"
                )));
            }
        }
        Ok(())
    }

    /// Pending challenge timeout.
    pub fn pending_timeout(&self) -> Duration {
        seconds(self.pending_timeout_secs)
    }

    /// Stuck duel timeout.
    pub fn in_progress_timeout(&self) -> Duration {
        seconds(self.in_progress_timeout_secs)
    }

    /// Narrator downtime.
    pub fn narrator_down(&self) -> Duration {
        seconds(self.narrator_down_secs)
    }

    /// Restriction length per death.
    pub fn restriction_unit(&self) -> Duration {
        seconds(self.restriction_unit_secs)
    }

    /// Pause after a duel narration step.
    pub fn step_delay(&self) -> StdDuration {
        StdDuration::from_millis(self.step_delay_ms)
    }

    /// Pause before the deflected-shot reveal.
    pub fn long_step_delay(&self) -> StdDuration {
        StdDuration::from_millis(self.long_step_delay_ms)
    }

    /// Pause between lottery messages.
    pub fn lottery_step_delay(&self) -> StdDuration {
        StdDuration::from_millis(self.lottery_step_delay_ms)
    }

    /// Whether `username` is on the deflection allow-list.
    pub fn is_protected_username(&self, username: Option<&str>) -> bool {
        username.is_some_and(|u| {
            self.protected_usernames
                .iter()
                .any(|p| p.trim_start_matches('@').eq_ignore_ascii_case(u))
        })
    }
}
