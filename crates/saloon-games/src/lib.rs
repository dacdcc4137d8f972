//! Game engine for Saloon: a revolver duel and a daily lottery for group chats.
//!
//! Games never block each other and never queue. Each game kind holds a
//! named flag in an [`ExclusionGate`] while it mutates state; a second
//! request that finds the flag held is answered "busy". Long narrations run
//! in background tasks that edit a single anchor message, and watchdogs
//! recover sessions that outlive their timeouts the next time somebody
//! tries to start a game.

pub mod config;
pub mod duel;
pub mod error;
pub mod gate;
pub mod host;
pub mod lottery;
pub mod narration;
mod services;
#[cfg(test)]
mod testing;

pub use config::GameConfig;
pub use duel::{
    ChallengeIssued, ChallengeRequest, DuelHandle, DuelReport, DuelState, PressOutcome, Target,
    Verdict,
};
pub use error::{GameError, GameKind, GameResult, ValidationError};
pub use gate::{ExclusionGate, GateFlag, GateGuard, Ticket};
pub use host::GameHost;
pub use lottery::{Announcement, Disqualification, LotteryOutcome};
pub use narration::{Narration, NarrationSequencer};
pub use services::Collaborators;
