//! Error types for the game engine.
//!
//! The `Display` text of [`ValidationError`], [`GameError::Busy`], and
//! [`GameError::NarratorDown`] is what the chat sees.

use std::fmt;

use thiserror::Error;

use saloon_core::CollaboratorError;

/// Result type for game operations.
pub type GameResult<T> = Result<T, GameError>;

/// Which game an error or flag belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameKind {
    /// Two-player revolver duel.
    Duel,
    /// Once-per-day pick from the registered pool.
    DailyLottery,
}

impl fmt::Display for GameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Duel => write!(f, "duel"),
            Self::DailyLottery => write!(f, "lottery"),
        }
    }
}

/// A request that was rejected before any state changed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Challenger named themselves.
    #[error("How do you picture that? No, you can't challenge yourself to a duel.")]
    SelfChallenge,

    /// Target is an automated account.
    #[error("You can't challenge a bot to a duel.")]
    NonPlayer,

    /// Target could not be resolved.
    #[error("Couldn't find that user: {0}")]
    UnknownParticipant(String),

    /// Target is not (or no longer) in the chat.
    #[error("You can't challenge a dead man to a duel.")]
    NotInChat,

    /// The challenge command had no target.
    #[error("Usage: /duel {{ID or @username}}, or reply /duel to someone's message.")]
    MissingTarget,

    /// The lottery has nobody to pick from.
    #[error("Nobody is registered for the lottery yet. Join with /register.")]
    EmptyPool,

    /// Only chat administrators may do this.
    #[error("Only chat administrators can do that.")]
    NotAuthorized,

    /// An administrative command named nobody.
    #[error("Name a user by ID or @username.")]
    MissingUser,

    /// A statistics year that is not a calendar year.
    #[error("Can't read that year: {0}")]
    InvalidYear(i32),
}

/// Errors surfaced by game operations.
#[derive(Debug, Error)]
pub enum GameError {
    /// Rejected input; nothing changed.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Another session of this game holds the gate.
    #[error("The {0} is busy. Try again later.")]
    Busy(GameKind),

    /// The narrator took a bullet and refuses new duels for a while.
    #[error("I can't host a duel right now, I'm a little bit dead. Come back later.")]
    NarratorDown,

    /// A messaging, membership, or storage call failed.
    #[error(transparent)]
    Collaborator(#[from] CollaboratorError),

    /// A configuration value the timers cannot represent.
    #[error("invalid game config: {0}")]
    Config(String),

    /// A background narration task ended without a result.
    #[error("narration task interrupted: {0}")]
    Interrupted(String),
}

impl GameError {
    /// Whether the error text is meant for the chat rather than an operator.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::Busy(_) | Self::NarratorDown
        )
    }
}
