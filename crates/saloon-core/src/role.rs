//! Chat member roles.
//!
//! Every protection and eligibility check is an exhaustive match over
//! [`ChatRole`], never a string comparison.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The role a participant holds in a chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    /// Ordinary member.
    Member,
    /// Chat administrator.
    Administrator,
    /// Chat owner.
    Creator,
    /// Left the chat on their own.
    Left,
    /// Removed and banned from the chat.
    Kicked,
}

impl ChatRole {
    /// Owners and administrators are exempt from ordinary elimination.
    pub fn is_protected(self) -> bool {
        match self {
            Self::Administrator | Self::Creator => true,
            Self::Member | Self::Left | Self::Kicked => false,
        }
    }

    /// Whether the participant is still in the chat.
    pub fn is_present(self) -> bool {
        match self {
            Self::Member | Self::Administrator | Self::Creator => true,
            Self::Left | Self::Kicked => false,
        }
    }
}

impl fmt::Display for ChatRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Member => write!(f, "member"),
            Self::Administrator => write!(f, "administrator"),
            Self::Creator => write!(f, "creator"),
            Self::Left => write!(f, "left"),
            Self::Kicked => write!(f, "kicked"),
        }
    }
}
