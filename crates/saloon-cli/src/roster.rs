//! The chat described by a roster file.

use std::path::Path;

use serde::Deserialize;

use saloon_core::{ChatId, ChatRole, Participant};
use saloon_games::GameConfig;

fn default_chat() -> ChatId {
    ChatId(-1)
}

fn default_role() -> ChatRole {
    ChatRole::Member
}

/// One chat member and their role.
#[derive(Debug, Clone, Deserialize)]
pub struct Member {
    #[serde(flatten)]
    pub participant: Participant,
    #[serde(default = "default_role")]
    pub role: ChatRole,
}

/// A chat, its members, and the game settings to host it with.
#[derive(Debug, Clone, Deserialize)]
pub struct Roster {
    #[serde(default = "default_chat")]
    pub chat_id: ChatId,
    pub members: Vec<Member>,
    #[serde(default)]
    pub game: GameConfig,
}

impl Roster {
    pub fn load(path: &Path) -> Result<Self, String> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| format!("cannot read {}: {e}", path.display()))?;
        let roster: Self = serde_json::from_str(&text)
            .map_err(|e| format!("invalid roster {}: {e}", path.display()))?;
        roster
            .game
            .validate()
            .map_err(|e| format!("invalid roster {}: {e}", path.display()))?;
        if roster.members.is_empty() {
            return Err(format!("roster {} has no members", path.display()));
        }
        Ok(roster)
    }

    /// The member whose username is `name`, with or without a leading `@`.
    pub fn by_username(&self, name: &str) -> Option<&Member> {
        let name = name.strip_prefix('@').unwrap_or(name);
        self.members.iter().find(|m| {
            m.participant
                .username
                .as_deref()
                .is_some_and(|u| u.eq_ignore_ascii_case(name))
        })
    }
}
