//! Registration in the lottery pool.
//!
//! Pool writes take the lottery flag so they never interleave with a draw.

use tracing::info;

use saloon_core::{ChatId, Participant, PoolEntry};

use super::Lottery;
use crate::error::{GameError, GameKind, GameResult, ValidationError};
use crate::gate::{GateFlag, GateGuard};

/// Soft length limit for one listing message.
const CHUNK_LIMIT: usize = 3900;

impl Lottery {
    fn hold(&self) -> GameResult<GateGuard> {
        self.services
            .gate
            .guard(GateFlag::Lottery)
            .ok_or(GameError::Busy(GameKind::DailyLottery))
    }

    pub async fn register(&self, participant: &Participant) -> GameResult<String> {
        let s = &self.services;
        let _flag = self.hold()?;
        s.store.remember(participant).await?;
        let entry = PoolEntry {
            participant: participant.id,
            joined_on: s.clock.today(),
        };
        if !s.store.add_to_pool(entry).await? {
            return Ok("Hey, you're already in the game!".to_string());
        }
        info!(participant = %participant.id, "registered for the lottery");
        Ok("OK! You're now playing <b>Winner of the Day</b>!".to_string())
    }

    pub async fn unregister(&self, participant: &Participant) -> GameResult<String> {
        let _flag = self.hold()?;
        if !self.services.store.remove_from_pool(participant.id).await? {
            return Ok("You're not in the game.".to_string());
        }
        info!(participant = %participant.id, "left the lottery");
        Ok("You've left <b>Winner of the Day</b>.".to_string())
    }

    /// Administrative removal. `query` is `@username` or a numeric id.
    pub async fn remove(
        &self,
        chat: ChatId,
        actor: &Participant,
        query: Option<&str>,
    ) -> GameResult<String> {
        let s = &self.services;
        if !s.membership.role_of(chat, actor.id).await?.is_protected() {
            return Err(ValidationError::NotAuthorized.into());
        }
        let query = query.ok_or(ValidationError::MissingUser)?;
        let target = s
            .store
            .find_participant(query)
            .await?
            .ok_or_else(|| ValidationError::UnknownParticipant(query.to_string()))?;

        let _flag = self.hold()?;
        if !s.store.remove_from_pool(target.id).await? {
            return Ok(format!("{} isn't in the game.", target.mention()));
        }
        info!(actor = %actor.id, target = %target.id, "removed from the lottery");
        Ok(format!(
            "{} was removed from <b>Winner of the Day</b>!",
            target.mention()
        ))
    }

    /// Numbered list of registered participants, split into messages.
    /// Administrators only; meant for the requester's private chat.
    pub async fn listing(&self, chat: ChatId, actor: &Participant) -> GameResult<Vec<String>> {
        let s = &self.services;
        if !s.membership.role_of(chat, actor.id).await?.is_protected() {
            return Err(ValidationError::NotAuthorized.into());
        }
        let pool = s.store.pool().await?;
        if pool.is_empty() {
            return Err(ValidationError::EmptyPool.into());
        }
        let mut chunks = Vec::new();
        let mut current = String::new();
        for (i, entry) in pool.iter().enumerate() {
            let name = match s.store.participant(entry.participant).await? {
                Some(p) => p.display_name(),
                None => entry.participant.to_string(),
            };
            current.push_str(&format!("{}. {} ({})\n", i + 1, name, entry.participant));
            if current.len() > CHUNK_LIMIT {
                chunks.push(std::mem::take(&mut current));
            }
        }
        if !current.is_empty() {
            chunks.push(current);
        }
        Ok(chunks)
    }
}
