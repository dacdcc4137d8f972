//! Scoreboard writes shared by duels and self-elimination.

use chrono::{DateTime, FixedOffset};
use tracing::info;

use saloon_core::{ChatId, DuelistStats, ParticipantId};

use crate::error::GameResult;
use crate::services::Services;

/// A death written to the scoreboard and the restriction that followed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Casualty {
    pub until: DateTime<FixedOffset>,
    pub minutes: i64,
}

async fn load(services: &Services, id: ParticipantId) -> GameResult<DuelistStats> {
    Ok(services
        .store
        .duelist(id)
        .await?
        .unwrap_or_else(|| DuelistStats::new(id)))
}

/// Add a death and mute the participant for `unit × deaths`.
pub(crate) async fn record_death(
    services: &Services,
    chat: ChatId,
    id: ParticipantId,
) -> GameResult<Casualty> {
    let mut stats = load(services, id).await?;
    let deaths = stats.record_death();
    services.store.save_duelist(&stats).await?;

    let length = stats.restriction(services.config.restriction_unit());
    let until = services.clock.now() + length;
    services.membership.restrict(chat, id, until, false).await?;
    info!(participant = %id, deaths, until = %until, "participant restricted");

    Ok(Casualty {
        until,
        minutes: length.num_minutes(),
    })
}

/// Add a kill.
pub(crate) async fn record_kill(services: &Services, id: ParticipantId) -> GameResult<u32> {
    let mut stats = load(services, id).await?;
    let kills = stats.record_kill();
    services.store.save_duelist(&stats).await?;
    Ok(kills)
}
