//! Once-per-day pick from the registered pool.
//!
//! The pick for a date is drawn at most once. Asking again on the same
//! date reads the stored pick back without touching the random source.
//! A candidate who no longer belongs to the chat is struck from the pool
//! and no pick is stored, so the next request draws again from the
//! smaller pool.

mod pool;
mod stats;
mod texts;

use chrono::NaiveDate;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use saloon_core::{ChatId, ChatRole, DailyPick, MessageHandle, Participant, ParticipantId};

use crate::error::{GameError, GameKind, GameResult, ValidationError};
use crate::gate::GateFlag;
use crate::services::Services;

/// Why a drawn candidate was struck from the pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disqualification {
    /// The candidate left the chat.
    Left,
    /// The candidate was banned from the chat.
    Kicked,
    /// The membership lookup failed.
    Unreachable(String),
}

/// The winning announcement, posted in the background.
#[derive(Debug)]
pub struct Announcement {
    task: JoinHandle<GameResult<Vec<MessageHandle>>>,
}

impl Announcement {
    /// Wait for every announcement message to be posted.
    pub async fn finished(self) -> GameResult<Vec<MessageHandle>> {
        self.task
            .await
            .map_err(|e| GameError::Interrupted(e.to_string()))?
    }
}

/// Result of a draw request.
#[derive(Debug)]
pub enum LotteryOutcome {
    /// Today's pick already existed; nothing was drawn.
    AlreadyDrawn {
        /// Today's winner.
        winner: Participant,
        /// Calendar date of the pick.
        date: NaiveDate,
    },
    /// A new pick was stored and is being announced.
    Drawn {
        /// Today's winner.
        winner: Participant,
        /// Calendar date of the pick.
        date: NaiveDate,
        /// The announcement in progress.
        announcement: Announcement,
    },
    /// The drawn candidate was removed from the pool; nothing was stored.
    Disqualified {
        /// Who was drawn.
        candidate: Participant,
        /// Why they were struck.
        reason: Disqualification,
    },
}

impl LotteryOutcome {
    /// The participant the request settled on, if any.
    pub fn winner(&self) -> Option<&Participant> {
        match self {
            Self::AlreadyDrawn { winner, .. } | Self::Drawn { winner, .. } => Some(winner),
            Self::Disqualified { .. } => None,
        }
    }
}

/// The lottery rules as shown to players.
pub fn rules() -> &'static str {
    texts::RULES
}

#[derive(Clone)]
pub(crate) struct Lottery {
    services: Services,
}

impl Lottery {
    pub fn new(services: Services) -> Self {
        Self { services }
    }

    pub async fn draw(&self, chat: ChatId) -> GameResult<LotteryOutcome> {
        let s = &self.services;
        let today = s.clock.today();
        if let Some(pick) = s.store.daily_pick(today).await? {
            return self.already_drawn(chat, pick).await;
        }

        let Some(_flag) = s.gate.guard(GateFlag::Lottery) else {
            return Err(GameError::Busy(GameKind::DailyLottery));
        };
        if let Some(pick) = s.store.daily_pick(today).await? {
            return self.already_drawn(chat, pick).await;
        }

        let pool = s.store.pool().await?;
        let entry = s
            .draw(|rng| rng.index(pool.len()))
            .and_then(|i| pool.get(i))
            .ok_or(ValidationError::EmptyPool)?;
        let candidate = self.participant(entry.participant).await?;

        let reason = match s.membership.role_of(chat, candidate.id).await {
            Ok(role) => match role {
                ChatRole::Left => Some(Disqualification::Left),
                ChatRole::Kicked => Some(Disqualification::Kicked),
                ChatRole::Member | ChatRole::Administrator | ChatRole::Creator => None,
            },
            Err(e) => Some(Disqualification::Unreachable(e.to_string())),
        };
        if let Some(reason) = reason {
            return self.disqualify(chat, candidate, reason).await;
        }

        let pick = DailyPick {
            date: today,
            winner: candidate.id,
        };
        s.store.save_daily_pick(&pick).await?;
        info!(winner = %candidate.id, date = %today, pool = pool.len(), "lottery drawn");

        let mut lines: Vec<String> = texts::STAGES
            .iter()
            .map(|stage| s.pick(stage).to_string())
            .collect();
        if let Some(last) = lines.last_mut() {
            last.push_str(&candidate.mention());
        }
        let posting = s
            .sequencer
            .announce(chat, lines, s.config.lottery_step_delay());
        let services = s.clone();
        let task = tokio::spawn(async move {
            let posted = match posting.await {
                Ok(posted) => posted.map_err(GameError::from),
                Err(e) => Err(GameError::Interrupted(e.to_string())),
            };
            if let Err(e) = &posted {
                services.report("lottery announcement", e).await;
            }
            posted
        });

        Ok(LotteryOutcome::Drawn {
            winner: candidate,
            date: today,
            announcement: Announcement { task },
        })
    }

    async fn already_drawn(&self, chat: ChatId, pick: DailyPick) -> GameResult<LotteryOutcome> {
        let winner = self.participant(pick.winner).await?;
        self.services
            .messenger
            .send(chat, &texts::already_drawn(&winner.display_name()), &[])
            .await?;
        Ok(LotteryOutcome::AlreadyDrawn {
            winner,
            date: pick.date,
        })
    }

    async fn disqualify(
        &self,
        chat: ChatId,
        candidate: Participant,
        reason: Disqualification,
    ) -> GameResult<LotteryOutcome> {
        let s = &self.services;
        s.store.remove_from_pool(candidate.id).await?;
        warn!(candidate = %candidate.id, ?reason, "lottery candidate disqualified");
        let mention = candidate.mention();
        let text = match &reason {
            Disqualification::Left => texts::left(&mention),
            Disqualification::Kicked => texts::kicked(&mention),
            Disqualification::Unreachable(e) => texts::unreachable(&mention, e),
        };
        s.messenger.send(chat, &text, &[]).await?;
        Ok(LotteryOutcome::Disqualified { candidate, reason })
    }

    /// The directory entry for `id`, or a bare record named after the id.
    async fn participant(&self, id: ParticipantId) -> GameResult<Participant> {
        Ok(self
            .services
            .store
            .participant(id)
            .await?
            .unwrap_or_else(|| Participant::new(id.0, id.to_string())))
    }
}
