//! Duel session state.
//!
//! One [`DuelPhase`] value describes the whole duel slot. Transitions go
//! through [`DuelPhase::apply`], which accepts exactly the moves listed in
//! its table and leaves the phase untouched otherwise.

use chrono::{DateTime, FixedOffset};

use saloon_core::{ChatId, MessageHandle, Participant};

use crate::gate::Ticket;

/// Which side of the duel a participant is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Seat {
    /// Whoever issued the challenge.
    Challenger,
    /// Whoever was challenged.
    Challenged,
}

impl Seat {
    /// The opposite seat.
    pub fn other(self) -> Self {
        match self {
            Self::Challenger => Self::Challenged,
            Self::Challenged => Self::Challenger,
        }
    }
}

/// One duel from challenge to resolution.
#[derive(Debug, Clone)]
pub struct DuelSession {
    /// Monotonic session number, unique per host.
    pub generation: u64,
    /// Chat the duel takes place in.
    pub chat: ChatId,
    /// Who issued the challenge.
    pub challenger: Participant,
    /// Who was challenged.
    pub challenged: Participant,
    /// The message the duel narrates through.
    pub anchor: MessageHandle,
    /// When the challenge was issued; every timeout counts from here.
    pub created_at: DateTime<FixedOffset>,
    /// Hold on the pending flag taken when the challenge was issued.
    pub pending_ticket: Option<Ticket>,
}

impl DuelSession {
    /// The participant in `seat`.
    pub fn seat(&self, seat: Seat) -> &Participant {
        match seat {
            Seat::Challenger => &self.challenger,
            Seat::Challenged => &self.challenged,
        }
    }
}

/// Externally visible duel state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuelState {
    /// No duel; a challenge may be issued.
    Idle,
    /// A challenge waits for an answer.
    Pending,
    /// A duel is being simulated and narrated.
    InProgress,
    /// The narrator is down and refuses challenges.
    Disabled,
}

/// Something that moves the duel slot.
#[derive(Debug)]
pub enum DuelEvent {
    /// A new challenge was issued.
    Challenge(Box<DuelSession>),
    /// The challenged participant accepted.
    Accept,
    /// The challenged participant declined.
    Decline,
    /// Nobody answered in time.
    Abandon,
    /// The simulation reached a verdict.
    Resolve,
    /// A watchdog gave up on a stuck session.
    ForceClear,
}

/// The duel slot.
#[derive(Debug, Clone, Default)]
pub enum DuelPhase {
    /// Nothing going on.
    #[default]
    Idle,
    /// Waiting for the challenged participant.
    Pending(DuelSession),
    /// Simulation and narration running.
    InProgress(DuelSession),
}

impl DuelPhase {
    /// The coarse state of the slot.
    pub fn state(&self) -> DuelState {
        match self {
            Self::Idle => DuelState::Idle,
            Self::Pending(_) => DuelState::Pending,
            Self::InProgress(_) => DuelState::InProgress,
        }
    }

    /// The live session, if any.
    pub fn session(&self) -> Option<&DuelSession> {
        match self {
            Self::Idle => None,
            Self::Pending(s) | Self::InProgress(s) => Some(s),
        }
    }

    /// Whether no session is live.
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    /// Apply `event`. Returns `false`, leaving the phase as it was, when
    /// the event is not valid in the current phase.
    pub fn apply(&mut self, event: DuelEvent) -> bool {
        let current = std::mem::take(self);
        let (next, applied) = match (current, event) {
            (Self::Idle, DuelEvent::Challenge(session)) => (Self::Pending(*session), true),
            (Self::Pending(s), DuelEvent::Accept) => (Self::InProgress(s), true),
            (Self::Pending(_), DuelEvent::Decline | DuelEvent::Abandon | DuelEvent::ForceClear) => {
                (Self::Idle, true)
            }
            (Self::InProgress(_), DuelEvent::Resolve | DuelEvent::ForceClear) => (Self::Idle, true),
            (unchanged, _) => (unchanged, false),
        };
        *self = next;
        applied
    }
}
