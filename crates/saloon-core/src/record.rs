//! Persisted record types.
//!
//! The games read and write these through [`crate::Store`]. They carry no
//! behaviour beyond simple counters; all invariants about when they change
//! live in the game engine.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::participant::ParticipantId;

/// Duel scoreboard for one participant. Created lazily on the first
/// elimination event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuelistStats {
    /// Whose stats these are.
    pub participant: ParticipantId,
    /// Opponents eliminated.
    pub kills: u32,
    /// Times eliminated.
    pub deaths: u32,
}

impl DuelistStats {
    /// A fresh scoreboard with zero kills and deaths.
    pub fn new(participant: ParticipantId) -> Self {
        Self {
            participant,
            kills: 0,
            deaths: 0,
        }
    }

    /// Count one more death and return the new total.
    pub fn record_death(&mut self) -> u32 {
        self.deaths = self.deaths.saturating_add(1);
        self.deaths
    }

    /// Count one more kill and return the new total.
    pub fn record_kill(&mut self) -> u32 {
        self.kills = self.kills.saturating_add(1);
        self.kills
    }

    /// How long the participant is muted after their latest death.
    pub fn restriction(&self, unit: Duration) -> Duration {
        restriction_for(self.deaths, unit)
    }
}

/// Restriction length for a participant with `deaths` cumulative deaths:
/// `unit × deaths`, strictly increasing in `deaths` for a positive unit.
pub fn restriction_for(deaths: u32, unit: Duration) -> Duration {
    unit * i32::try_from(deaths).unwrap_or(i32::MAX)
}

/// Opt-in registration for the daily lottery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolEntry {
    /// The registered participant.
    pub participant: ParticipantId,
    /// Calendar date of registration.
    pub joined_on: NaiveDate,
}

/// The winner of the lottery for one calendar date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyPick {
    /// The calendar date the pick belongs to.
    pub date: NaiveDate,
    /// Who won.
    pub winner: ParticipantId,
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn counters_start_at_zero() {
        let s = DuelistStats::new(ParticipantId(1));
        assert_eq!((s.kills, s.deaths), (0, 0));
    }

    #[test]
    fn restriction_scales_with_deaths() {
        let mut s = DuelistStats::new(ParticipantId(1));
        let unit = Duration::seconds(600);
        assert_eq!(s.record_death(), 1);
        assert_eq!(s.restriction(unit), Duration::seconds(600));
        s.record_death();
        s.record_death();
        assert_eq!(s.restriction(unit), Duration::seconds(1800));
    }

    #[test]
    fn kill_counter() {
        let mut s = DuelistStats::new(ParticipantId(1));
        s.record_kill();
        assert_eq!(s.record_kill(), 2);
        assert_eq!(s.deaths, 0);
    }

    #[test]
    fn daily_pick_serde() {
        let pick = DailyPick {
            date: NaiveDate::from_ymd_opt(2024, 2, 29).unwrap(),
            winner: ParticipantId(9),
        };
        let json = serde_json::to_string(&pick).unwrap();
        let back: DailyPick = serde_json::from_str(&json).unwrap();
        assert_eq!(back, pick);
    }

    proptest! {
        #[test]
        fn restriction_strictly_increasing(deaths in 0u32..10_000, unit in 1i64..100_000) {
            let unit = Duration::seconds(unit);
            prop_assert!(restriction_for(deaths + 1, unit) > restriction_for(deaths, unit));
        }
    }
}
