//! Non-blocking named exclusion flags.
//!
//! Acquisition is a single check-and-set that never waits: a caller that
//! loses the race gets `None` and must answer "busy". Flags are advisory,
//! so every acquisition goes through a [`GateGuard`] that releases on drop
//! unless the holder explicitly keeps the flag.
//!
//! Each hold carries a ticket. Releasing by ticket only clears the flag if
//! the same hold is still in place, so a stale holder whose flag was
//! force-cleared cannot release a newer session's flag.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Duration, FixedOffset};
use parking_lot::Mutex;
use tracing::{debug, warn};

use saloon_core::Clock;

/// One logically exclusive resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GateFlag {
    /// Held while a challenge command is being evaluated.
    DuelOverall,
    /// Held while a challenge waits for an answer.
    DuelPending,
    /// Held while a duel is being simulated and narrated.
    DuelInProgress,
    /// Held while a lottery draw runs.
    Lottery,
    /// Held while the narrator recovers from a stray bullet.
    NarratorDown,
}

impl GateFlag {
    /// Every flag, in declaration order.
    pub const ALL: [GateFlag; 5] = [
        Self::DuelOverall,
        Self::DuelPending,
        Self::DuelInProgress,
        Self::Lottery,
        Self::NarratorDown,
    ];

    /// The flags that together describe a duel session.
    pub const DUEL: [GateFlag; 3] = [Self::DuelOverall, Self::DuelPending, Self::DuelInProgress];

    /// Stable key for logs.
    pub fn name(self) -> &'static str {
        match self {
            Self::DuelOverall => "duel-overall",
            Self::DuelPending => "duel-pending",
            Self::DuelInProgress => "duel-in-progress",
            Self::Lottery => "lottery",
            Self::NarratorDown => "bot-disabled",
        }
    }
}

impl fmt::Display for GateFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Proof of one particular hold on a flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    flag: GateFlag,
    id: u64,
}

#[derive(Debug, Clone, Copy)]
struct Hold {
    since: DateTime<FixedOffset>,
    ticket: u64,
}

/// Registry of named flags granting at-most-one holder per flag.
pub struct ExclusionGate {
    clock: Arc<dyn Clock>,
    holds: Mutex<HashMap<GateFlag, Hold>>,
    next_ticket: AtomicU64,
}

impl ExclusionGate {
    /// An empty gate timestamping holds with `clock`.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            holds: Mutex::new(HashMap::new()),
            next_ticket: AtomicU64::new(1),
        }
    }

    /// Take `flag` if nobody holds it.
    pub fn try_acquire(&self, flag: GateFlag) -> Option<Ticket> {
        let mut holds = self.holds.lock();
        if holds.contains_key(&flag) {
            debug!(flag = flag.name(), "gate busy");
            return None;
        }
        let id = self.next_ticket.fetch_add(1, Ordering::Relaxed);
        holds.insert(
            flag,
            Hold {
                since: self.clock.now(),
                ticket: id,
            },
        );
        debug!(flag = flag.name(), ticket = id, "gate acquired");
        Some(Ticket { flag, id })
    }

    /// Take `flag` and wrap the hold in a guard that releases on drop.
    pub fn guard(self: &Arc<Self>, flag: GateFlag) -> Option<GateGuard> {
        self.try_acquire(flag).map(|ticket| GateGuard {
            gate: Arc::clone(self),
            ticket: Some(ticket),
        })
    }

    /// Clear `flag` regardless of who holds it. Returns whether it was held.
    pub fn release(&self, flag: GateFlag) -> bool {
        let released = self.holds.lock().remove(&flag).is_some();
        if released {
            debug!(flag = flag.name(), "gate released");
        }
        released
    }

    /// Clear the flag only if `ticket` is still the current hold.
    pub fn release_ticket(&self, ticket: Ticket) -> bool {
        let mut holds = self.holds.lock();
        match holds.get(&ticket.flag) {
            Some(hold) if hold.ticket == ticket.id => {
                holds.remove(&ticket.flag);
                debug!(flag = ticket.flag.name(), ticket = ticket.id, "gate released");
                true
            }
            _ => false,
        }
    }

    /// Whether anybody holds `flag`.
    pub fn is_held(&self, flag: GateFlag) -> bool {
        self.holds.lock().contains_key(&flag)
    }

    /// When the current hold on `flag` began.
    pub fn held_since(&self, flag: GateFlag) -> Option<DateTime<FixedOffset>> {
        self.holds.lock().get(&flag).map(|h| h.since)
    }

    /// Force-clear `flag` if it has been held for longer than `threshold`.
    pub fn clear_if_stale(&self, flag: GateFlag, threshold: Duration) -> bool {
        let now = self.clock.now();
        let mut holds = self.holds.lock();
        match holds.get(&flag) {
            Some(hold) if now - hold.since > threshold => {
                let held_for = (now - hold.since).num_seconds();
                holds.remove(&flag);
                warn!(flag = flag.name(), held_for, "stale session recovered");
                true
            }
            _ => false,
        }
    }
}

impl fmt::Debug for ExclusionGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let holds = self.holds.lock();
        let mut held: Vec<_> = holds.keys().map(|k| k.name()).collect();
        held.sort_unstable();
        f.debug_struct("ExclusionGate").field("held", &held).finish()
    }
}

/// A hold on one flag that releases when dropped.
#[derive(Debug)]
pub struct GateGuard {
    gate: Arc<ExclusionGate>,
    ticket: Option<Ticket>,
}

impl GateGuard {
    /// Disarm the guard, leaving the flag held until someone else clears it.
    pub fn keep(mut self) -> Option<Ticket> {
        self.ticket.take()
    }
}

impl Drop for GateGuard {
    fn drop(&mut self) {
        if let Some(ticket) = self.ticket.take() {
            self.gate.release_ticket(ticket);
        }
    }
}
