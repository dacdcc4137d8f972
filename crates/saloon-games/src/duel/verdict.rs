//! Outcome resolution for a finished simulation.

use saloon_core::ChatRole;

/// How a duel ends once the bullet has found somebody.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Both players are protected; the shot bounces into the narrator.
    NarratorDown,
    /// The eliminated player is on the allow-list; the survivor takes the hit.
    Paradox,
    /// The eliminated player is protected; nobody is credited.
    Draw,
    /// Ordinary case: one death, one kill.
    Elimination,
}

impl Verdict {
    /// Whether this outcome writes to the scoreboard.
    pub fn credits(self) -> bool {
        matches!(self, Self::Paradox | Self::Elimination)
    }
}

/// Resolve the outcome, in priority order.
pub fn judge(survivor: ChatRole, eliminated: ChatRole, eliminated_allow_listed: bool) -> Verdict {
    if survivor.is_protected() && eliminated.is_protected() {
        Verdict::NarratorDown
    } else if eliminated_allow_listed {
        Verdict::Paradox
    } else if eliminated.is_protected() {
        Verdict::Draw
    } else {
        Verdict::Elimination
    }
}
