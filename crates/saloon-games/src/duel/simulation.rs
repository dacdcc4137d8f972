//! The revolver simulation.
//!
//! One chamber out of six holds the bullet. Players alternate pulling the
//! trigger until somebody reaches it.

use saloon_core::RandomSource;

use super::session::Seat;

/// Number of chambers in the cylinder.
pub const CHAMBERS: u32 = 6;

/// One pull of the trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Round {
    /// 1-based round number.
    pub number: u32,
    /// Who held the revolver.
    pub shooter: Seat,
    /// Whether the shooter lived through it.
    pub survived: bool,
}

/// A fully drawn duel, before any narration or bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Simulation {
    /// Who pulled the trigger first.
    pub first: Seat,
    /// Chamber holding the bullet, in `1..=CHAMBERS`.
    pub bullet: u32,
    /// Every round in order. The last one is always fatal.
    pub rounds: Vec<Round>,
}

impl Simulation {
    /// The seat that found the bullet.
    pub fn eliminated(&self) -> Seat {
        self.rounds.last().map_or(self.first, |r| r.shooter)
    }

    /// The seat that did not.
    pub fn survivor(&self) -> Seat {
        self.eliminated().other()
    }
}

/// Draw the bullet chamber, then the first shooter, and play the rounds out.
///
/// Takes exactly two draws from `rng`.
pub fn simulate(rng: &mut dyn RandomSource) -> Simulation {
    let bullet = rng.between(1, CHAMBERS);
    let first = if rng.coin() {
        Seat::Challenger
    } else {
        Seat::Challenged
    };

    let mut shooter = first;
    let rounds = (1..=bullet)
        .map(|number| {
            let round = Round {
                number,
                shooter,
                survived: number < bullet,
            };
            shooter = shooter.other();
            round
        })
        .collect();

    Simulation {
        first,
        bullet,
        rounds,
    }
}
