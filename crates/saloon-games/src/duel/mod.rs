//! Two-player revolver duel.

mod ledger;
mod machine;
mod session;
mod simulation;
mod texts;
mod verdict;

pub(crate) use machine::DuelMachine;
pub use machine::{ChallengeIssued, ChallengeRequest, DuelHandle, DuelReport, PressOutcome, Target};
pub use session::{DuelState, Seat};
pub use simulation::{CHAMBERS, Round, Simulation, simulate};
pub use verdict::{Verdict, judge};
