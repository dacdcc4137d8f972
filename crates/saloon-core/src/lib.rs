//! Core types for Saloon: the shared vocabulary of the game host.
//!
//! This crate defines who takes part in a game ([`Participant`]), what a
//! chat member may be ([`ChatRole`]), the records the games persist, and
//! the collaborator ports the engine talks through. It knows nothing about
//! duels or lotteries themselves.

/// Wall-clock abstraction used for timeouts and calendar dates.
pub mod clock;
/// Error types shared by every collaborator port.
pub mod error;
/// In-memory collaborator implementations.
pub mod memory;
/// Participant, chat, and message identifiers.
pub mod participant;
/// Async traits for messaging, membership, and persistence.
pub mod ports;
/// Bounded random integers behind a swappable source.
pub mod random;
/// Persisted record types.
pub mod record;
/// Closed enumeration of chat member roles.
pub mod role;

/// Re-export clock types.
pub use clock::{Clock, ManualClock, SystemClock};
/// Re-export error types.
pub use error::{CollaboratorError, PortResult};
/// Re-export identifier types.
pub use participant::{
    Affordance, AffordanceAction, ButtonPress, ChatId, MessageHandle, MessageId, Participant,
    ParticipantId,
};
/// Re-export port traits.
pub use ports::{Membership, Messenger, Store};
/// Re-export random sources.
pub use random::{RandomSource, ScriptedRandom, SeededRandom};
/// Re-export record types.
pub use record::{DailyPick, DuelistStats, PoolEntry};
/// Re-export the role enum.
pub use role::ChatRole;
