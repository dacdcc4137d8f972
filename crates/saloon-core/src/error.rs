//! Error types for collaborator calls.

use thiserror::Error;

/// Result type returned by every collaborator port.
pub type PortResult<T> = Result<T, CollaboratorError>;

/// A messaging, membership, or persistence call failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CollaboratorError {
    /// Sending, editing, or deleting a message failed.
    #[error("messaging failed: {0}")]
    Messaging(String),

    /// Looking up or restricting a chat member failed.
    #[error("membership lookup failed: {0}")]
    Membership(String),

    /// Reading or writing a persisted record failed.
    #[error("storage failed: {0}")]
    Storage(String),
}
