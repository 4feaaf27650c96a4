//! Command-level error kinds
//!
//! Every operator/system command returns its error synchronously; none of
//! these ever aborts the tick loop.

use thiserror::Error;

/// Failure of an operator or system command against the network.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    /// Malformed input: unknown intersection id, invalid phase color,
    /// non-positive duration, or a degenerate corridor path.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The command is valid but conflicts with the current coordination
    /// state, e.g. a non-Red light during an emergency override or a
    /// manual change on a corridor-held intersection.
    #[error("state conflict: {0}")]
    StateConflict(String),

    /// The referenced alert or event does not exist.
    #[error("not found: {0}")]
    NotFound(String),
}

impl CommandError {
    pub fn validation(msg: impl Into<String>) -> Self {
        CommandError::Validation(msg.into())
    }

    pub fn state_conflict(msg: impl Into<String>) -> Self {
        CommandError::StateConflict(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        CommandError::NotFound(msg.into())
    }
}
