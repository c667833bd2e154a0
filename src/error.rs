//! Typed failure conditions surfaced by the session manager and controller.
//!
//! Every variant is a local, recoverable condition: the caller is expected to
//! show it to the user and carry on.

use thiserror::Error;

use crate::types::TrainingMode;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SessionError {
    /// The value source could not be activated (or did not activate within the
    /// connect timeout). The controller stays disconnected.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// A recording was requested while the other mode is still recording.
    /// Stop the active session first, then retry.
    #[error("cannot start recording: {active} session is already recording")]
    AlreadyRecording { active: TrainingMode },

    /// Stop was requested while no session is recording.
    #[error("no session is recording")]
    NotRecording,

    /// A Max session was stopped without a single reading, so it has no
    /// maximum.
    #[error("max session stopped with no readings; maximum is undefined")]
    EmptySessionMax,
}

pub type Result<T> = std::result::Result<T, SessionError>;
