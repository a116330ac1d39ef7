use crate::client::error::TransportError;
use crate::export::record::SearchRecord;
use std::fmt;
use thiserror::Error;

/// Lifecycle of a [`SearchExportSession`](super::SearchExportSession).
///
/// ```text
/// Idle -> Submitting -> Streaming -> { Streaming | Completed | Cancelled | Failed }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Submitting,
    Streaming,
    Completed,
    Cancelled,
    Failed,
}

impl SessionState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SessionState::Completed | SessionState::Cancelled | SessionState::Failed
        )
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SessionState::Idle => "idle",
            SessionState::Submitting => "submitting",
            SessionState::Streaming => "streaming",
            SessionState::Completed => "completed",
            SessionState::Cancelled => "cancelled",
            SessionState::Failed => "failed",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("session cannot start from state '{0}'")]
    InvalidState(SessionState),
}

/// How a session ended, as seen by its caller.
#[derive(Debug)]
pub enum SessionOutcome {
    /// Every record of the job, in arrival order.
    Completed(Vec<SearchRecord>),
    /// Cancellation was observed at a stream boundary; partial results are discarded.
    Cancelled,
    /// The session stopped on an error; partial results are discarded.
    Failed(SessionError),
}

impl SessionOutcome {
    pub fn state(&self) -> SessionState {
        match self {
            SessionOutcome::Completed(_) => SessionState::Completed,
            SessionOutcome::Cancelled => SessionState::Cancelled,
            SessionOutcome::Failed(_) => SessionState::Failed,
        }
    }

    pub fn records(&self) -> Option<&[SearchRecord]> {
        match self {
            SessionOutcome::Completed(records) => Some(records),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&SessionError> {
        match self {
            SessionOutcome::Failed(e) => Some(e),
            _ => None,
        }
    }
}
