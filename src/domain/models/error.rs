use std::time::Duration;

use thiserror::Error;

use super::SessionState;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("{0} must not be empty")]
    EmptyInput(&'static str),

    #[error("your app is still being generated, wait for it to finish or press CTRL+C to cancel")]
    Busy,

    #[error("cannot {operation} while the session is {state}")]
    InvalidTransition {
        operation: &'static str,
        state: SessionState,
    },

    #[error("generation {0} has already completed")]
    StreamCompleted(u64),
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum BackendError {
    #[error("generation request failed with status {status}")]
    Status { status: u16 },

    #[error("generation response had no body")]
    EmptyBody,

    #[error("no output received from the backend for {0:?}")]
    Timeout(Duration),
}
