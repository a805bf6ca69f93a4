use thiserror::Error;

use crate::host::ThreadId;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SignalError {
    /// `wait` was called on a signal that was built without a scheduler.
    #[error("No scheduler")]
    NoScheduler,
    #[error(transparent)]
    Host(#[from] HostError),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    #[error("function expected, got {0}")]
    NotCallable(&'static str),
    #[error("unknown thread {0}")]
    UnknownThread(ThreadId),
}

/// A listener invocation that raised instead of returning.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct CallError {
    pub message: String,
}

impl CallError {
    pub fn new(message: impl Into<String>) -> Self { Self { message: message.into() } }
}
