use std::time::Duration;

/// Errors produced by the signing handshake.
#[derive(Debug, thiserror::Error)]
pub enum LinkerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("signing already started on this coordinator")]
    AlreadyStarted,

    #[error("signing session was never started")]
    NotStarted,

    #[error("signing aborted: {0}")]
    Aborted(String),

    #[error("no signature received within {0:?}")]
    DeadlineExceeded(Duration),
}
