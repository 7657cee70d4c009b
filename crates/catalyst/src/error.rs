use std::time::Duration;

/// Contradictory or malformed target settings.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("you can't set both the 'target' and 'target-content' arguments")]
    ConflictingTargets,

    #[error("invalid target URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("invalid duration {value:?}: {reason}")]
    InvalidDuration { value: String, reason: String },
}

/// Errors produced while uploading an entity.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("upload did not finish within {0:?}")]
    Timeout(Duration),

    #[error("catalyst discovery failed: {0}")]
    Discovery(String),

    #[error("content server rejected the deployment ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("auth chain signs {found}, expected entity {expected}")]
    ChainMismatch { expected: String, found: String },
}

impl UploadError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}
