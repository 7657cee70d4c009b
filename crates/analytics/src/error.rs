use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum AnalyticsError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed user file {path}: {source}")]
    UserFile {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("home directory not found")]
    NoHomeDir,

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("tracking endpoint answered {0}")]
    Rejected(u16),
}
