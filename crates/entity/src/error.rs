use std::path::PathBuf;

/// Errors produced while building an entity manifest.
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("an entity must occupy at least one pointer")]
    NoPointers,

    #[error("file {path} is {size} bytes, above the {limit} byte limit")]
    FileTooLarge { path: String, size: u64, limit: u64 },

    #[error("failed to serialize entity manifest: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Errors produced while collecting project files.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid ignore pattern in {path}: {message}")]
    Pattern { path: PathBuf, message: String },
}
