//! Deploy error types.

use std::path::PathBuf;
use std::time::Duration;

use scenedeploy_catalyst::{ConfigError, UploadError};
use scenedeploy_entity::{ManifestError, ScanError};
use scenedeploy_linker::LinkerError;

/// Errors from the project build step.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("please make sure that your project has a 'tsconfig.json' file in {0}")]
    NotTypescript(PathBuf),

    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    #[error("build failed ({}): {stderr}", exit_label(.status))]
    Failed { status: Option<i32>, stderr: String },
}

fn exit_label(status: &Option<i32>) -> String {
    match status {
        Some(code) => format!("exit code {code}"),
        None => "terminated by signal".into(),
    }
}

/// Problems with the project's `scene.json`.
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error("scene file not found at {0}")]
    Missing(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed scene file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("scene has no parcels")]
    NoParcels,

    #[error("invalid parcel {0:?}, expected \"x,y\" with integer coordinates")]
    InvalidParcel(String),

    #[error("base parcel {0} is not one of the scene parcels")]
    BaseOutsideParcels(String),
}

/// Any failure of the deploy pipeline.
#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error(transparent)]
    Scene(#[from] SceneError),

    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("deployment declined")]
    Declined,

    #[error("signing aborted: {0}")]
    SigningAborted(String),

    #[error("upload did not finish within {0:?}")]
    UploadTimeout(Duration),

    #[error("could not upload content: {0}")]
    Upload(UploadError),

    /// Interrupted after signing, while uploading.
    #[error("upload cancelled by operator")]
    Cancelled,
}

impl From<LinkerError> for DeployError {
    fn from(e: LinkerError) -> Self {
        match e {
            LinkerError::Aborted(reason) => Self::SigningAborted(reason),
            other => Self::SigningAborted(other.to_string()),
        }
    }
}

impl From<UploadError> for DeployError {
    fn from(e: UploadError) -> Self {
        match e {
            UploadError::Timeout(after) => Self::UploadTimeout(after),
            other => Self::Upload(other),
        }
    }
}

impl DeployError {
    /// Stable error category reported to the operator and to analytics.
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::Config(_) => "CONFIG_ERROR",
            Self::Build(_) => "BUILD_ERROR",
            Self::Scene(_) => "VALIDATION_ERROR",
            Self::Manifest(_) | Self::Scan(_) | Self::Io(_) => "MANIFEST_ERROR",
            Self::Declined | Self::SigningAborted(_) => "SIGNING_ABORTED",
            Self::Cancelled => "CANCELLED",
            Self::UploadTimeout(_) => "UPLOAD_TIMEOUT",
            Self::Upload(_) => "UPLOAD_ERROR",
        }
    }
}
