//! Data types for the deploy flow.

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::time::Duration;

use scenedeploy_catalyst::UploadOptions;
use scenedeploy_linker::BrowserLauncher;
use scenedeploy_protocol::Network;
use scenedeploy_protocol::constants::DEFAULT_PLAY_URL;

/// Everything one deploy run needs to know.
#[derive(Debug, Clone)]
pub struct DeployConfig {
    pub project_dir: PathBuf,
    /// Explicit catalyst root.
    pub target: Option<String>,
    /// Explicit content server. Exclusive with `target`.
    pub target_content: Option<String>,
    /// Network used when no explicit target is given.
    pub network: Network,
    pub skip_version_checks: bool,
    /// Skip compilation; the project check still runs.
    pub skip_build: bool,
    pub upload: UploadOptions,
    /// Ceiling on the wait for a signature. `None` waits indefinitely.
    pub signing_timeout: Option<Duration>,
    pub play_url: String,
    /// Opens the signer page once the session is ready.
    pub browser: Option<BrowserLauncher>,
}

impl DeployConfig {
    pub fn new(project_dir: impl Into<PathBuf>) -> Self {
        Self {
            project_dir: project_dir.into(),
            target: None,
            target_content: None,
            network: Network::default(),
            skip_version_checks: false,
            skip_build: false,
            upload: UploadOptions::default(),
            signing_timeout: None,
            play_url: DEFAULT_PLAY_URL.into(),
            browser: None,
        }
    }
}

/// What the operator is asked to approve before signing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploySummary {
    pub entity_id: String,
    pub pointers: Vec<String>,
    pub files: usize,
    pub upload_size: u64,
    pub target: String,
}

/// Approval gate between packaging and signing.
pub trait Confirmation: Send + Sync {
    fn confirm(&self, summary: DeploySummary) -> Pin<Box<dyn Future<Output = bool> + Send + '_>>;
}

/// Approves every deployment (`--yes`).
pub struct AutoConfirm;

impl Confirmation for AutoConfirm {
    fn confirm(&self, _summary: DeploySummary) -> Pin<Box<dyn Future<Output = bool> + Send + '_>> {
        Box::pin(async { true })
    }
}

/// Progress event emitted during deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeployEvent {
    /// Non-fatal problem with the installed SDK.
    VersionWarning { message: String },
    Building,
    Built,
    /// The entity was packaged.
    EntityCreated {
        entity_id: String,
        files: usize,
        upload_size: u64,
    },
    /// The signer page is waiting at `url`.
    SigningReady { url: String },
    Signed {
        address: String,
        signature: String,
        network: String,
    },
    /// The signing session ended without a signature.
    SigningAborted { reason: String },
    Uploading { target: String },
    Completed {
        scene_url: String,
        content_url: String,
        /// Blobs sent to the content server.
        uploaded: usize,
        /// Blobs the server already stored.
        skipped: usize,
    },
    Failed {
        error_type: &'static str,
        error: String,
    },
}

/// Single result of a deploy run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentOutcome {
    pub success: bool,
    pub entity_id: Option<String>,
    pub scene_url: Option<String>,
    pub error: Option<String>,
    pub error_type: Option<&'static str>,
}
