//! Deploy orchestrator.
//!
//! Runs the pipeline for one project and reports a single outcome.
//! Progress is published as [`DeployEvent`]s.

use std::path::Path;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use scenedeploy_analytics::{TrackingEvent, TrackingQueue};
use scenedeploy_catalyst::{UploadReceipt, Uploader, resolve, scene_url};
use scenedeploy_entity::{
    FileSet, IgnoreList, ScanError, build_entity, collect_files, ensure_ignore_file,
};
use scenedeploy_linker::{SessionRequest, SignerHost, SigningCoordinator, SigningEvent};

use crate::builder::ProjectBuilder;
use crate::error::DeployError;
use crate::scene::SceneDescriptor;
use crate::types::{
    Confirmation, DeployConfig, DeployEvent, DeploySummary, DeploymentOutcome,
};
use crate::version::check_sdk_version;

/// External collaborators of a deploy run.
pub struct Collaborators<'a> {
    pub builder: &'a dyn ProjectBuilder,
    pub signer: &'a dyn SignerHost,
    pub uploader: &'a Uploader,
    pub confirm: &'a dyn Confirmation,
}

struct Deployed {
    entity_id: String,
    scene_url: String,
    receipt: UploadReceipt,
}

/// Orchestrates a scene deployment.
pub struct DeployOrchestrator {
    events_tx: mpsc::Sender<DeployEvent>,
    events_rx: Option<mpsc::Receiver<DeployEvent>>,
    cancel: CancellationToken,
    tracking: Arc<TrackingQueue>,
}

impl DeployOrchestrator {
    pub fn new(tracking: Arc<TrackingQueue>) -> Self {
        let (events_tx, events_rx) = mpsc::channel(64);
        Self {
            events_tx,
            events_rx: Some(events_rx),
            cancel: CancellationToken::new(),
            tracking,
        }
    }

    /// Takes the event receiver. Can only be called once.
    pub fn take_events(&mut self) -> Option<mpsc::Receiver<DeployEvent>> {
        self.events_rx.take()
    }

    /// Returns a cancellation token for this deployment.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    async fn emit(&self, event: DeployEvent) {
        let _ = self.events_tx.send(event).await;
    }

    /// Runs the whole pipeline. Every failure ends up in the returned
    /// outcome; nothing is retried.
    pub async fn deploy(
        &self,
        config: &DeployConfig,
        deps: &Collaborators<'_>,
    ) -> DeploymentOutcome {
        self.tracking.record(TrackingEvent::DeployRequested);

        let mut entity_id = None;
        match self.run(config, deps, &mut entity_id).await {
            Ok(deployed) => {
                self.tracking.record(TrackingEvent::DeploySucceeded);
                info!(
                    entity_id = %deployed.entity_id,
                    scene_url = %deployed.scene_url,
                    "deploy completed"
                );
                self.emit(DeployEvent::Completed {
                    scene_url: deployed.scene_url.clone(),
                    content_url: deployed.receipt.content_url,
                    uploaded: deployed.receipt.uploaded,
                    skipped: deployed.receipt.skipped,
                })
                .await;

                DeploymentOutcome {
                    success: true,
                    entity_id: Some(deployed.entity_id),
                    scene_url: Some(deployed.scene_url),
                    error: None,
                    error_type: None,
                }
            }
            Err(e) => {
                let error_type = e.error_type();
                let message = e.to_string();
                self.tracking.record(TrackingEvent::Error {
                    error_type: error_type.into(),
                    message: message.clone(),
                });
                error!(error_type, error = %message, "deploy failed");
                self.emit(DeployEvent::Failed {
                    error_type,
                    error: message.clone(),
                })
                .await;

                DeploymentOutcome {
                    success: false,
                    entity_id,
                    scene_url: None,
                    error: Some(message),
                    error_type: Some(error_type),
                }
            }
        }
    }

    /// Relays what the signing session reported so far.
    async fn forward_signing(&self, events: &mut Option<mpsc::Receiver<SigningEvent>>) {
        let Some(rx) = events else {
            return;
        };
        while let Ok(event) = rx.try_recv() {
            let event = match event {
                SigningEvent::Ready { url } => DeployEvent::SigningReady { url },
                SigningEvent::Signed {
                    address,
                    signature,
                    chain_id,
                } => DeployEvent::Signed {
                    address,
                    signature,
                    network: chain_id.display_name(),
                },
                SigningEvent::Aborted { reason } => DeployEvent::SigningAborted { reason },
            };
            self.emit(event).await;
        }
    }

    async fn run(
        &self,
        config: &DeployConfig,
        deps: &Collaborators<'_>,
        entity_id: &mut Option<String>,
    ) -> Result<Deployed, DeployError> {
        let target = resolve(
            config.target.as_deref(),
            config.target_content.as_deref(),
            config.network,
        )?;
        let dir = config.project_dir.as_path();

        if !config.skip_version_checks {
            if let Some(message) = check_sdk_version(dir).warning() {
                warn!("{message}");
                self.emit(DeployEvent::VersionWarning { message }).await;
            }
        }

        deps.builder.check(dir)?;
        if config.skip_build {
            info!("skipping build");
        } else {
            self.emit(DeployEvent::Building).await;
            deps.builder.compile(dir).await?;
            self.emit(DeployEvent::Built).await;
        }

        let files = collect(dir).await?;
        let scene = SceneDescriptor::load(dir)?;
        let metadata = scene.metadata()?;
        let descriptor = build_entity(files, scene.pointers(), &metadata)?;
        let id = descriptor.id.to_string();
        *entity_id = Some(id.clone());
        self.emit(DeployEvent::EntityCreated {
            entity_id: id.clone(),
            files: descriptor.files.len(),
            upload_size: descriptor.upload_size(),
        })
        .await;

        scene.validate()?;

        let summary = DeploySummary {
            entity_id: id.clone(),
            pointers: descriptor.pointers.clone(),
            files: descriptor.files.len(),
            upload_size: descriptor.upload_size(),
            target: target.describe(),
        };
        if !deps.confirm.confirm(summary).await {
            return Err(DeployError::Declined);
        }
        self.tracking.record(TrackingEvent::DeployStarted);

        // Sign.
        let mut coordinator = SigningCoordinator::new(self.cancel.clone());
        if let Some(browser) = &config.browser {
            coordinator = coordinator.with_browser(browser.clone());
        }
        let mut signing_events = coordinator.take_events();
        self.tracking.record(TrackingEvent::SceneLinkStarted);
        let started = coordinator
            .start_signing(
                SessionRequest {
                    entity_id: id.clone(),
                    pointers: descriptor.pointers.clone(),
                },
                deps.signer,
            )
            .await;
        self.forward_signing(&mut signing_events).await;
        started?;

        let signed = coordinator.finish_within(config.signing_timeout).await;
        self.forward_signing(&mut signing_events).await;
        let signed = signed?;
        self.tracking.record(TrackingEvent::SceneLinkSucceeded);
        let chain_id = signed.response.chain_id;

        // Upload.
        self.emit(DeployEvent::Uploading {
            target: target.describe(),
        })
        .await;
        let receipt = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(DeployError::Cancelled),
            result = deps.uploader.upload(&target, &descriptor, signed.auth_chain, &config.upload) => result?,
        };

        Ok(Deployed {
            entity_id: id,
            scene_url: scene_url(&config.play_url, chain_id, scene.base()),
            receipt,
        })
    }
}

/// Collects the project's files off the async runtime, writing the
/// default ignore file first when the project has none.
async fn collect(dir: &Path) -> Result<FileSet, DeployError> {
    let dir = dir.to_path_buf();
    let files = tokio::task::spawn_blocking(move || -> Result<FileSet, ScanError> {
        ensure_ignore_file(&dir)?;
        let ignore = IgnoreList::load(&dir)?;
        collect_files(&dir, &ignore)
    })
    .await
    .map_err(|e| DeployError::Io(std::io::Error::other(e)))??;
    Ok(files)
}
