//! `scenedeploy deploy`.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use tokio::sync::mpsc;

use scenedeploy_catalyst::{CatalystClient, HttpDiscovery, UploadOptions, Uploader};
use scenedeploy_deploy::{
    AutoConfirm, Collaborators, Confirmation, DeployConfig, DeployError, DeployEvent,
    DeployOrchestrator, DeploymentOutcome, NpmBuilder,
};
use scenedeploy_linker::{BrowserLauncher, LinkerConfig, LinkerServer};
use scenedeploy_protocol::Network;

use crate::config::CliConfig;
use crate::prompt::{TerminalConfirm, human_size};
use crate::tracking;

#[derive(Debug, Args)]
pub struct DeployArgs {
    /// Catalyst to deploy to, e.g. https://peer.example.org
    #[arg(short, long, conflicts_with = "target_content")]
    pub target: Option<String>,

    /// Content server to deploy to, bypassing the catalyst root
    #[arg(long = "target-content")]
    pub target_content: Option<String>,

    /// Network used when no target is given (mainnet or sepolia)
    #[arg(long, default_value = "mainnet")]
    pub network: Network,

    /// Project directory
    #[arg(long, default_value = ".")]
    pub dir: PathBuf,

    /// Skip the SDK version check
    #[arg(long)]
    pub skip_version_checks: bool,

    /// Skip `npm run build`
    #[arg(long)]
    pub skip_build: bool,

    /// Upload every file even if the server already has it
    #[arg(long)]
    pub force_upload: bool,

    /// Deploy without asking for confirmation
    #[arg(short, long)]
    pub yes: bool,
}

pub async fn run(args: DeployArgs) -> anyhow::Result<DeploymentOutcome> {
    let config = CliConfig::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "failed to load config, using defaults");
        CliConfig::default()
    });

    let (upload_timeout, signing_timeout) =
        match config.upload_timeout().and_then(|u| Ok((u, config.signing_timeout()?))) {
            Ok(timeouts) => timeouts,
            Err(e) => return Ok(config_failure(DeployError::from(e))),
        };

    let http = reqwest::Client::builder()
        .user_agent(concat!("scenedeploy/", env!("CARGO_PKG_VERSION")))
        .build()?;
    let tracking = Arc::new(tracking::init(&config, http.clone()));

    let mut orchestrator = DeployOrchestrator::new(tracking.clone());
    let events = orchestrator
        .take_events()
        .ok_or_else(|| anyhow::anyhow!("event receiver already taken"))?;
    let printer = tokio::spawn(print_events(events));

    let cancel = orchestrator.cancel_token();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("interrupted");
                cancel.cancel();
            }
        }
    });

    let linker = LinkerServer::new(
        LinkerConfig {
            port: config.linker_port,
            ..LinkerConfig::default()
        },
        cancel.child_token(),
    );
    let uploader = match &config.catalyst_seed_url {
        Some(seed) => Uploader::new(
            Arc::new(CatalystClient::new(http.clone())),
            Arc::new(HttpDiscovery::new(http.clone()).with_seed(seed.clone())),
        ),
        None => Uploader::over_http(http.clone()),
    };
    let confirm: Box<dyn Confirmation> = if args.yes {
        Box::new(AutoConfirm)
    } else {
        Box::new(TerminalConfirm)
    };
    let builder = NpmBuilder::default();

    let deploy_config = DeployConfig {
        target: args.target,
        target_content: args.target_content,
        network: args.network,
        skip_version_checks: args.skip_version_checks,
        skip_build: args.skip_build,
        upload: UploadOptions {
            timeout: upload_timeout,
            force_upload: args.force_upload,
        },
        signing_timeout,
        play_url: config.play_url.clone(),
        browser: config.open_browser.then(BrowserLauncher::default),
        ..DeployConfig::new(args.dir)
    };

    let outcome = orchestrator
        .deploy(
            &deploy_config,
            &Collaborators {
                builder: &builder,
                signer: &linker,
                uploader: &uploader,
                confirm: confirm.as_ref(),
            },
        )
        .await;

    linker.shutdown();
    drop(orchestrator);
    let _ = printer.await;
    tracking.drain_all().await;

    Ok(outcome)
}

fn config_failure(error: DeployError) -> DeploymentOutcome {
    let error_type = error.error_type();
    eprintln!("{error_type}: {error}");
    DeploymentOutcome {
        success: false,
        entity_id: None,
        scene_url: None,
        error: Some(error.to_string()),
        error_type: Some(error_type),
    }
}

async fn print_events(mut events: mpsc::Receiver<DeployEvent>) {
    while let Some(event) = events.recv().await {
        match event {
            DeployEvent::VersionWarning { message } => eprintln!("warning: {message}"),
            DeployEvent::Building => println!("Building project..."),
            DeployEvent::Built => println!("Project built"),
            DeployEvent::EntityCreated {
                entity_id,
                files,
                upload_size,
            } => println!(
                "Packaged {files} files ({}) as {entity_id}",
                human_size(upload_size)
            ),
            DeployEvent::SigningReady { url } => {
                println!("Sign the deployment in your browser: {url}")
            }
            DeployEvent::Signed {
                address, network, ..
            } => println!("Signed by {address} on {network}"),
            DeployEvent::Uploading { target } => println!("Uploading to {target}..."),
            DeployEvent::SigningAborted { reason } => eprintln!("Signing aborted: {reason}"),
            DeployEvent::Completed {
                scene_url,
                content_url,
                uploaded,
                skipped,
            } => {
                println!(
                    "Content deployed to {content_url} ({uploaded} uploaded, {skipped} already stored)"
                );
                println!("Scene: {scene_url}");
            }
            DeployEvent::Failed { error_type, error } => eprintln!("{error_type}: {error}"),
        }
    }
}
