//! Bounded-time upload of a signed entity.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use scenedeploy_entity::EntityDescriptor;
use scenedeploy_protocol::{AuthChain, ChainId};
use scenedeploy_protocol::constants::DEFAULT_UPLOAD_TIMEOUT;

use crate::client::{CatalystClient, ContentServer, DeployPayload};
use crate::discovery::{CatalystDiscovery, HttpDiscovery};
use crate::error::{ConfigError, UploadError};
use crate::target::DeploymentTarget;

/// Parses a human duration such as `10m` or `90s`.
pub fn parse_timeout(value: &str) -> Result<Duration, ConfigError> {
    humantime::parse_duration(value.trim()).map_err(|e| ConfigError::InvalidDuration {
        value: value.to_string(),
        reason: e.to_string(),
    })
}

/// Shareable location of a deployed scene.
pub fn scene_url(play_url: &str, chain_id: ChainId, base: &str) -> String {
    format!(
        "{}/?NETWORK={}&position={}",
        play_url.trim_end_matches('/'),
        chain_id.network_name(),
        base
    )
}

#[derive(Debug, Clone)]
pub struct UploadOptions {
    /// Budget for the whole upload, discovery included.
    pub timeout: Duration,
    /// Send every blob even if the server reports it as stored.
    pub force_upload: bool,
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self {
            timeout: parse_timeout(DEFAULT_UPLOAD_TIMEOUT).unwrap_or(Duration::from_secs(600)),
            force_upload: false,
        }
    }
}

/// What a successful upload did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReceipt {
    pub entity_id: String,
    pub content_url: String,
    /// Blobs sent in the request.
    pub uploaded: usize,
    /// Blobs the server already had.
    pub skipped: usize,
}

/// Sends signed entities to their content server.
///
/// One call makes at most one deployment request; failures are never
/// retried here.
pub struct Uploader {
    server: Arc<dyn ContentServer>,
    discovery: Arc<dyn CatalystDiscovery>,
}

impl Uploader {
    pub fn new(server: Arc<dyn ContentServer>, discovery: Arc<dyn CatalystDiscovery>) -> Self {
        Self { server, discovery }
    }

    /// Uploader backed by [`CatalystClient`] and [`HttpDiscovery`].
    pub fn over_http(http: reqwest::Client) -> Self {
        Self::new(
            Arc::new(CatalystClient::new(http.clone())),
            Arc::new(HttpDiscovery::new(http)),
        )
    }

    /// Uploads `descriptor` with the chain that signs it.
    ///
    /// Fails with [`UploadError::Timeout`] once `options.timeout` elapses,
    /// whatever stage the upload is in.
    pub async fn upload(
        &self,
        target: &DeploymentTarget,
        descriptor: &EntityDescriptor,
        auth_chain: AuthChain,
        options: &UploadOptions,
    ) -> Result<UploadReceipt, UploadError> {
        let signed = auth_chain.entity_id().unwrap_or_default();
        if signed != descriptor.id.as_str() {
            return Err(UploadError::ChainMismatch {
                expected: descriptor.id.to_string(),
                found: signed.to_string(),
            });
        }

        info!(
            entity_id = %descriptor.id,
            target = %target.describe(),
            timeout = ?options.timeout,
            "uploading entity"
        );

        match tokio::time::timeout(
            options.timeout,
            self.run(target, descriptor, auth_chain, options.force_upload),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => {
                warn!(entity_id = %descriptor.id, "upload timed out");
                Err(UploadError::Timeout(options.timeout))
            }
        }
    }

    async fn run(
        &self,
        target: &DeploymentTarget,
        descriptor: &EntityDescriptor,
        auth_chain: AuthChain,
        force_upload: bool,
    ) -> Result<UploadReceipt, UploadError> {
        let content_url = target.content_url(self.discovery.as_ref()).await?;
        let hashes: Vec<&str> = descriptor.contents().keys().map(|h| h.as_str()).collect();

        let stored = if force_upload {
            HashSet::new()
        } else {
            match self.server.available_content(&content_url, &hashes).await {
                Ok(stored) => stored,
                Err(e) => {
                    warn!("could not check stored content, sending everything: {e}");
                    HashSet::new()
                }
            }
        };

        let files: Vec<(&str, &[u8])> = descriptor
            .contents()
            .iter()
            .filter(|(hash, _)| !stored.contains(hash.as_str()))
            .map(|(hash, data)| (hash.as_str(), data.as_slice()))
            .collect();
        let uploaded = files.len();
        let skipped = hashes.len() - uploaded;
        debug!(uploaded, skipped, "content selected for upload");

        self.server
            .deploy_entity(
                &content_url,
                DeployPayload {
                    entity_id: descriptor.id.as_str(),
                    entity_file: &descriptor.entity_file,
                    auth_chain,
                    files,
                },
            )
            .await?;

        info!(entity_id = %descriptor.id, %content_url, uploaded, skipped, "entity deployed");
        Ok(UploadReceipt {
            entity_id: descriptor.id.to_string(),
            content_url,
            uploaded,
            skipped,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use scenedeploy_entity::{FileSet, build_entity};
    use scenedeploy_protocol::Network;

    enum Answer {
        Accept,
        Reject(u16),
        Hang,
    }

    struct MockServer {
        stored: HashSet<String>,
        answer: Answer,
        deploys: AtomicUsize,
        sent: Mutex<Vec<String>>,
        urls: Mutex<Vec<String>>,
    }

    impl MockServer {
        fn new(answer: Answer) -> Self {
            Self {
                stored: HashSet::new(),
                answer,
                deploys: AtomicUsize::new(0),
                sent: Mutex::new(Vec::new()),
                urls: Mutex::new(Vec::new()),
            }
        }
    }

    impl ContentServer for MockServer {
        fn available_content<'a>(
            &'a self,
            _content_url: &'a str,
            hashes: &'a [&'a str],
        ) -> Pin<Box<dyn Future<Output = Result<HashSet<String>, UploadError>> + Send + 'a>>
        {
            Box::pin(async move {
                Ok(hashes
                    .iter()
                    .filter(|h| self.stored.contains(**h))
                    .map(|h| h.to_string())
                    .collect())
            })
        }

        fn deploy_entity<'a>(
            &'a self,
            content_url: &'a str,
            payload: DeployPayload<'a>,
        ) -> Pin<Box<dyn Future<Output = Result<(), UploadError>> + Send + 'a>> {
            Box::pin(async move {
                self.deploys.fetch_add(1, Ordering::SeqCst);
                self.urls.lock().unwrap().push(content_url.to_string());
                self.sent
                    .lock()
                    .unwrap()
                    .extend(payload.files.iter().map(|(h, _)| h.to_string()));
                match self.answer {
                    Answer::Accept => Ok(()),
                    Answer::Reject(status) => Err(UploadError::Rejected {
                        status,
                        body: "nope".into(),
                    }),
                    Answer::Hang => std::future::pending().await,
                }
            })
        }
    }

    struct FixedDiscovery(Option<&'static str>);

    impl CatalystDiscovery for FixedDiscovery {
        fn discover(
            &self,
            _network: Network,
        ) -> Pin<Box<dyn Future<Output = Result<String, UploadError>> + Send + '_>> {
            Box::pin(async move {
                self.0
                    .map(str::to_string)
                    .ok_or_else(|| UploadError::Discovery("none".into()))
            })
        }
    }

    fn descriptor() -> EntityDescriptor {
        let files: FileSet = [("a.txt", "A"), ("b.txt", "B")].into_iter().collect();
        build_entity(
            files,
            &["0,0".to_string()],
            &serde_json::json!({"scene": {"base": "0,0", "parcels": ["0,0"]}}),
        )
        .unwrap()
    }

    fn chain(descriptor: &EntityDescriptor) -> AuthChain {
        AuthChain::simple(descriptor.id.as_str(), "0xabc", "0xsig")
    }

    fn uploader(server: Arc<MockServer>, discovery: FixedDiscovery) -> Uploader {
        Uploader::new(server, Arc::new(discovery))
    }

    fn options() -> UploadOptions {
        UploadOptions {
            timeout: Duration::from_secs(5),
            force_upload: false,
        }
    }

    #[test]
    fn timeout_parsing() {
        assert_eq!(parse_timeout("10m").unwrap(), Duration::from_secs(600));
        assert_eq!(parse_timeout("90s").unwrap(), Duration::from_secs(90));
        assert!(matches!(
            parse_timeout("soon"),
            Err(ConfigError::InvalidDuration { .. })
        ));
        assert_eq!(UploadOptions::default().timeout, Duration::from_secs(600));
    }

    #[test]
    fn scene_url_format() {
        assert_eq!(
            scene_url("https://play.decentraland.org/", ChainId::EthereumMainnet, "10,20"),
            "https://play.decentraland.org/?NETWORK=mainnet&position=10,20"
        );
        assert_eq!(
            scene_url("https://play.decentraland.org", ChainId::EthereumSepolia, "0,0"),
            "https://play.decentraland.org/?NETWORK=sepolia&position=0,0"
        );
    }

    #[tokio::test]
    async fn uploads_to_explicit_catalyst() {
        let server = Arc::new(MockServer::new(Answer::Accept));
        let up = uploader(server.clone(), FixedDiscovery(None));
        let desc = descriptor();
        let target = DeploymentTarget::ExplicitCatalyst("https://peer.example.org".into());

        let receipt = up
            .upload(&target, &desc, chain(&desc), &options())
            .await
            .unwrap();

        assert_eq!(receipt.content_url, "https://peer.example.org/content");
        assert_eq!(receipt.entity_id, desc.id.to_string());
        assert_eq!(receipt.uploaded, 2);
        assert_eq!(receipt.skipped, 0);
        assert_eq!(server.deploys.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn network_default_uses_discovery() {
        let server = Arc::new(MockServer::new(Answer::Accept));
        let up = uploader(server.clone(), FixedDiscovery(Some("https://found.example/")));
        let desc = descriptor();

        let receipt = up
            .upload(
                &DeploymentTarget::NetworkDefault(Network::Mainnet),
                &desc,
                chain(&desc),
                &options(),
            )
            .await
            .unwrap();
        assert_eq!(receipt.content_url, "https://found.example/content");
        assert_eq!(
            *server.urls.lock().unwrap(),
            vec!["https://found.example/content".to_string()]
        );
    }

    #[tokio::test]
    async fn discovery_failure_surfaces() {
        let server = Arc::new(MockServer::new(Answer::Accept));
        let up = uploader(server.clone(), FixedDiscovery(None));
        let desc = descriptor();

        let err = up
            .upload(
                &DeploymentTarget::NetworkDefault(Network::Sepolia),
                &desc,
                chain(&desc),
                &options(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::Discovery(_)));
        assert_eq!(server.deploys.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn stored_content_skipped_unless_forced() {
        let desc = descriptor();
        let stored_hash = desc.contents().keys().next().unwrap().to_string();
        let target = DeploymentTarget::ExplicitContentServer("https://c.example/content".into());

        let mut mock = MockServer::new(Answer::Accept);
        mock.stored.insert(stored_hash.clone());
        let server = Arc::new(mock);
        let up = uploader(server.clone(), FixedDiscovery(None));

        let receipt = up
            .upload(&target, &desc, chain(&desc), &options())
            .await
            .unwrap();
        assert_eq!((receipt.uploaded, receipt.skipped), (1, 1));
        assert!(!server.sent.lock().unwrap().contains(&stored_hash));

        let forced = UploadOptions {
            force_upload: true,
            ..options()
        };
        let receipt = up.upload(&target, &desc, chain(&desc), &forced).await.unwrap();
        assert_eq!((receipt.uploaded, receipt.skipped), (2, 0));
    }

    #[tokio::test]
    async fn rejection_is_not_retried() {
        let server = Arc::new(MockServer::new(Answer::Reject(500)));
        let up = uploader(server.clone(), FixedDiscovery(None));
        let desc = descriptor();
        let target = DeploymentTarget::ExplicitCatalyst("https://peer.example.org".into());

        let err = up
            .upload(&target, &desc, chain(&desc), &options())
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::Rejected { status: 500, .. }));
        assert_eq!(server.deploys.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn hung_upload_times_out() {
        let server = Arc::new(MockServer::new(Answer::Hang));
        let up = uploader(server.clone(), FixedDiscovery(None));
        let desc = descriptor();
        let target = DeploymentTarget::ExplicitCatalyst("https://peer.example.org".into());

        let err = up
            .upload(&target, &desc, chain(&desc), &options())
            .await
            .unwrap_err();
        assert!(err.is_timeout());
        assert_eq!(server.deploys.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn chain_for_other_entity_refused() {
        let server = Arc::new(MockServer::new(Answer::Accept));
        let up = uploader(server.clone(), FixedDiscovery(None));
        let desc = descriptor();
        let target = DeploymentTarget::ExplicitCatalyst("https://peer.example.org".into());

        let err = up
            .upload(
                &target,
                &desc,
                AuthChain::simple("someone-else", "0xabc", "0xsig"),
                &options(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::ChainMismatch { .. }));
        assert_eq!(server.deploys.load(Ordering::SeqCst), 0);
    }
}
