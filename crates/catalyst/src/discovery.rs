//! Finds a healthy catalyst for a network.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use tracing::{debug, info, warn};

use scenedeploy_protocol::constants::CATALYST_PROBE_TIMEOUT;
use scenedeploy_protocol::{CatalystServer, Network};

use crate::error::UploadError;

/// Resolves a network to the root URL of a catalyst that accepts
/// deployments.
pub trait CatalystDiscovery: Send + Sync {
    fn discover(
        &self,
        network: Network,
    ) -> Pin<Box<dyn Future<Output = Result<String, UploadError>> + Send + '_>>;
}

/// Discovery over HTTP.
///
/// Reads the catalyst list from the network's seed node and returns the
/// first server whose `/content/status` answers. The seed itself is the
/// last resort.
pub struct HttpDiscovery {
    http: reqwest::Client,
    probe_timeout: Duration,
    seed_override: Option<String>,
}

impl HttpDiscovery {
    pub fn new(http: reqwest::Client) -> Self {
        Self {
            http,
            probe_timeout: CATALYST_PROBE_TIMEOUT,
            seed_override: None,
        }
    }

    /// Uses `seed` instead of the network's built-in seed node.
    pub fn with_seed(mut self, seed: impl Into<String>) -> Self {
        self.seed_override = Some(seed.into().trim_end_matches('/').to_string());
        self
    }

    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    async fn list_servers(&self, seed: &str) -> Result<Vec<CatalystServer>, UploadError> {
        let url = format!("{seed}/lambdas/contracts/servers");
        let resp = self
            .http
            .get(&url)
            .timeout(self.probe_timeout)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(UploadError::Discovery(format!(
                "{url} answered {}",
                resp.status()
            )));
        }
        resp.json::<Vec<CatalystServer>>()
            .await
            .map_err(|e| UploadError::InvalidResponse(e.to_string()))
    }

    async fn is_healthy(&self, address: &str) -> bool {
        let url = format!("{}/content/status", address.trim_end_matches('/'));
        match self
            .http
            .get(&url)
            .timeout(self.probe_timeout)
            .send()
            .await
        {
            Ok(resp) if resp.status().is_success() => true,
            Ok(resp) => {
                debug!(%address, status = %resp.status(), "catalyst unhealthy");
                false
            }
            Err(e) => {
                debug!(%address, "catalyst unreachable: {e}");
                false
            }
        }
    }
}

impl CatalystDiscovery for HttpDiscovery {
    fn discover(
        &self,
        network: Network,
    ) -> Pin<Box<dyn Future<Output = Result<String, UploadError>> + Send + '_>> {
        Box::pin(async move {
            let seed = self
                .seed_override
                .clone()
                .unwrap_or_else(|| network.seed_url().to_string());

            let servers = match self.list_servers(&seed).await {
                Ok(servers) => servers,
                Err(e) => {
                    warn!("could not list {network} catalysts from {seed}: {e}");
                    Vec::new()
                }
            };

            for server in &servers {
                if self.is_healthy(&server.address).await {
                    info!(address = %server.address, "selected catalyst");
                    return Ok(server.address.trim_end_matches('/').to_string());
                }
            }

            if self.is_healthy(&seed).await {
                info!(address = %seed, "falling back to seed catalyst");
                return Ok(seed);
            }

            Err(UploadError::Discovery(format!(
                "no healthy {network} catalyst among {} candidates",
                servers.len() + 1
            )))
        })
    }
}
