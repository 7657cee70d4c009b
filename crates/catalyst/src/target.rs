use reqwest::Url;

use scenedeploy_protocol::Network;

use crate::discovery::CatalystDiscovery;
use crate::error::{ConfigError, UploadError};

/// Endpoint that receives a deployment. Exactly one per deploy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeploymentTarget {
    /// A catalyst root; content lives under `/content`.
    ExplicitCatalyst(String),
    /// A content server URL used as-is.
    ExplicitContentServer(String),
    /// Whatever healthy catalyst discovery finds on the network.
    NetworkDefault(Network),
}

/// Picks the deployment target from the operator's options.
///
/// Empty strings count as unset. Discovery for the network default is
/// deferred to upload time.
pub fn resolve(
    explicit_catalyst: Option<&str>,
    explicit_content_server: Option<&str>,
    default_network: Network,
) -> Result<DeploymentTarget, ConfigError> {
    let catalyst = explicit_catalyst.map(str::trim).filter(|s| !s.is_empty());
    let content = explicit_content_server
        .map(str::trim)
        .filter(|s| !s.is_empty());

    match (catalyst, content) {
        (Some(_), Some(_)) => Err(ConfigError::ConflictingTargets),
        (Some(url), None) => Ok(DeploymentTarget::ExplicitCatalyst(normalize_url(url)?)),
        (None, Some(url)) => Ok(DeploymentTarget::ExplicitContentServer(normalize_url(url)?)),
        (None, None) => Ok(DeploymentTarget::NetworkDefault(default_network)),
    }
}

/// Adds a scheme when missing and strips trailing separators.
fn normalize_url(raw: &str) -> Result<String, ConfigError> {
    let with_scheme = if raw.contains("://") {
        raw.to_string()
    } else {
        format!("https://{raw}")
    };
    Url::parse(&with_scheme).map_err(|e| ConfigError::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;
    Ok(with_scheme.trim_end_matches('/').to_string())
}

impl DeploymentTarget {
    /// Content server URL for this target, running discovery if needed.
    pub async fn content_url(
        &self,
        discovery: &dyn CatalystDiscovery,
    ) -> Result<String, UploadError> {
        match self {
            Self::ExplicitCatalyst(url) => Ok(format!("{url}/content")),
            Self::ExplicitContentServer(url) => Ok(url.clone()),
            Self::NetworkDefault(network) => {
                let catalyst = discovery.discover(*network).await?;
                Ok(format!("{}/content", catalyst.trim_end_matches('/')))
            }
        }
    }

    /// Short description for operator output.
    pub fn describe(&self) -> String {
        match self {
            Self::ExplicitCatalyst(url) => format!("catalyst {url}"),
            Self::ExplicitContentServer(url) => format!("content server {url}"),
            Self::NetworkDefault(network) => format!("default {network} catalyst"),
        }
    }
}
