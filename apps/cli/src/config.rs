//! CLI configuration persisted as JSON.
//!
//! Stored at `<config dir>/scenedeploy/config.json`. Every field is
//! optional in the file; missing fields take their defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use scenedeploy_catalyst::{ConfigError, parse_timeout};
use scenedeploy_protocol::constants::{DEFAULT_LINKER_PORT, DEFAULT_PLAY_URL, DEFAULT_UPLOAD_TIMEOUT};

/// Overrides `segment_key` from the file.
pub const SEGMENT_KEY_ENV: &str = "SCENEDEPLOY_SEGMENT_KEY";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CliConfig {
    /// Write key for the tracking backend. Tracking is off without one.
    pub segment_key: Option<String>,
    pub linker_port: u16,
    /// Upload budget, e.g. `"10m"` or `"90s"`.
    pub upload_timeout: String,
    /// Signature wait ceiling. Unset waits until the operator acts.
    pub signing_timeout: Option<String>,
    pub play_url: String,
    /// Catalyst queried for the server list during discovery.
    pub catalyst_seed_url: Option<String>,
    pub open_browser: bool,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            segment_key: None,
            linker_port: DEFAULT_LINKER_PORT,
            upload_timeout: DEFAULT_UPLOAD_TIMEOUT.into(),
            signing_timeout: None,
            play_url: DEFAULT_PLAY_URL.into(),
            catalyst_seed_url: None,
            open_browser: true,
        }
    }
}

impl CliConfig {
    /// Loads the user's config file, applying environment overrides.
    pub fn load() -> anyhow::Result<Self> {
        let mut config = Self::load_from(&config_path()?)?;
        if let Ok(key) = std::env::var(SEGMENT_KEY_ENV) {
            if !key.trim().is_empty() {
                config.segment_key = Some(key.trim().to_string());
            }
        }
        Ok(config)
    }

    /// Reads `path`. A missing file yields defaults; a malformed one is
    /// logged and ignored.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        match serde_json::from_str(&content) {
            Ok(config) => Ok(config),
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse config, using defaults"
                );
                Ok(Self::default())
            }
        }
    }

    pub fn upload_timeout(&self) -> Result<Duration, ConfigError> {
        parse_timeout(&self.upload_timeout)
    }

    pub fn signing_timeout(&self) -> Result<Option<Duration>, ConfigError> {
        self.signing_timeout.as_deref().map(parse_timeout).transpose()
    }
}

fn config_path() -> anyhow::Result<PathBuf> {
    let base = dirs::config_dir()
        .ok_or_else(|| anyhow::anyhow!("could not determine the config directory"))?;
    Ok(base.join("scenedeploy").join("config.json"))
}
