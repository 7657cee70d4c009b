//! Per-developer tracking identity: `~/.scenedeploy/info.json`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::AnalyticsError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserConfig {
    pub user_id: String,
    #[serde(default = "default_track_stats")]
    pub track_stats: bool,
}

fn default_track_stats() -> bool {
    true
}

/// Default location of the user file.
pub fn user_config_path() -> Result<PathBuf, AnalyticsError> {
    dirs::home_dir()
        .map(|home| home.join(".scenedeploy").join("info.json"))
        .ok_or(AnalyticsError::NoHomeDir)
}

impl UserConfig {
    /// Reads the user file at `path`, creating it with a fresh id and
    /// tracking enabled when missing. The flag is `true` on creation.
    pub fn load_or_create(path: &Path) -> Result<(Self, bool), AnalyticsError> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config = serde_json::from_str(&content).map_err(|source| {
                AnalyticsError::UserFile {
                    path: path.to_path_buf(),
                    source,
                }
            })?;
            return Ok((config, false));
        }

        let config = Self {
            user_id: uuid::Uuid::new_v4().to_string(),
            track_stats: true,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(&config)?)?;
        debug!(path = %path.display(), "user file created");
        Ok((config, true))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_file_on_first_run() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".scenedeploy").join("info.json");

        let (first, created) = UserConfig::load_or_create(&path).unwrap();
        assert!(created);
        assert!(first.track_stats);
        assert!(uuid::Uuid::parse_str(&first.user_id).is_ok());

        let (second, created) = UserConfig::load_or_create(&path).unwrap();
        assert!(!created);
        assert_eq!(first, second);
    }

    #[test]
    fn reads_opt_out() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("info.json");
        std::fs::write(&path, r#"{"userId":"abc","trackStats":false}"#).unwrap();

        let (config, created) = UserConfig::load_or_create(&path).unwrap();
        assert!(!created);
        assert_eq!(config.user_id, "abc");
        assert!(!config.track_stats);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("info.json");
        std::fs::write(&path, "not json").unwrap();

        assert!(matches!(
            UserConfig::load_or_create(&path),
            Err(AnalyticsError::UserFile { .. })
        ));
    }
}
