//! `scene.json` loading and sanity checks.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use scenedeploy_protocol::constants::SCENE_FILE_NAME;

use crate::error::SceneError;

/// Parcel layout of a scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneParcels {
    #[serde(default)]
    pub parcels: Vec<String>,
    #[serde(default)]
    pub base: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Parsed `scene.json`. Unknown fields are kept so the descriptor can be
/// sent back verbatim as entity metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneDescriptor {
    pub scene: SceneParcels,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn parse_parcel(parcel: &str) -> Option<(i32, i32)> {
    let (x, y) = parcel.split_once(',')?;
    Some((x.trim().parse().ok()?, y.trim().parse().ok()?))
}

impl SceneDescriptor {
    /// Reads `scene.json` from the project root.
    pub fn load(project_dir: &Path) -> Result<Self, SceneError> {
        let path = project_dir.join(SCENE_FILE_NAME);
        if !path.is_file() {
            return Err(SceneError::Missing(path));
        }
        let content = std::fs::read_to_string(&path)?;
        serde_json::from_str(&content).map_err(|source| SceneError::Parse { path, source })
    }

    /// Requires at least one parcel, `x,y` integer coordinates for each,
    /// and a base parcel among them.
    pub fn validate(&self) -> Result<(), SceneError> {
        if self.scene.parcels.is_empty() {
            return Err(SceneError::NoParcels);
        }
        let mut coords = Vec::with_capacity(self.scene.parcels.len());
        for parcel in &self.scene.parcels {
            let xy = parse_parcel(parcel).ok_or_else(|| SceneError::InvalidParcel(parcel.clone()))?;
            coords.push(xy);
        }
        let base = parse_parcel(&self.scene.base)
            .ok_or_else(|| SceneError::InvalidParcel(self.scene.base.clone()))?;
        if !coords.contains(&base) {
            return Err(SceneError::BaseOutsideParcels(self.scene.base.clone()));
        }
        Ok(())
    }

    /// Pointers the scene occupies: its parcels.
    pub fn pointers(&self) -> &[String] {
        &self.scene.parcels
    }

    pub fn base(&self) -> &str {
        self.scene.base.trim()
    }

    /// The whole descriptor as JSON, used as entity metadata.
    pub fn metadata(&self) -> Result<Value, SceneError> {
        serde_json::to_value(self).map_err(|source| SceneError::Parse {
            path: SCENE_FILE_NAME.into(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scene(parcels: &[&str], base: &str) -> SceneDescriptor {
        serde_json::from_value(serde_json::json!({
            "display": { "title": "test" },
            "scene": { "parcels": parcels, "base": base },
            "main": "bin/game.js",
        }))
        .unwrap()
    }

    #[test]
    fn valid_scene() {
        let s = scene(&["10,20", "10,21"], "10,20");
        s.validate().unwrap();
        assert_eq!(s.pointers(), ["10,20", "10,21"]);
        assert_eq!(s.base(), "10,20");
    }

    #[test]
    fn base_outside_parcels_rejected() {
        let err = scene(&["10,20"], "0,0").validate().unwrap_err();
        assert!(matches!(err, SceneError::BaseOutsideParcels(b) if b == "0,0"));
    }

    #[test]
    fn empty_parcels_rejected() {
        assert!(matches!(
            scene(&[], "0,0").validate(),
            Err(SceneError::NoParcels)
        ));
    }

    #[test]
    fn malformed_parcel_rejected() {
        assert!(matches!(
            scene(&["10;20"], "10;20").validate(),
            Err(SceneError::InvalidParcel(_))
        ));
        assert!(matches!(
            scene(&["a,b"], "a,b").validate(),
            Err(SceneError::InvalidParcel(_))
        ));
    }

    #[test]
    fn negative_and_spaced_coordinates_accepted() {
        scene(&["-5, 3", "-5,4"], "-5,3").validate().unwrap();
    }

    #[test]
    fn metadata_keeps_unknown_fields() {
        let meta = scene(&["1,1"], "1,1").metadata().unwrap();
        assert_eq!(meta["display"]["title"], "test");
        assert_eq!(meta["main"], "bin/game.js");
        assert_eq!(meta["scene"]["base"], "1,1");
    }

    #[test]
    fn load_reports_missing_and_malformed() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            SceneDescriptor::load(dir.path()),
            Err(SceneError::Missing(_))
        ));

        std::fs::write(dir.path().join("scene.json"), "{").unwrap();
        assert!(matches!(
            SceneDescriptor::load(dir.path()),
            Err(SceneError::Parse { .. })
        ));

        std::fs::write(
            dir.path().join("scene.json"),
            r#"{"scene":{"parcels":["0,0"],"base":"0,0"}}"#,
        )
        .unwrap();
        let loaded = SceneDescriptor::load(dir.path()).unwrap();
        assert_eq!(loaded.base(), "0,0");
    }
}
