//! Installed SDK version check.

use std::path::Path;

use semver::Version;
use serde::Deserialize;

/// Oldest SDK release the deploy flow is known to work with.
pub const MIN_SDK_VERSION: &str = "6.0.0";

/// Package the scene runtime ships in.
pub const SDK_PACKAGE: &str = "decentraland-ecs";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionCheck {
    Supported(Version),
    Outdated { installed: Version, minimum: Version },
    Unknown(String),
}

impl VersionCheck {
    /// Operator-facing warning, if any.
    pub fn warning(&self) -> Option<String> {
        match self {
            Self::Supported(_) => None,
            Self::Outdated { installed, minimum } => Some(format!(
                "{SDK_PACKAGE} {installed} is older than {minimum}; consider updating it"
            )),
            Self::Unknown(reason) => Some(format!(
                "could not determine the installed {SDK_PACKAGE} version: {reason}"
            )),
        }
    }
}

#[derive(Deserialize)]
struct PackageJson {
    version: String,
}

/// Reads `node_modules/decentraland-ecs/package.json` and compares it with
/// [`MIN_SDK_VERSION`]. Never fails; problems become
/// [`VersionCheck::Unknown`].
pub fn check_sdk_version(project_dir: &Path) -> VersionCheck {
    let path = project_dir
        .join("node_modules")
        .join(SDK_PACKAGE)
        .join("package.json");

    let content = match std::fs::read_to_string(&path) {
        Ok(c) => c,
        Err(e) => return VersionCheck::Unknown(format!("{}: {e}", path.display())),
    };
    let package: PackageJson = match serde_json::from_str(&content) {
        Ok(p) => p,
        Err(e) => return VersionCheck::Unknown(format!("{}: {e}", path.display())),
    };
    let installed = match Version::parse(package.version.trim()) {
        Ok(v) => v,
        Err(e) => return VersionCheck::Unknown(format!("{:?}: {e}", package.version)),
    };
    let minimum = match Version::parse(MIN_SDK_VERSION) {
        Ok(v) => v,
        Err(e) => return VersionCheck::Unknown(e.to_string()),
    };

    if installed < minimum {
        VersionCheck::Outdated { installed, minimum }
    } else {
        VersionCheck::Supported(installed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project_with(version: &str) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let pkg = dir.path().join("node_modules").join(SDK_PACKAGE);
        std::fs::create_dir_all(&pkg).unwrap();
        std::fs::write(
            pkg.join("package.json"),
            format!(r#"{{"name":"{SDK_PACKAGE}","version":"{version}"}}"#),
        )
        .unwrap();
        dir
    }

    #[test]
    fn supported_version() {
        let dir = project_with("6.11.3");
        let check = check_sdk_version(dir.path());
        assert_eq!(check, VersionCheck::Supported(Version::new(6, 11, 3)));
        assert!(check.warning().is_none());
    }

    #[test]
    fn outdated_version_warns() {
        let dir = project_with("5.1.0");
        let check = check_sdk_version(dir.path());
        assert!(matches!(check, VersionCheck::Outdated { .. }));
        assert!(check.warning().unwrap().contains("5.1.0"));
    }

    #[test]
    fn missing_package_is_unknown() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            check_sdk_version(dir.path()),
            VersionCheck::Unknown(_)
        ));
    }

    #[test]
    fn garbage_version_is_unknown() {
        let dir = project_with("latest");
        assert!(matches!(
            check_sdk_version(dir.path()),
            VersionCheck::Unknown(_)
        ));
    }
}
