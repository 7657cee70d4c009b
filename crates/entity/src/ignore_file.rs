//! Project ignore file (`.dclignore`) handling.
//!
//! Patterns use gitignore semantics via the `ignore` crate. The ignore
//! file itself and the reserved entity manifest name are always excluded,
//! whatever the file says.

use std::path::{Path, PathBuf};

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use tracing::{debug, info};

use scenedeploy_protocol::constants::{ENTITY_FILE_NAME, IGNORE_FILE_NAME};

use crate::error::ScanError;

/// Patterns written to a project that has no ignore file yet.
pub const DEFAULT_IGNORE_PATTERNS: &[&str] = &[
    ".*",
    "package.json",
    "package-lock.json",
    "yarn-lock.json",
    "build.json",
    "export",
    "tsconfig.json",
    "tslint.json",
    "node_modules",
    "*.ts",
    "*.tsx",
    "Dockerfile",
    "dist",
    "README.md",
    "*.blend",
    "*.fbx",
    "*.zip",
    "*.rar",
];

/// Writes the default ignore file when the project has none.
///
/// Returns `true` if a file was created.
pub fn ensure_ignore_file(project_dir: &Path) -> Result<bool, ScanError> {
    let path = project_dir.join(IGNORE_FILE_NAME);
    if path.exists() {
        return Ok(false);
    }
    let mut content = DEFAULT_IGNORE_PATTERNS.join("\n");
    content.push('\n');
    std::fs::write(&path, content)?;
    info!(path = %path.display(), "created default ignore file");
    Ok(true)
}

/// Compiled ignore patterns for one project.
#[derive(Debug)]
pub struct IgnoreList {
    matcher: Gitignore,
    pattern_count: usize,
}

impl IgnoreList {
    /// Loads `.dclignore` from `project_dir`. A missing file yields only
    /// the always-excluded entries.
    pub fn load(project_dir: &Path) -> Result<Self, ScanError> {
        let path = project_dir.join(IGNORE_FILE_NAME);
        let content = if path.exists() {
            std::fs::read_to_string(&path)?
        } else {
            String::new()
        };
        Self::from_content(project_dir, &path, &content)
    }

    /// Compiles `content` as if read from `source` inside `root`.
    pub fn from_content(root: &Path, source: &Path, content: &str) -> Result<Self, ScanError> {
        let mut builder = GitignoreBuilder::new(root);
        let mut pattern_count = 0;

        let always = [IGNORE_FILE_NAME, ENTITY_FILE_NAME];
        let lines = content.lines().map(str::trim).chain(always);

        for line in lines {
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            builder
                .add_line(Some(PathBuf::from(source)), line)
                .map_err(|e| ScanError::Pattern {
                    path: source.to_path_buf(),
                    message: e.to_string(),
                })?;
            pattern_count += 1;
        }

        let matcher = builder.build().map_err(|e| ScanError::Pattern {
            path: source.to_path_buf(),
            message: e.to_string(),
        })?;
        debug!(patterns = pattern_count, "ignore list compiled");

        Ok(Self {
            matcher,
            pattern_count,
        })
    }

    /// Whether `rel_path` (relative to the project root) is excluded.
    pub fn is_ignored(&self, rel_path: &Path, is_dir: bool) -> bool {
        self.matcher.matched(rel_path, is_dir).is_ignore()
    }

    pub fn pattern_count(&self) -> usize {
        self.pattern_count
    }
}
