//! Project file collection.
//!
//! Recursively walks the project directory and reads every file not
//! excluded by the ignore list. Relative paths are normalized to forward
//! slashes.

use std::path::Path;

use tracing::debug;

use crate::error::ScanError;
use crate::ignore_file::IgnoreList;
use crate::manifest::FileSet;

/// Reads all non-ignored files under `project_dir`.
pub fn collect_files(project_dir: &Path, ignore: &IgnoreList) -> Result<FileSet, ScanError> {
    let mut files = FileSet::new();
    walk_dir(project_dir, project_dir, ignore, &mut files)?;
    debug!(
        files = files.len(),
        total_bytes = files.total_size(),
        "project files collected"
    );
    Ok(files)
}

fn walk_dir(
    root: &Path,
    current: &Path,
    ignore: &IgnoreList,
    files: &mut FileSet,
) -> Result<(), ScanError> {
    for entry in std::fs::read_dir(current)? {
        let entry = entry?;
        let path = entry.path();
        let metadata = entry.metadata()?;
        let rel_path = path.strip_prefix(root).map_err(std::io::Error::other)?;

        if ignore.is_ignored(rel_path, metadata.is_dir()) {
            continue;
        }

        if metadata.is_dir() {
            walk_dir(root, &path, ignore, files)?;
        } else if metadata.is_file() {
            // Normalize to forward slashes.
            let rel_str = rel_path.to_string_lossy().replace('\\', "/");
            let content = std::fs::read(&path)?;
            files.insert(rel_str, content);
        }
    }

    Ok(())
}
