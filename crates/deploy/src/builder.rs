//! Project compilation before packaging.

use std::future::Future;
use std::path::Path;
use std::pin::Pin;

use tokio::process::Command;
use tracing::{debug, info};

use crate::error::BuildError;

/// Compiles a project in place.
pub trait ProjectBuilder: Send + Sync {
    /// Checks that `project_dir` is a project this builder understands.
    /// Runs even when compilation is skipped.
    fn check(&self, project_dir: &Path) -> Result<(), BuildError>;

    fn compile<'a>(
        &'a self,
        project_dir: &'a Path,
    ) -> Pin<Box<dyn Future<Output = Result<(), BuildError>> + Send + 'a>>;
}

/// Builds TypeScript projects with `npm run build`.
pub struct NpmBuilder {
    program: String,
    args: Vec<String>,
}

impl Default for NpmBuilder {
    fn default() -> Self {
        let program = if cfg!(windows) { "npm.cmd" } else { "npm" };
        Self::with_command(program, ["run", "build"])
    }
}

impl NpmBuilder {
    /// Runs `program args..` instead of `npm run build`.
    pub fn with_command<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}

impl ProjectBuilder for NpmBuilder {
    fn check(&self, project_dir: &Path) -> Result<(), BuildError> {
        if project_dir.join("tsconfig.json").is_file() {
            Ok(())
        } else {
            Err(BuildError::NotTypescript(project_dir.to_path_buf()))
        }
    }

    fn compile<'a>(
        &'a self,
        project_dir: &'a Path,
    ) -> Pin<Box<dyn Future<Output = Result<(), BuildError>> + Send + 'a>> {
        Box::pin(async move {
            info!(dir = %project_dir.display(), program = %self.program, "building project");
            let output = Command::new(&self.program)
                .args(&self.args)
                .current_dir(project_dir)
                .kill_on_drop(true)
                .output()
                .await
                .map_err(|source| BuildError::Spawn {
                    program: self.program.clone(),
                    source,
                })?;

            if output.status.success() {
                debug!("build finished");
                return Ok(());
            }
            Err(BuildError::Failed {
                status: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_requires_tsconfig() {
        let dir = tempfile::tempdir().unwrap();
        let builder = NpmBuilder::default();
        assert!(matches!(
            builder.check(dir.path()),
            Err(BuildError::NotTypescript(_))
        ));

        std::fs::write(dir.path().join("tsconfig.json"), "{}").unwrap();
        builder.check(dir.path()).unwrap();
    }

    #[tokio::test]
    async fn missing_program_is_spawn_error() {
        let dir = tempfile::tempdir().unwrap();
        let builder = NpmBuilder::with_command("scenedeploy-no-such-program", ["build"]);
        let err = builder.compile(dir.path()).await.unwrap_err();
        assert!(matches!(err, BuildError::Spawn { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failing_build_reports_status_and_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let builder = NpmBuilder::with_command("sh", ["-c", "echo broken >&2; exit 3"]);
        match builder.compile(dir.path()).await.unwrap_err() {
            BuildError::Failed { status, stderr } => {
                assert_eq!(status, Some(3));
                assert_eq!(stderr, "broken");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn successful_build() {
        let dir = tempfile::tempdir().unwrap();
        let builder = NpmBuilder::with_command("sh", ["-c", "true"]);
        builder.compile(dir.path()).await.unwrap();
    }
}
