//! Git dependencies
//!
//! The repository is cloned into a temporary directory and the version is
//! read from the checked-out `pyproject.toml`.

use super::local::project_version;
use crate::domain::{Candidate, GitReference};
use crate::error::SourceError;
use std::path::Path;
use tempfile::TempDir;
use tokio::process::Command;
use tracing::debug;

/// Resolves git dependencies with the `git` executable
#[derive(Debug, Clone)]
pub struct GitResolver {
    program: String,
}

impl Default for GitResolver {
    fn default() -> Self {
        Self::new("git")
    }
}

impl GitResolver {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Version declared at `reference` (or the default branch head)
    pub async fn resolve(
        &self,
        url: &str,
        reference: Option<&GitReference>,
    ) -> Result<Candidate, SourceError> {
        let checkout = TempDir::new().map_err(SourceError::Checkout)?;
        let target = checkout.path().join("repo");
        let target_arg = target.to_string_lossy().into_owned();

        let mut clone: Vec<&str> = vec!["clone", "--quiet"];
        match reference {
            Some(GitReference::Branch(name)) | Some(GitReference::Tag(name)) => {
                clone.extend(["--depth", "1", "--branch", name.as_str()]);
            }
            Some(GitReference::Rev(_)) => {}
            None => clone.extend(["--depth", "1"]),
        }
        clone.extend([url, target_arg.as_str()]);
        self.git(&clone, None).await?;

        if let Some(GitReference::Rev(rev)) = reference {
            self.git(&["checkout", "--quiet", rev.as_str()], Some(&target)).await?;
        }

        project_version(&target)
    }

    async fn git(&self, args: &[&str], cwd: Option<&Path>) -> Result<(), SourceError> {
        debug!(program = %self.program, ?args, "running git");
        let mut command = Command::new(&self.program);
        command.args(args);
        if let Some(dir) = cwd {
            command.current_dir(dir);
        }

        let output = command
            .output()
            .await
            .map_err(|source| SourceError::GitUnavailable {
                program: self.program.clone(),
                source,
            })?;

        if output.status.success() {
            Ok(())
        } else {
            Err(SourceError::GitFailed {
                command: args.first().copied().unwrap_or_default().to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
    }
}
