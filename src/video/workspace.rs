use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::foundation::error::OvermarkResult;

const PREFIX: &str = "overmark-job-";

/// Private scratch directory of one video job, removed when dropped.
#[derive(Debug)]
pub struct JobWorkspace {
    dir: tempfile::TempDir,
}

impl JobWorkspace {
    /// Create a workspace under `root`, or under the system temp dir when `root` is `None`.
    pub fn create(root: Option<&Path>) -> OvermarkResult<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(PREFIX);
        let dir = match root {
            Some(root) => {
                std::fs::create_dir_all(root)
                    .with_context(|| format!("create scratch root '{}'", root.display()))?;
                builder.tempdir_in(root)
            }
            None => builder.tempdir(),
        }
        .context("create job workspace")?;
        tracing::debug!(dir = %dir.path().display(), "job workspace created");
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn file(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Write `bytes` to `name` inside the workspace and return the full path.
    pub async fn write(&self, name: &str, bytes: &[u8]) -> OvermarkResult<PathBuf> {
        let path = self.file(name);
        tokio::fs::write(&path, bytes)
            .await
            .with_context(|| format!("write '{}'", path.display()))?;
        Ok(path)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/video/workspace.rs"]
mod tests;
