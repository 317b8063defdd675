//! Repository kept in a plain directory on this machine.
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};

use super::{Backend, Direction};
use crate::error::RepositoryError;
use crate::logging::Log;

/// A directory used directly as the repository worktree.
#[derive(Debug, Clone)]
pub struct DirectoryBackend {
    path: PathBuf,
}

impl DirectoryBackend {
    /// Create a backend rooted at `path`.
    #[must_use]
    pub const fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl Backend for DirectoryBackend {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn worktree(&self) -> &Path {
        &self.path
    }

    fn is_remote(&self) -> bool {
        false
    }

    fn prepare(&self, direction: Direction, dry_run: bool, log: &dyn Log) -> Result<()> {
        if self.path.is_dir() {
            log.debug(&format!("using repository directory {}", self.path.display()));
            return Ok(());
        }
        match direction {
            Direction::Pull => Err(RepositoryError::Missing(self.path.display().to_string()).into()),
            Direction::Push if dry_run => {
                log.dry_run(&format!("would create {}", self.path.display()));
                Ok(())
            }
            Direction::Push => {
                std::fs::create_dir_all(&self.path)
                    .with_context(|| format!("create repository {}", self.path.display()))?;
                log.info(&format!("created {}", self.path.display()));
                Ok(())
            }
        }
    }

    fn publish(&self, _message: &str, _log: &dyn Log) -> Result<bool> {
        Ok(false)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::logging::Logger;

    #[test]
    fn push_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store");
        let backend = DirectoryBackend::new(path.clone());
        backend
            .prepare(Direction::Push, false, &Logger::new(None))
            .unwrap();
        assert!(path.is_dir());
    }

    #[test]
    fn dry_run_push_leaves_directory_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store");
        let backend = DirectoryBackend::new(path.clone());
        backend
            .prepare(Direction::Push, true, &Logger::new(None))
            .unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn pull_from_missing_directory_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let backend = DirectoryBackend::new(dir.path().join("store"));
        let err = backend
            .prepare(Direction::Pull, false, &Logger::new(None))
            .unwrap_err();
        assert!(
            matches!(
                err.downcast_ref::<RepositoryError>(),
                Some(RepositoryError::Missing(_))
            ),
            "unexpected error: {err:#}"
        );
    }

    #[test]
    fn publish_is_noop() {
        let backend = DirectoryBackend::new(PathBuf::from("/srv"));
        assert!(!backend.publish("msg", &Logger::new(None)).unwrap());
    }
}
