//! Repository backends: where the synchronized copies of tracked files live.
//!
//! Every backend exposes a plain working directory ([`Backend::worktree`])
//! that the sync engine reads and writes like the home directory.  Remote
//! backends additionally bring that directory up to date before a sync
//! ([`Backend::prepare`]) and publish it afterwards ([`Backend::publish`]).
pub mod directory;
pub mod git;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Result, bail};

use crate::config::{Config, RepoLocation};
use crate::logging::Log;

pub use directory::DirectoryBackend;
pub use git::GitBackend;

/// Which way files flow during a sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Home directory to repository.
    Push,
    /// Repository to home directory.
    Pull,
}

impl Direction {
    /// Verb used in log messages.
    #[must_use]
    pub const fn verb(self) -> &'static str {
        match self {
            Self::Push => "push",
            Self::Pull => "pull",
        }
    }
}

/// A repository the sync engine can read from and write to.
pub trait Backend: Send + Sync + std::fmt::Debug {
    /// Human-readable description, e.g. the directory path or remote URL.
    fn describe(&self) -> String;

    /// Directory holding the repository copies of tracked files.
    fn worktree(&self) -> &Path;

    /// Whether changes must be published after files are written.
    fn is_remote(&self) -> bool;

    /// Make [`worktree`](Self::worktree) ready for a sync in `direction`.
    ///
    /// In dry-run mode nothing is written to the repository itself.
    ///
    /// # Errors
    ///
    /// Returns an error if the repository cannot be reached or is in a state
    /// the sync cannot proceed from.
    fn prepare(&self, direction: Direction, dry_run: bool, log: &dyn Log) -> Result<()>;

    /// Record and publish the current worktree content.
    ///
    /// Returns `true` if anything was published.
    ///
    /// # Errors
    ///
    /// Returns an error if committing or pushing fails.
    fn publish(&self, message: &str, log: &dyn Log) -> Result<bool>;
}

/// Open the backend for the configured repository.
///
/// # Errors
///
/// Returns an error if the repository is a git remote and no cache directory
/// is available to hold the clone.
pub fn open(config: &Config, cache_dir: Option<&Path>) -> Result<Arc<dyn Backend>> {
    match &config.repo {
        RepoLocation::Directory(path) => Ok(Arc::new(DirectoryBackend::new(path.clone()))),
        RepoLocation::Git { url } => {
            let Some(cache_dir) = cache_dir else {
                bail!("cannot determine a cache directory to clone {url} into");
            };
            let worktree = cache_dir.join("repos").join(config.repo.key());
            Ok(Arc::new(GitBackend::new(
                url.clone(),
                config.branch.clone(),
                worktree,
            )))
        }
    }
}
