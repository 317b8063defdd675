use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::{Config, ConflictStrategy};
use crate::logging::Log;
use crate::repository::{Backend, Direction};

/// Shared context for task execution.
pub struct Context {
    /// Configuration loaded from the `dotdex` file.
    pub config: Arc<Config>,
    /// Logger for output and task recording.
    pub log: Arc<dyn Log>,
    /// Whether to perform a dry run (preview changes without applying).
    pub dry_run: bool,
    /// User's home directory path.
    pub home: PathBuf,
    /// Repository the files are synchronized with.
    pub backend: Arc<dyn Backend>,
    /// Where the last-synced digests are stored.
    pub snapshot_path: PathBuf,
    /// Let the command's source side win every conflict.
    pub force: bool,
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("config", &self.config.path)
            .field("log", &"<dyn Log>")
            .field("dry_run", &self.dry_run)
            .field("home", &self.home)
            .field("backend", &self.backend)
            .field("snapshot_path", &self.snapshot_path)
            .field("force", &self.force)
            .finish()
    }
}

impl Context {
    /// Directory holding the repository copies of tracked files.
    #[must_use]
    pub fn repo_root(&self) -> &Path {
        self.backend.worktree()
    }

    /// The conflict policy in effect for a transfer in `direction`.
    ///
    /// `--force` overrides the configured policy so that the side being
    /// copied from wins.
    #[must_use]
    pub fn conflict_strategy(&self, direction: Direction) -> ConflictStrategy {
        if !self.force {
            return self.config.on_conflict;
        }
        match direction {
            Direction::Push => ConflictStrategy::Local,
            Direction::Pull => ConflictStrategy::Repo,
        }
    }
}
