//! Domain-specific error types for the sync engine.
//!
//! Internal modules return typed errors (e.g., [`ConfigError`],
//! [`SyncError`]) while tasks and command handlers convert them to
//! [`anyhow::Error`] via the standard `?` operator.
//!
//! # Error hierarchy
//!
//! ```text
//! ConfigError      config file lookup, TOML parsing, semantic checks
//! SyncError        snapshot corruption, unresolved conflicts, skipped tasks
//! RepositoryError  repository backends (directory, git)
//! ```

use thiserror::Error;

/// Errors that arise from loading the configuration file.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file does not exist.
    #[error("configuration file not found: {path}")]
    NotFound {
        /// Path that was looked up.
        path: String,
    },

    /// The configuration file is not valid TOML or has fields of the wrong type.
    #[error("failed to parse {path}: {message}")]
    Parse {
        /// Path of the offending file.
        path: String,
        /// Parser diagnostic.
        message: String,
    },

    /// The configuration parsed but contains a value that cannot be used.
    #[error("invalid configuration: {0}")]
    Invalid(String),

    /// An I/O error occurred while reading the configuration file.
    #[error("IO error reading config file {path}: {source}")]
    Io {
        /// Path to the file that could not be read.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

/// Errors that arise while detecting or applying changes.
#[derive(Error, Debug)]
pub enum SyncError {
    /// Files changed on both sides and the conflict policy is `fail`.
    #[error("{} conflicting file(s): {}", .0.len(), .0.join(", "))]
    Conflicts(Vec<String>),

    /// The snapshot file exists but could not be decoded.
    #[error("snapshot {path} is corrupt: {message}")]
    CorruptSnapshot {
        /// Path of the snapshot file.
        path: String,
        /// Decoder diagnostic.
        message: String,
    },

    /// A task was not run because a task it depends on failed.
    #[error("dependency failed: {0}")]
    DependencyFailed(String),
}

/// Errors that arise from repository backends.
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// The configured repository directory does not exist.
    #[error("repository directory does not exist: {0}")]
    Missing(String),

    /// The local clone and the remote branch both have new commits.
    #[error("branch '{branch}' has diverged from origin in {path}")]
    Diverged {
        /// Branch being synchronized.
        branch: String,
        /// Path of the local clone.
        path: String,
    },

    /// A libgit2 operation failed.
    #[error("git {operation} failed: {source}")]
    Git {
        /// Short name of the operation (e.g. `"fetch"`).
        operation: &'static str,
        /// Underlying libgit2 error.
        source: git2::Error,
    },
}

impl RepositoryError {
    /// Build a closure mapping a [`git2::Error`] into [`RepositoryError::Git`].
    pub fn git(operation: &'static str) -> impl FnOnce(git2::Error) -> Self {
        move |source| Self::Git { operation, source }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn config_error_not_found_display() {
        let e = ConfigError::NotFound {
            path: "./dotdex".to_string(),
        };
        assert_eq!(e.to_string(), "configuration file not found: ./dotdex");
    }

    #[test]
    fn config_error_parse_display() {
        let e = ConfigError::Parse {
            path: "dotdex".to_string(),
            message: "expected `=`".to_string(),
        };
        assert_eq!(e.to_string(), "failed to parse dotdex: expected `=`");
    }

    #[test]
    fn config_error_io_has_source() {
        use std::error::Error as StdError;
        let e = ConfigError::Io {
            path: "dotdex".to_string(),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "permission denied"),
        };
        assert!(e.source().is_some());
        assert!(e.to_string().contains("IO error reading config file"));
    }

    #[test]
    fn sync_error_conflicts_lists_paths() {
        let e = SyncError::Conflicts(vec![".bashrc".to_string(), ".vimrc".to_string()]);
        assert_eq!(e.to_string(), "2 conflicting file(s): .bashrc, .vimrc");
    }

    #[test]
    fn sync_error_dependency_failed_names_task() {
        let e = SyncError::DependencyFailed("Sync repository".to_string());
        assert_eq!(e.to_string(), "dependency failed: Sync repository");
    }

    #[test]
    fn repository_error_diverged_display() {
        let e = RepositoryError::Diverged {
            branch: "main".to_string(),
            path: "/cache/repo".to_string(),
        };
        assert_eq!(
            e.to_string(),
            "branch 'main' has diverged from origin in /cache/repo"
        );
    }

    #[test]
    fn repository_error_git_helper_keeps_operation() {
        let e = RepositoryError::git("fetch")(git2::Error::from_str("network down"));
        assert!(e.to_string().starts_with("git fetch failed"));
        assert!(e.to_string().contains("network down"));
    }

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn all_error_types_are_send_sync() {
        assert_send_sync::<ConfigError>();
        assert_send_sync::<SyncError>();
        assert_send_sync::<RepositoryError>();
    }

    #[test]
    fn config_error_converts_to_anyhow() {
        let e = ConfigError::Invalid("repo is empty".to_string());
        let _anyhow_err: anyhow::Error = e.into();
    }
}
