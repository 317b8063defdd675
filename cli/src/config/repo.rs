//! Repository location parsing.
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Where synchronized files are stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepoLocation {
    /// A plain directory on this machine.
    Directory(PathBuf),
    /// A git remote, cloned into the cache directory.
    Git {
        /// Remote URL as configured.
        url: String,
    },
}

impl RepoLocation {
    /// Parse a `repo` value.
    ///
    /// URLs with a scheme (`https://`, `ssh://`, `file://`) and scp-like
    /// remotes (`git@host:path`) are git remotes.  Everything else is a
    /// directory: `~` expands to `home`, relative paths resolve against
    /// `base_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the value is empty.
    pub fn parse(raw: &str, base_dir: &Path, home: &Path) -> Result<Self, ConfigError> {
        let value = raw.trim();
        if value.is_empty() {
            return Err(ConfigError::Invalid("repo must not be empty".to_string()));
        }

        if value.contains("://") || is_scp_like(value) {
            return Ok(Self::Git {
                url: value.to_string(),
            });
        }

        let path = if value == "~" {
            home.to_path_buf()
        } else if let Some(rest) = value.strip_prefix("~/") {
            home.join(rest)
        } else {
            let p = PathBuf::from(value);
            if p.is_absolute() { p } else { base_dir.join(p) }
        };
        Ok(Self::Directory(path))
    }

    /// Whether this location is a git remote.
    #[must_use]
    pub const fn is_remote(&self) -> bool {
        matches!(self, Self::Git { .. })
    }

    /// A file-name-safe identifier for this location, used to key cache entries.
    #[must_use]
    pub fn key(&self) -> String {
        let source = match self {
            Self::Directory(path) => path.display().to_string(),
            Self::Git { url } => url.clone(),
        };
        let mut key = String::with_capacity(source.len());
        for c in source.chars() {
            if c.is_ascii_alphanumeric() || c == '.' || c == '_' {
                key.push(c);
            } else if !key.ends_with('-') {
                key.push('-');
            }
        }
        let key = key.trim_matches('-');
        if key.is_empty() {
            "repo".to_string()
        } else {
            key.to_string()
        }
    }
}

/// `user@host:path` with no slash before the colon.
fn is_scp_like(value: &str) -> bool {
    let Some((head, _)) = value.split_once(':') else {
        return false;
    };
    head.contains('@') && !head.contains('/')
}
