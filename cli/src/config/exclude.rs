//! Exclusion patterns applied to home-relative paths.
use std::path::Path;

use crate::error::ConfigError;
use crate::resources::file::BACKUP_SUFFIX;

/// Compiled `exclude` patterns.
///
/// A path is excluded when the path itself or any of its ancestors matches
/// one of the patterns, so `".config/nvim/plugin"` excludes everything below
/// it.  Any `.git` component is always excluded, and so is any file left
/// behind by a pull as a conflict backup (`*.dotdex-backup`).
#[derive(Debug, Clone, Default)]
pub struct ExcludeSet {
    patterns: Vec<glob::Pattern>,
}

impl ExcludeSet {
    /// Compile the given glob patterns.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for a pattern that is not a valid glob.
    pub fn new(patterns: &[String]) -> Result<Self, ConfigError> {
        let patterns = patterns
            .iter()
            .map(|p| {
                let p = p.trim().trim_end_matches('/');
                glob::Pattern::new(p).map_err(|e| {
                    ConfigError::Invalid(format!("bad exclude pattern '{p}': {}", e.msg))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    /// Whether no patterns are configured.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Iterate over the pattern sources.
    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.patterns.iter().map(glob::Pattern::as_str)
    }

    /// Whether `rel` (a home-relative path) is excluded.
    #[must_use]
    pub fn is_excluded(&self, rel: &Path) -> bool {
        if rel.components().any(|c| c.as_os_str() == ".git") {
            return true;
        }
        if rel
            .file_name()
            .is_some_and(|name| name.to_string_lossy().ends_with(BACKUP_SUFFIX))
        {
            return true;
        }
        rel.ancestors()
            .filter(|a| !a.as_os_str().is_empty())
            .any(|a| self.patterns.iter().any(|p| p.matches_path(a)))
    }
}
