//! Synchronized file resource: make `target` hold the same content as `source`.
use anyhow::{Context as _, Result};
use std::path::{Path, PathBuf};

use super::helpers::fs::{copy_atomic, prune_empty_dirs, remove_existing};
use super::{Applicable, Resource, ResourceChange, ResourceState};
use crate::detect::hash_file;

/// Suffix appended to a home file saved before it is overwritten.
pub const BACKUP_SUFFIX: &str = ".dotdex-backup";

/// One tracked file copied from one side of a sync to the other.
///
/// An absent `source` means the file was deleted on the winning side, so
/// applying removes `target` and prunes directories left empty below
/// `target_root`.
#[derive(Debug, Clone)]
pub struct SyncFile {
    /// Home-relative path, used in descriptions.
    pub rel: String,
    /// Copy that wins.
    pub source: PathBuf,
    /// Copy that is overwritten.
    pub target: PathBuf,
    /// Directory that `target` lives under (home or repository worktree).
    pub target_root: PathBuf,
    /// Save an existing `target` as `<target>.dotdex-backup` first.
    pub backup: bool,
}

impl SyncFile {
    /// Create a resource copying `source_root/rel` to `target_root/rel`.
    #[must_use]
    pub fn new(rel: &str, source_root: &Path, target_root: &Path) -> Self {
        Self {
            rel: rel.to_string(),
            source: source_root.join(rel),
            target: target_root.join(rel),
            target_root: target_root.to_path_buf(),
            backup: false,
        }
    }

    /// Keep a backup of the overwritten target.
    #[must_use]
    pub const fn with_backup(mut self, backup: bool) -> Self {
        self.backup = backup;
        self
    }

    /// Path the backup of `target` is written to.
    #[must_use]
    pub fn backup_path(&self) -> PathBuf {
        let mut name = self.target.as_os_str().to_owned();
        name.push(BACKUP_SUFFIX);
        PathBuf::from(name)
    }

    fn write_backup(&self) -> Result<()> {
        if !self.backup || !self.target.is_file() {
            return Ok(());
        }
        let backup = self.backup_path();
        copy_atomic(&self.target, &backup)
            .with_context(|| format!("back up {}", self.target.display()))
    }

    fn source_deleted(&self) -> bool {
        self.source.symlink_metadata().is_err()
    }
}

impl Applicable for SyncFile {
    fn description(&self) -> String {
        if self.source_deleted() {
            format!("{} (delete {})", self.rel, self.target.display())
        } else {
            format!("{} -> {}", self.rel, self.target.display())
        }
    }

    fn apply(&self) -> Result<ResourceChange> {
        if self.source_deleted() {
            if self.target.symlink_metadata().is_err() {
                return Ok(ResourceChange::AlreadyCorrect);
            }
            self.write_backup()?;
            remove_existing(&self.target)?;
            if let Some(parent) = self.target.parent() {
                prune_empty_dirs(parent, &self.target_root)?;
            }
            return Ok(ResourceChange::Applied);
        }

        if self.source.is_dir() {
            return Ok(ResourceChange::Skipped {
                reason: "source is a directory".to_string(),
            });
        }

        self.write_backup()?;
        copy_atomic(&self.source, &self.target)?;
        Ok(ResourceChange::Applied)
    }
}

impl Resource for SyncFile {
    fn current_state(&self) -> Result<ResourceState> {
        if self.source.is_dir() {
            return Ok(ResourceState::Invalid {
                reason: format!("source is a directory: {}", self.source.display()),
            });
        }
        if self.target.is_dir() {
            return Ok(ResourceState::Invalid {
                reason: format!("target is a directory: {}", self.target.display()),
            });
        }

        let source = hash_file(&self.source)?;
        let target = hash_file(&self.target)?;
        Ok(match (source, target) {
            (None, None) => ResourceState::Correct,
            (Some(_), None) => ResourceState::Missing,
            (None, Some(_)) => ResourceState::Incorrect {
                current: "deleted at source".to_string(),
            },
            (Some(s), Some(t)) if s == t => ResourceState::Correct,
            (Some(_), Some(_)) => ResourceState::Incorrect {
                current: "content differs".to_string(),
            },
        })
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::fs;

    fn roots() -> (tempfile::TempDir, tempfile::TempDir) {
        (tempfile::tempdir().unwrap(), tempfile::tempdir().unwrap())
    }

    #[test]
    fn missing_target_is_missing_then_applied() {
        let (src, dst) = roots();
        fs::create_dir_all(src.path().join(".config/fish")).unwrap();
        fs::write(src.path().join(".config/fish/config.fish"), "set -x A 1").unwrap();

        let file = SyncFile::new(".config/fish/config.fish", src.path(), dst.path());
        assert_eq!(file.current_state().unwrap(), ResourceState::Missing);
        assert_eq!(file.apply().unwrap(), ResourceChange::Applied);
        assert_eq!(file.current_state().unwrap(), ResourceState::Correct);
        assert_eq!(
            fs::read_to_string(dst.path().join(".config/fish/config.fish")).unwrap(),
            "set -x A 1"
        );
    }

    #[test]
    fn differing_content_is_incorrect() {
        let (src, dst) = roots();
        fs::write(src.path().join(".bashrc"), "new").unwrap();
        fs::write(dst.path().join(".bashrc"), "old").unwrap();

        let file = SyncFile::new(".bashrc", src.path(), dst.path());
        assert_eq!(
            file.current_state().unwrap(),
            ResourceState::Incorrect {
                current: "content differs".to_string()
            }
        );
    }

    #[test]
    fn both_absent_is_correct() {
        let (src, dst) = roots();
        let file = SyncFile::new(".nothing", src.path(), dst.path());
        assert_eq!(file.current_state().unwrap(), ResourceState::Correct);
        assert_eq!(file.apply().unwrap(), ResourceChange::AlreadyCorrect);
    }

    #[test]
    fn deleted_source_removes_target_and_prunes_dirs() {
        let (src, dst) = roots();
        fs::create_dir_all(dst.path().join(".config/old")).unwrap();
        fs::write(dst.path().join(".config/old/rc"), "x").unwrap();

        let file = SyncFile::new(".config/old/rc", src.path(), dst.path());
        assert_eq!(
            file.current_state().unwrap(),
            ResourceState::Incorrect {
                current: "deleted at source".to_string()
            }
        );
        assert!(file.description().contains("delete"));
        assert_eq!(file.apply().unwrap(), ResourceChange::Applied);
        assert!(!dst.path().join(".config").exists());
        assert!(dst.path().exists());
    }

    #[test]
    fn backup_keeps_previous_target() {
        let (src, dst) = roots();
        fs::write(src.path().join(".vimrc"), "theirs").unwrap();
        fs::write(dst.path().join(".vimrc"), "mine").unwrap();

        let file = SyncFile::new(".vimrc", src.path(), dst.path()).with_backup(true);
        file.apply().unwrap();
        assert_eq!(fs::read_to_string(dst.path().join(".vimrc")).unwrap(), "theirs");
        assert_eq!(fs::read_to_string(file.backup_path()).unwrap(), "mine");
        assert!(
            file.backup_path()
                .to_string_lossy()
                .ends_with(".vimrc.dotdex-backup")
        );
    }

    #[test]
    fn directory_source_is_invalid() {
        let (src, dst) = roots();
        fs::create_dir_all(src.path().join(".vim")).unwrap();
        let file = SyncFile::new(".vim", src.path(), dst.path());
        assert!(matches!(
            file.current_state().unwrap(),
            ResourceState::Invalid { .. }
        ));
        assert!(matches!(
            file.apply().unwrap(),
            ResourceChange::Skipped { .. }
        ));
    }
}
