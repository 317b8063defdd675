//! Change detection: hash both sides of every tracked file and classify it
//! against the snapshot.
use std::collections::BTreeSet;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{Context as _, Result};
use sha2::{Digest as _, Sha256};
use walkdir::WalkDir;

use crate::config::{Config, ExcludeSet};
use crate::snapshot::Snapshot;

/// SHA-256 hex digest of a file's content.
pub type Digest = String;

/// Hash the file at `path`.  Returns `None` if nothing exists there.
///
/// # Errors
///
/// Returns an error if the path is a directory or cannot be read.
pub fn hash_file(path: &Path) -> Result<Option<Digest>> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e).with_context(|| format!("opening {}", path.display())),
    };
    if file
        .metadata()
        .with_context(|| format!("reading metadata of {}", path.display()))?
        .is_dir()
    {
        anyhow::bail!("expected a file but found a directory: {}", path.display());
    }
    let mut hasher = Sha256::new();
    std::io::copy(&mut BufReader::new(file), &mut hasher)
        .with_context(|| format!("reading {}", path.display()))?;
    Ok(Some(format!("{:x}", hasher.finalize())))
}

/// How a tracked file differs between home, repository and snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    /// Both sides hold the same content (or neither has the file).
    Unchanged,
    /// Only the home copy moved away from the snapshot.
    LocalChanged,
    /// Only the repository copy moved away from the snapshot.
    RepoChanged,
    /// Both copies moved away from the snapshot and disagree.
    Conflict,
}

/// Digests of one tracked file on each side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChange {
    /// Home-relative path using `/` separators.
    pub path: String,
    /// Digest of the home copy.
    pub local: Option<Digest>,
    /// Digest of the repository copy.
    pub repo: Option<Digest>,
    /// Digest recorded in the snapshot.
    pub base: Option<Digest>,
}

impl FileChange {
    /// Classify this file.
    ///
    /// # Examples
    ///
    /// ```
    /// use dotdex_cli::detect::{ChangeKind, FileChange};
    ///
    /// let change = FileChange {
    ///     path: ".bashrc".into(),
    ///     local: Some("new".into()),
    ///     repo: Some("old".into()),
    ///     base: Some("old".into()),
    /// };
    /// assert_eq!(change.kind(), ChangeKind::LocalChanged);
    /// ```
    #[must_use]
    pub fn kind(&self) -> ChangeKind {
        if self.local == self.repo {
            return ChangeKind::Unchanged;
        }
        match (self.local != self.base, self.repo != self.base) {
            (true, false) => ChangeKind::LocalChanged,
            (false, true) => ChangeKind::RepoChanged,
            _ => ChangeKind::Conflict,
        }
    }

    /// Short human description, e.g. `"modified locally"`.
    #[must_use]
    pub fn describe(&self) -> &'static str {
        match self.kind() {
            ChangeKind::Unchanged => "unchanged",
            ChangeKind::LocalChanged if self.local.is_none() => "deleted locally",
            ChangeKind::LocalChanged if self.repo.is_none() => "added locally",
            ChangeKind::LocalChanged => "modified locally",
            ChangeKind::RepoChanged if self.repo.is_none() => "deleted in repo",
            ChangeKind::RepoChanged if self.local.is_none() => "added in repo",
            ChangeKind::RepoChanged => "modified in repo",
            ChangeKind::Conflict => "changed on both sides",
        }
    }
}

/// Classification of every tracked file.
#[derive(Debug, Clone, Default)]
pub struct ChangeSet {
    /// One entry per tracked file, sorted by path.
    pub changes: Vec<FileChange>,
}

impl ChangeSet {
    /// Iterate over the files of the given kind.
    pub fn of_kind(&self, kind: ChangeKind) -> impl Iterator<Item = &FileChange> {
        self.changes.iter().filter(move |c| c.kind() == kind)
    }

    /// Number of files of the given kind.
    #[must_use]
    pub fn count(&self, kind: ChangeKind) -> usize {
        self.of_kind(kind).count()
    }

    /// Paths of all conflicting files.
    #[must_use]
    pub fn conflicts(&self) -> Vec<String> {
        self.of_kind(ChangeKind::Conflict)
            .map(|c| c.path.clone())
            .collect()
    }

    /// Whether every file is unchanged.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.changes
            .iter()
            .all(|c| c.kind() == ChangeKind::Unchanged)
    }
}

/// List every tracked file present on either side, minus exclusions.
///
/// Tracked directories are walked recursively (symlinks are not followed
/// into, but symlinked files count as files).  The result is sorted and
/// free of duplicates.
///
/// # Errors
///
/// Returns an error if a directory cannot be walked.
pub fn tracked_files(config: &Config, home: &Path, repo: &Path) -> Result<Vec<String>> {
    let mut found = BTreeSet::new();
    for entry in &config.files {
        for root in [home, repo] {
            collect(root, entry, &config.exclude, &mut found)?;
        }
    }
    Ok(found.into_iter().collect())
}

fn collect(
    root: &Path,
    entry: &str,
    exclude: &ExcludeSet,
    found: &mut BTreeSet<String>,
) -> Result<()> {
    let start = root.join(entry);
    if start.is_dir() {
        let walker = WalkDir::new(&start)
            .follow_links(false)
            .into_iter()
            .filter_entry(|e| e.file_name() != ".git");
        for item in walker {
            let item = item.with_context(|| format!("walking {}", start.display()))?;
            if !item.path().is_file() {
                continue;
            }
            let Ok(rel) = item.path().strip_prefix(root) else {
                continue;
            };
            if !exclude.is_excluded(rel) {
                found.insert(to_slash(rel));
            }
        }
    } else if start.is_file() && !exclude.is_excluded(Path::new(entry)) {
        found.insert(entry.to_string());
    }
    Ok(())
}

/// Render a relative path with `/` separators on every platform.
fn to_slash(rel: &Path) -> String {
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Classify every tracked file.
///
/// # Errors
///
/// Returns an error if a tracked file cannot be read or hashed.
pub fn detect(config: &Config, home: &Path, repo: &Path, snapshot: &Snapshot) -> Result<ChangeSet> {
    let changes = tracked_files(config, home, repo)?
        .into_iter()
        .map(|path| -> Result<FileChange> {
            Ok(FileChange {
                local: hash_file(&home.join(&path))?,
                repo: hash_file(&repo.join(&path))?,
                base: snapshot.base(&path).map(String::from),
                path,
            })
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(ChangeSet { changes })
}
