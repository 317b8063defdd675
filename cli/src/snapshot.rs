//! Per-machine record of the file digests last known to match on both sides.
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use serde::{Deserialize, Serialize};

use crate::config::RepoLocation;
use crate::error::SyncError;
use crate::resources::helpers::fs::write_atomic;

/// Digests recorded after the last successful sync.
///
/// # Examples
///
/// ```
/// use dotdex_cli::snapshot::Snapshot;
///
/// let mut snap = Snapshot::default();
/// snap.record(".bashrc", Some("abc123".to_string()));
/// assert_eq!(snap.base(".bashrc"), Some("abc123"));
/// snap.record(".bashrc", None);
/// assert_eq!(snap.base(".bashrc"), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// The repository this snapshot belongs to.
    #[serde(default)]
    pub repo: String,
    /// RFC 3339 time the snapshot was written.
    #[serde(default)]
    pub recorded_at: Option<String>,
    /// Home-relative path to SHA-256 hex digest.
    #[serde(default)]
    pub files: BTreeMap<String, String>,
}

impl Snapshot {
    /// Location of the snapshot for `repo` under the cache directory.
    #[must_use]
    pub fn path_for(cache_dir: &Path, repo: &RepoLocation) -> PathBuf {
        cache_dir
            .join("snapshots")
            .join(format!("{}.json", repo.key()))
    }

    /// Load a snapshot; a missing file is an empty snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::CorruptSnapshot`] if the file exists but is not
    /// a valid snapshot, or an I/O error if it cannot be read.
    pub fn load(path: &Path) -> Result<Self> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => {
                return Err(e).with_context(|| format!("reading snapshot {}", path.display()));
            }
        };
        serde_json::from_str(&content).map_err(|e| {
            SyncError::CorruptSnapshot {
                path: path.display().to_string(),
                message: e.to_string(),
            }
            .into()
        })
    }

    /// Write the snapshot atomically, stamping `recorded_at`.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn save(&mut self, path: &Path) -> Result<()> {
        self.recorded_at = Some(chrono::Utc::now().to_rfc3339());
        let json = serde_json::to_string_pretty(self).context("serializing snapshot")?;
        write_atomic(path, json.as_bytes())
            .with_context(|| format!("writing snapshot {}", path.display()))
    }

    /// The recorded digest for `rel`, if any.
    #[must_use]
    pub fn base(&self, rel: &str) -> Option<&str> {
        self.files.get(rel).map(String::as_str)
    }

    /// Record (or forget, for `None`) the digest for `rel`.
    pub fn record(&mut self, rel: &str, digest: Option<String>) {
        match digest {
            Some(d) => {
                self.files.insert(rel.to_string(), d);
            }
            None => {
                self.files.remove(rel);
            }
        }
    }
}
