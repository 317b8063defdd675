//! File-system resource helpers.
use anyhow::{Context as _, Result};
use std::path::Path;

/// Suffix of the sibling file used to stage atomic writes.
const TMP_SUFFIX: &str = ".dotdex-tmp";

/// Ensure the parent directory of `path` exists, creating it (and any
/// ancestors) if necessary.
///
/// # Errors
///
/// Returns an error if the directory cannot be created.
pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create parent: {}", parent.display()))?;
    }
    Ok(())
}

/// Remove an existing file or symlink at `path`, including broken symlinks.
///
/// Does nothing if `path` does not exist.
///
/// # Errors
///
/// Returns an error if the path exists but cannot be removed.
pub fn remove_existing(path: &Path) -> Result<()> {
    if path.exists() || path.symlink_metadata().is_ok() {
        std::fs::remove_file(path)
            .with_context(|| format!("remove existing: {}", path.display()))?;
    }
    Ok(())
}

/// Sibling path used to stage a write to `path`.
fn staging_path(path: &Path) -> std::path::PathBuf {
    let name = path
        .file_name()
        .map_or_else(|| "file".into(), |n| n.to_string_lossy().into_owned());
    path.with_file_name(format!(".{name}{TMP_SUFFIX}"))
}

/// Copy `source` over `target` without a window where `target` is half written.
///
/// The content (and permissions) are staged into a sibling temp file which
/// is then renamed over the target.  A symlink at `target` is replaced by a
/// regular file.
///
/// # Errors
///
/// Returns an error if the copy or rename fails; the temp file is cleaned up.
pub fn copy_atomic(source: &Path, target: &Path) -> Result<()> {
    ensure_parent_dir(target)?;
    let tmp = staging_path(target);
    std::fs::copy(source, &tmp)
        .with_context(|| format!("copy {} to {}", source.display(), tmp.display()))?;
    if let Err(e) = std::fs::rename(&tmp, target) {
        let _ = std::fs::remove_file(&tmp);
        return Err(e).with_context(|| format!("rename {} to {}", tmp.display(), target.display()));
    }
    Ok(())
}

/// Write `contents` to `path` via a staged sibling file and rename.
///
/// # Errors
///
/// Returns an error if the write or rename fails.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    ensure_parent_dir(path)?;
    let tmp = staging_path(path);
    std::fs::write(&tmp, contents).with_context(|| format!("write {}", tmp.display()))?;
    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(e).with_context(|| format!("rename {} to {}", tmp.display(), path.display()));
    }
    Ok(())
}

/// Remove empty directories from `start` upwards, stopping at `root`.
///
/// `root` itself is never removed, nor is anything outside it.
///
/// # Errors
///
/// Returns an error if an empty directory cannot be removed.
pub fn prune_empty_dirs(start: &Path, root: &Path) -> Result<()> {
    let mut current = start;
    while current != root && current.starts_with(root) {
        let is_empty = std::fs::read_dir(current).map_or(false, |mut it| it.next().is_none());
        if !is_empty {
            break;
        }
        std::fs::remove_dir(current)
            .with_context(|| format!("remove empty directory {}", current.display()))?;
        match current.parent() {
            Some(parent) => current = parent,
            None => break,
        }
    }
    Ok(())
}
