//! Well-known locations: the user's home and the dotdex cache directory.
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;

/// Resolve the user's home directory.
///
/// An explicit override wins; otherwise `HOME` is used, with `USERPROFILE`
/// as the Windows fallback.
///
/// # Errors
///
/// Returns an error if no override is given and neither variable is set.
pub fn home_dir(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(home) = explicit {
        return Ok(home.to_path_buf());
    }
    std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .map(PathBuf::from)
        .map_err(|_| anyhow::anyhow!("HOME environment variable is not set"))
}

/// Return the dotdex cache directory, creating it if needed.
///
/// An explicit `--cache-dir` is used as is.  Otherwise this is
/// `$XDG_CACHE_HOME/dotdex/`, falling back to `<home>/.cache/dotdex/` where
/// `<home>` is the explicit override or the value of [`home_dir`].  Returns
/// `None` when no location can be determined or the directory cannot be
/// created.
#[must_use]
pub fn cache_dir(explicit: Option<&Path>, home: Option<&Path>) -> Option<PathBuf> {
    let xdg = std::env::var("XDG_CACHE_HOME").ok();
    cache_dir_with(explicit, xdg.as_deref(), home)
}

/// [`cache_dir`] with the `XDG_CACHE_HOME` value passed in.
fn cache_dir_with(
    explicit: Option<&Path>,
    xdg: Option<&str>,
    home: Option<&Path>,
) -> Option<PathBuf> {
    let dir = if let Some(dir) = explicit {
        dir.to_path_buf()
    } else {
        let base = match xdg {
            Some(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => home_dir(home).ok()?.join(".cache"),
        };
        base.join("dotdex")
    };
    fs::create_dir_all(&dir).ok()?;
    Some(dir)
}
