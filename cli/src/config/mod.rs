//! Configuration loading: repository location, tracked files, exclusions.
pub mod exclude;
pub mod repo;
pub mod validation;

use std::path::{Component, Path, PathBuf};

use serde::Deserialize;

use crate::error::ConfigError;

pub use exclude::ExcludeSet;
pub use repo::RepoLocation;

/// File name looked up in the current directory when no override is given.
pub const DEFAULT_CONFIG_FILE: &str = "dotdex";

/// Environment variable that overrides the configuration file location.
pub const CONFIG_ENV_VAR: &str = "DOTDEX_CONFIG";

/// How to settle a file that changed both at home and in the repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictStrategy {
    /// Abort the transfer and list the conflicting files.
    #[default]
    Fail,
    /// The home copy wins.
    Local,
    /// The repository copy wins.
    Repo,
}

/// On-disk shape of the configuration file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    repo: String,
    #[serde(default = "default_branch")]
    branch: String,
    #[serde(default)]
    files: Vec<String>,
    #[serde(default)]
    exclude: Vec<String>,
    #[serde(default)]
    on_conflict: ConflictStrategy,
    #[serde(default = "default_backup")]
    backup: bool,
}

fn default_branch() -> String {
    "main".to_string()
}

const fn default_backup() -> bool {
    true
}

/// Fully validated configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path the configuration was loaded from.
    pub path: PathBuf,
    /// The `repo` value exactly as written in the file.
    pub repo_raw: String,
    /// Parsed repository location.
    pub repo: RepoLocation,
    /// Branch used by git-backed repositories.
    pub branch: String,
    /// Tracked paths, relative to the home directory.
    pub files: Vec<String>,
    /// Compiled exclusion patterns.
    pub exclude: ExcludeSet,
    /// Conflict policy.
    pub on_conflict: ConflictStrategy,
    /// Back up conflicting home files before `pull` overwrites them.
    pub backup: bool,
}

impl Config {
    /// Load the configuration from `path`.
    ///
    /// `home` is used to expand `~` in the `repo` value.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::NotFound`] if the file does not exist
    /// - [`ConfigError::Parse`] if the content is not valid TOML for this schema
    /// - [`ConfigError::Invalid`] if a value cannot be used
    /// - [`ConfigError::Io`] for any other read failure
    pub fn load(path: &Path, home: &Path) -> Result<Self, ConfigError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ConfigError::NotFound {
                    path: path.display().to_string(),
                });
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.display().to_string(),
                    source,
                });
            }
        };
        Self::parse(&content, path, home)
    }

    /// Parse configuration text as if it had been read from `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] or [`ConfigError::Invalid`].
    pub fn parse(content: &str, path: &Path, home: &Path) -> Result<Self, ConfigError> {
        let raw: RawConfig = toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.message().to_string(),
        })?;

        let base_dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        // Relative repo paths must resolve the same from any working
        // directory, or the snapshot key would change between runs.
        let base_dir = dunce::canonicalize(base_dir).unwrap_or_else(|_| base_dir.to_path_buf());
        let repo = RepoLocation::parse(&raw.repo, &base_dir, home)?;

        if raw.branch.trim().is_empty() {
            return Err(ConfigError::Invalid("branch must not be empty".to_string()));
        }

        let files = raw
            .files
            .iter()
            .map(|f| normalize_tracked_path(f))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            path: path.to_path_buf(),
            repo_raw: raw.repo,
            repo,
            branch: raw.branch,
            files,
            exclude: ExcludeSet::new(&raw.exclude)?,
            on_conflict: raw.on_conflict,
            backup: raw.backup,
        })
    }

    /// The configured `repo` value, verbatim.
    #[must_use]
    pub fn repo_display(&self) -> &str {
        &self.repo_raw
    }
}

/// Resolve which configuration file to read.
///
/// Precedence: explicit `--config`, then `DOTDEX_CONFIG`, then `./dotdex`.
#[must_use]
pub fn resolve_path(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR)
        && !path.is_empty()
    {
        return PathBuf::from(path);
    }
    PathBuf::from(DEFAULT_CONFIG_FILE)
}

/// Turn a tracked entry into a clean home-relative path using `/` separators.
///
/// A leading `~/` is accepted and stripped.  Absolute paths and `..`
/// components are rejected so that nothing outside the home directory (or
/// the repository) is ever written.
fn normalize_tracked_path(entry: &str) -> Result<String, ConfigError> {
    let trimmed = entry.trim();
    let trimmed = trimmed.strip_prefix("~/").unwrap_or(trimmed);
    let mut parts = Vec::new();
    for component in Path::new(trimmed).components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(ConfigError::Invalid(format!(
                    "tracked path must stay inside the home directory: {entry}"
                )));
            }
        }
    }
    if parts.is_empty() {
        return Err(ConfigError::Invalid(format!(
            "tracked path is empty: '{entry}'"
        )));
    }
    Ok(parts.join("/"))
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn parse(content: &str) -> Result<Config, ConfigError> {
        Config::parse(content, Path::new("/work/dotdex"), Path::new("/home/me"))
    }

    #[test]
    fn minimal_config_uses_defaults() {
        let config = parse("repo = \"/srv/dotfiles\"\n").unwrap();
        assert_eq!(config.repo_display(), "/srv/dotfiles");
        assert_eq!(
            config.repo,
            RepoLocation::Directory(PathBuf::from("/srv/dotfiles"))
        );
        assert_eq!(config.branch, "main");
        assert!(config.files.is_empty());
        assert!(config.exclude.is_empty());
        assert_eq!(config.on_conflict, ConflictStrategy::Fail);
        assert!(config.backup);
    }

    #[test]
    fn full_config() {
        let config = parse(
            r#"repo = "git@github.com:me/dotfiles.git"
branch = "trunk"
files = ["~/.bashrc", ".config/nvim/", "./.gitconfig"]
exclude = ["*.swp"]
on_conflict = "repo"
backup = false
"#,
        )
        .unwrap();
        assert!(config.repo.is_remote());
        assert_eq!(config.branch, "trunk");
        assert_eq!(config.files, vec![".bashrc", ".config/nvim", ".gitconfig"]);
        assert_eq!(config.on_conflict, ConflictStrategy::Repo);
        assert!(!config.backup);
    }

    #[test]
    fn relative_repo_resolves_against_config_dir() {
        let config = parse("repo = \"store\"\n").unwrap();
        assert_eq!(
            config.repo,
            RepoLocation::Directory(PathBuf::from("/work/store"))
        );
    }

    #[test]
    fn missing_repo_is_parse_error() {
        let err = parse("files = [\".bashrc\"]\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }), "got {err:?}");
        assert!(err.to_string().contains("repo"));
    }

    #[test]
    fn malformed_toml_is_parse_error() {
        let err = parse("repo = \n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn unknown_key_is_parse_error() {
        let err = parse("repo = \"/srv\"\nremote = \"x\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn unknown_conflict_strategy_is_parse_error() {
        let err = parse("repo = \"/srv\"\non_conflict = \"merge\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn parent_component_rejected() {
        let err = parse("repo = \"/srv\"\nfiles = [\"../etc/passwd\"]\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn absolute_tracked_path_rejected() {
        let err = parse("repo = \"/srv\"\nfiles = [\"/etc/hosts\"]\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn empty_tracked_path_rejected() {
        let err = parse("repo = \"/srv\"\nfiles = [\"~/\"]\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn load_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(&dir.path().join("dotdex"), Path::new("/home/me")).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound { .. }));
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dotdex");
        std::fs::write(&path, "repo = \"store\"\nfiles = [\".bashrc\"]\n").unwrap();
        let config = Config::load(&path, Path::new("/home/me")).unwrap();
        assert_eq!(config.files, vec![".bashrc"]);
        assert_eq!(config.repo, RepoLocation::Directory(dir.path().join("store")));
    }

    #[test]
    fn explicit_config_path_wins() {
        assert_eq!(
            resolve_path(Some(Path::new("/etc/dotdex.toml"))),
            PathBuf::from("/etc/dotdex.toml")
        );
    }
}
