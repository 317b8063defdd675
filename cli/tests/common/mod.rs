// Shared helpers for integration tests.
//
// Provides a temporary-directory-backed sandbox with a repository, a
// configuration file and any number of simulated machines (each with its own
// home and cache directory), so each integration test can set up an isolated
// environment without repeating filesystem boilerplate.
//
// Used by all integration test binaries that declare `mod common;`.
#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::Output;
use std::sync::Arc;

use dotdex_cli::cli::{GlobalOpts, SyncOpts};
use dotdex_cli::commands;
use dotdex_cli::logging::Logger;

/// An isolated sandbox backed by a [`tempfile::TempDir`].
///
/// The directory is automatically deleted when dropped.
pub struct Sandbox {
    root: tempfile::TempDir,
    /// Directory holding the repository copies (unused for git remotes).
    pub repo: PathBuf,
    /// The `dotdex` configuration file.
    pub config: PathBuf,
}

/// One simulated machine: a home directory and its own cache.
pub struct Machine {
    pub home: PathBuf,
    pub cache: PathBuf,
}

impl Sandbox {
    /// Create a sandbox whose configuration points at a local directory
    /// repository; `body` is appended after the `repo = ...` line.
    pub fn new(body: &str) -> Self {
        let root = tempfile::tempdir().expect("create temp dir");
        let repo = root.path().join("repo");
        let value = repo.display().to_string();
        Self::with_repo_value(root, repo, &value, body)
    }

    /// Create a sandbox whose configuration points at a bare git repository
    /// reached through a `file://` URL.
    pub fn with_git_remote(body: &str) -> Self {
        let root = tempfile::tempdir().expect("create temp dir");
        let remote = root.path().join("remote.git");
        git2::Repository::init_bare(&remote).expect("init bare remote");
        let value = format!("file://{}", remote.display());
        Self::with_repo_value(root, remote, &value, body)
    }

    fn with_repo_value(root: tempfile::TempDir, repo: PathBuf, value: &str, body: &str) -> Self {
        let config = root.path().join("dotdex");
        std::fs::write(&config, format!("repo = '{value}'\n{body}")).expect("write config");
        Self { root, repo, config }
    }

    /// Path to the sandbox root.
    pub fn root_path(&self) -> &Path {
        self.root.path()
    }

    /// Create (or reuse) the machine called `name`.
    pub fn machine(&self, name: &str) -> Machine {
        let home = self.root.path().join(name).join("home");
        let cache = self.root.path().join(name).join("cache");
        std::fs::create_dir_all(&home).expect("create home");
        Machine { home, cache }
    }

    /// Global options selecting this sandbox's config and `machine`.
    pub fn global(&self, machine: &Machine, dry_run: bool) -> GlobalOpts {
        GlobalOpts {
            dry_run,
            config: Some(self.config.clone()),
            home: Some(machine.home.clone()),
            cache_dir: Some(machine.cache.clone()),
        }
    }

    /// Run `push` for `machine` through the library.
    pub fn push(&self, machine: &Machine, force: bool) -> anyhow::Result<()> {
        commands::push::run(
            &self.global(machine, false),
            &SyncOpts { force },
            &Arc::new(Logger::new(None)),
        )
    }

    /// Run `pull` for `machine` through the library.
    pub fn pull(&self, machine: &Machine, force: bool) -> anyhow::Result<()> {
        commands::pull::run(
            &self.global(machine, false),
            &SyncOpts { force },
            &Arc::new(Logger::new(None)),
        )
    }

    /// Write a file into the repository directory, creating parents.
    pub fn write_repo(&self, rel: &str, content: &str) {
        write(&self.repo.join(rel), content);
    }

    /// Read a repository file, `None` if absent.
    pub fn read_repo(&self, rel: &str) -> Option<String> {
        std::fs::read_to_string(self.repo.join(rel)).ok()
    }

    /// Run the compiled `dotdex` binary for `machine` with `args`.
    ///
    /// `HOME` and `XDG_CACHE_HOME` are pointed into the sandbox so nothing
    /// outside it is touched even without overrides on the command line.
    pub fn run_binary(&self, machine: &Machine, args: &[&str]) -> Output {
        std::process::Command::new(env!("CARGO_BIN_EXE_dotdex"))
            .args(args)
            .env("HOME", &machine.home)
            .env("XDG_CACHE_HOME", &machine.cache)
            .env_remove("DOTDEX_CONFIG")
            .current_dir(self.root.path())
            .output()
            .expect("run dotdex binary")
    }
}

impl Machine {
    /// Write a file below the home directory, creating parents.
    pub fn write(&self, rel: &str, content: &str) {
        write(&self.home.join(rel), content);
    }

    /// Read a home file, `None` if absent.
    pub fn read(&self, rel: &str) -> Option<String> {
        std::fs::read_to_string(self.home.join(rel)).ok()
    }

    /// Whether `rel` exists below the home directory.
    pub fn exists(&self, rel: &str) -> bool {
        self.home.join(rel).exists()
    }
}

fn write(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("create parent dir");
    }
    std::fs::write(path, content).expect("write file");
}
