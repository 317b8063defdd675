pub mod pull;
pub mod push;
pub mod status;
pub mod version;

use std::any::TypeId;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context as _, Result};

use crate::cli::GlobalOpts;
use crate::config::{self, Config};
use crate::error::SyncError;
use crate::logging::{Log, Logger, TaskStatus};
use crate::paths;
use crate::repository;
use crate::snapshot::Snapshot;
use crate::tasks::{self, Context, Task};

/// Shared state produced by the common command setup sequence.
///
/// Resolves the home directory, loads and validates the configuration and
/// locates the cache directory so that each command does not have to repeat
/// the boilerplate.
#[derive(Debug)]
pub struct CommandSetup {
    /// Validated configuration.
    pub config: Arc<Config>,
    /// Home directory the tracked paths are relative to.
    pub home: PathBuf,
    /// Directory holding snapshots, git clones and logs.
    pub cache_dir: PathBuf,
}

impl CommandSetup {
    /// Load the configuration and print the configured `repo` value on its
    /// own line of stdout.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined, the
    /// configuration file is missing or invalid, or no cache directory can be
    /// created.
    pub fn init(global: &GlobalOpts, log: &Logger) -> Result<Self> {
        let home = paths::home_dir(global.home.as_deref())?;
        let path = config::resolve_path(global.config.as_deref());
        let config = Config::load(&path, &home)?;
        println!("{}", config.repo_display());
        log.debug(&format!("repo: {}", config.repo_display()));
        log.debug(&format!("config: {}", path.display()));
        log.debug(&format!("home: {}", home.display()));
        log.debug(&format!("{} tracked entries", config.files.len()));
        for pattern in config.exclude.patterns() {
            log.debug(&format!("exclude: {pattern}"));
        }

        let warnings = config.validate();
        if !warnings.is_empty() {
            log.warn(&format!(
                "found {} configuration warning(s):",
                warnings.len()
            ));
            for warning in &warnings {
                log.warn(&format!("  {}: {}", warning.item, warning.message));
            }
        }

        let cache_dir = paths::cache_dir(global.cache_dir.as_deref(), Some(&home))
            .context("cannot determine a cache directory; set XDG_CACHE_HOME or --cache-dir")?;
        log.debug(&format!("cache: {}", cache_dir.display()));

        Ok(Self {
            config: Arc::new(config),
            home,
            cache_dir,
        })
    }

    /// Build the task context for a sync.
    ///
    /// # Errors
    ///
    /// Returns an error if the repository backend cannot be opened.
    pub fn context(&self, global: &GlobalOpts, force: bool, log: Arc<Logger>) -> Result<Context> {
        let backend = repository::open(&self.config, Some(&self.cache_dir))?;
        Ok(Context {
            config: Arc::clone(&self.config),
            log: log as Arc<dyn Log>,
            dry_run: global.dry_run,
            home: self.home.clone(),
            backend,
            snapshot_path: Snapshot::path_for(&self.cache_dir, &self.config.repo),
            force,
        })
    }
}

/// Execute every task in order, print the summary, and bail if any task failed.
///
/// A task whose dependency failed (or was itself skipped for that reason) is
/// not run; it is recorded as skipped instead.
///
/// # Errors
///
/// Returns an error if one or more tasks recorded a failure.
pub fn run_tasks_to_completion<'a>(
    tasks: impl IntoIterator<Item = &'a dyn Task>,
    ctx: &Context,
    log: &Logger,
) -> Result<()> {
    let tasks: Vec<&dyn Task> = tasks.into_iter().collect();
    let mut blocked: HashSet<TypeId> = HashSet::new();

    for task in &tasks {
        let failed_dep = task
            .dependencies()
            .iter()
            .find(|dep| blocked.contains(*dep))
            .and_then(|dep| tasks.iter().find(|t| t.task_id() == *dep));
        if let Some(dep) = failed_dep {
            let reason = SyncError::DependencyFailed(dep.name().to_string()).to_string();
            log.debug(&format!("skipping task: {} ({reason})", task.name()));
            log.record_task(task.name(), TaskStatus::Skipped, Some(&reason));
            blocked.insert(task.task_id());
            continue;
        }

        if tasks::execute(*task, ctx) == TaskStatus::Failed {
            blocked.insert(task.task_id());
        }
    }

    log.print_summary();

    let count = log.failure_count();
    if count > 0 {
        anyhow::bail!("{count} task(s) failed");
    }
    Ok(())
}

#[cfg(test)]
#[allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::panic
)]
mod tests {
    use super::*;
    use crate::tasks::TaskResult;
    use crate::tasks::test_helpers::Workspace;

    struct Failing;
    struct Dependent;
    struct Transitive;
    struct Independent;

    impl Task for Failing {
        fn name(&self) -> &'static str {
            "Failing"
        }
        fn should_run(&self, _ctx: &Context) -> bool {
            true
        }
        fn run(&self, _ctx: &Context) -> Result<TaskResult> {
            anyhow::bail!("boom")
        }
    }

    impl Task for Dependent {
        fn name(&self) -> &'static str {
            "Dependent"
        }
        crate::tasks::task_deps![Failing];
        fn should_run(&self, _ctx: &Context) -> bool {
            true
        }
        fn run(&self, _ctx: &Context) -> Result<TaskResult> {
            panic!("must not run after a failed dependency")
        }
    }

    impl Task for Transitive {
        fn name(&self) -> &'static str {
            "Transitive"
        }
        crate::tasks::task_deps![Dependent];
        fn should_run(&self, _ctx: &Context) -> bool {
            true
        }
        fn run(&self, _ctx: &Context) -> Result<TaskResult> {
            panic!("must not run after a skipped dependency")
        }
    }

    impl Task for Independent {
        fn name(&self) -> &'static str {
            "Independent"
        }
        fn should_run(&self, _ctx: &Context) -> bool {
            true
        }
        fn run(&self, _ctx: &Context) -> Result<TaskResult> {
            Ok(TaskResult::Ok)
        }
    }

    #[test]
    fn failed_dependency_skips_dependents() {
        let ws = Workspace::new("files = []\n");
        let (ctx, log) = ws.context_with_log();
        let list: Vec<Box<dyn Task>> = vec![
            Box::new(Failing),
            Box::new(Dependent),
            Box::new(Transitive),
            Box::new(Independent),
        ];

        let err = run_tasks_to_completion(list.iter().map(AsRef::as_ref), &ctx, &log)
            .unwrap_err();
        assert_eq!(err.to_string(), "1 task(s) failed");

        let entries = log.task_entries();
        let statuses: Vec<_> = entries.iter().map(|e| (e.name.as_str(), e.status)).collect();
        assert_eq!(
            statuses,
            vec![
                ("Failing", TaskStatus::Failed),
                ("Dependent", TaskStatus::Skipped),
                ("Transitive", TaskStatus::Skipped),
                ("Independent", TaskStatus::Ok),
            ]
        );
        assert_eq!(
            entries[1].message.as_deref(),
            Some("dependency failed: Failing")
        );
        assert_eq!(
            entries[2].message.as_deref(),
            Some("dependency failed: Dependent")
        );
    }

    #[test]
    fn all_tasks_succeeding_returns_ok() {
        let ws = Workspace::new("files = []\n");
        let (ctx, log) = ws.context_with_log();
        let list: Vec<Box<dyn Task>> = vec![Box::new(Independent)];
        run_tasks_to_completion(list.iter().map(AsRef::as_ref), &ctx, &log).unwrap();
        assert_eq!(log.failure_count(), 0);
    }

    #[test]
    fn setup_reports_missing_config() {
        let tmp = tempfile::tempdir().unwrap();
        let global = GlobalOpts {
            config: Some(tmp.path().join("absent")),
            home: Some(tmp.path().to_path_buf()),
            cache_dir: Some(tmp.path().join("cache")),
            ..GlobalOpts::default()
        };
        let err = CommandSetup::init(&global, &Logger::new(None)).unwrap_err();
        assert!(
            err.downcast_ref::<crate::error::ConfigError>().is_some(),
            "unexpected error: {err:#}"
        );
    }

    #[test]
    fn setup_builds_context_for_directory_repo() {
        let tmp = tempfile::tempdir().unwrap();
        let config_path = tmp.path().join("dotdex");
        std::fs::write(&config_path, "repo = 'repo'\nfiles = ['.bashrc']\n").unwrap();
        let global = GlobalOpts {
            config: Some(config_path),
            home: Some(tmp.path().join("home")),
            cache_dir: Some(tmp.path().join("cache")),
            dry_run: true,
        };
        let log = Arc::new(Logger::new(None));
        let setup = CommandSetup::init(&global, &log).unwrap();
        assert_eq!(setup.cache_dir, tmp.path().join("cache"));

        let ctx = setup.context(&global, true, Arc::clone(&log)).unwrap();
        assert!(ctx.dry_run);
        assert!(ctx.force);
        let root = dunce::canonicalize(tmp.path()).unwrap();
        assert_eq!(ctx.repo_root(), root.join("repo"));
        assert!(ctx.snapshot_path.starts_with(tmp.path().join("cache")));
    }
}
