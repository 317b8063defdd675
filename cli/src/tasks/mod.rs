//! Named, dependency-ordered tasks that orchestrate a sync.
pub mod context;
mod processing;
pub mod repository;
pub mod snapshot;
pub mod transfer;

/// Implement [`Task::dependencies`] by expanding to the required
/// `fn dependencies(&self) -> &[TypeId]` method body.
///
/// The `const DEPS` intermediate is required because [`std::any::TypeId::of`]
/// is a `const fn`; placing it in a `const` gives the slice the `'static`
/// lifetime the return type needs.
///
/// # Examples
///
/// ```ignore
/// task_deps![super::repository::SyncRepository]
/// // expands to:
/// //   fn dependencies(&self) -> &[std::any::TypeId] {
/// //       const DEPS: &[std::any::TypeId] = &[
/// //           std::any::TypeId::of::<super::repository::SyncRepository>(),
/// //       ];
/// //       DEPS
/// //   }
/// ```
macro_rules! task_deps {
    [$($dep:ty),+ $(,)?] => {
        fn dependencies(&self) -> &[std::any::TypeId] {
            const DEPS: &[std::any::TypeId] = &[$(std::any::TypeId::of::<$dep>()),+];
            DEPS
        }
    };
}

pub(crate) use task_deps;

pub use context::Context;
pub use processing::{TaskResult, TaskStats, process_resources};

use std::any::TypeId;

use anyhow::Result;

use crate::logging::TaskStatus;
use crate::repository::Direction;

/// A named, executable task.
///
/// The `'static` bound gives each task struct a stable [`TypeId`], which is
/// how dependency declarations refer to other tasks (see [`Task::task_id`]
/// and [`Task::dependencies`]).
pub trait Task: Send + Sync + 'static {
    /// Human-readable task name.
    fn name(&self) -> &str;

    /// The concrete `TypeId` of this task, used as a dependency identifier.
    fn task_id(&self) -> TypeId {
        TypeId::of::<Self>()
    }

    /// Tasks whose failure prevents this task from running.
    ///
    /// Dependencies that are not part of the current task list are ignored.
    fn dependencies(&self) -> &[TypeId] {
        &[]
    }

    /// Whether this task applies to the current repository and command.
    fn should_run(&self, ctx: &Context) -> bool;

    /// Execute the task.
    ///
    /// # Errors
    ///
    /// Returns an error if the task fails, e.g. because the repository cannot
    /// be reached, a conflict aborts the transfer, or a file cannot be written.
    fn run(&self, ctx: &Context) -> Result<TaskResult>;
}

/// The tasks run by the push command, in execution order.
#[must_use]
pub fn all_push_tasks() -> Vec<Box<dyn Task>> {
    vec![
        Box::new(repository::SyncRepository::new(Direction::Push)),
        Box::new(transfer::PushFiles),
        Box::new(repository::PublishRepository),
        Box::new(snapshot::RecordSnapshot),
    ]
}

/// The tasks run by the pull command, in execution order.
#[must_use]
pub fn all_pull_tasks() -> Vec<Box<dyn Task>> {
    vec![
        Box::new(repository::SyncRepository::new(Direction::Pull)),
        Box::new(transfer::PullFiles),
        Box::new(snapshot::RecordSnapshot),
    ]
}

/// Execute a task, recording the result in the logger.
///
/// Returns the recorded status.
pub fn execute(task: &dyn Task, ctx: &Context) -> TaskStatus {
    if !task.should_run(ctx) {
        ctx.log
            .debug(&format!("skipping task: {} (not applicable)", task.name()));
        ctx.log
            .record_task(task.name(), TaskStatus::NotApplicable, None);
        return TaskStatus::NotApplicable;
    }

    ctx.log.stage(task.name());

    match task.run(ctx) {
        Ok(TaskResult::Ok) => {
            ctx.log.record_task(task.name(), TaskStatus::Ok, None);
            TaskStatus::Ok
        }
        Ok(TaskResult::DryRun) => {
            ctx.log.record_task(task.name(), TaskStatus::DryRun, None);
            TaskStatus::DryRun
        }
        Err(e) => {
            ctx.log.error(&format!("{}: {e:#}", task.name()));
            ctx.log
                .record_task(task.name(), TaskStatus::Failed, Some(&format!("{e:#}")));
            TaskStatus::Failed
        }
    }
}


#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use test_helpers::Workspace;

    /// A mock task for testing `execute()`.
    struct MockTask {
        name: &'static str,
        should_run: bool,
        result: Result<TaskResult, String>,
    }

    impl Task for MockTask {
        fn name(&self) -> &str {
            self.name
        }
        fn should_run(&self, _ctx: &Context) -> bool {
            self.should_run
        }
        fn run(&self, _ctx: &Context) -> Result<TaskResult> {
            self.result.clone().map_err(|s| anyhow::anyhow!("{s}"))
        }
    }

    fn run_mock(should_run: bool, result: Result<TaskResult, String>) -> TaskStatus {
        let ws = Workspace::new("files = []\n");
        let (ctx, log) = ws.context_with_log();
        let task = MockTask {
            name: "mock",
            should_run,
            result,
        };
        let status = execute(&task, &ctx);
        let entries = log.task_entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].status, status);
        status
    }

    #[test]
    fn execute_skips_non_applicable_task() {
        assert_eq!(
            run_mock(false, Ok(TaskResult::Ok)),
            TaskStatus::NotApplicable
        );
    }

    #[test]
    fn execute_records_ok_task() {
        assert_eq!(run_mock(true, Ok(TaskResult::Ok)), TaskStatus::Ok);
    }

    #[test]
    fn execute_records_failed_task() {
        assert_eq!(run_mock(true, Err("kaboom".to_string())), TaskStatus::Failed);
    }

    #[test]
    fn execute_records_dry_run_task() {
        assert_eq!(run_mock(true, Ok(TaskResult::DryRun)), TaskStatus::DryRun);
    }

    #[test]
    fn push_tasks_start_with_repository_sync() {
        let tasks = all_push_tasks();
        assert_eq!(tasks[0].name(), "Sync repository");
        assert_eq!(tasks.len(), 4);
    }

    #[test]
    fn every_dependency_precedes_its_dependent() {
        for list in [all_push_tasks(), all_pull_tasks()] {
            for (i, task) in list.iter().enumerate() {
                for dep in task.dependencies() {
                    if let Some(pos) = list.iter().position(|t| t.task_id() == *dep) {
                        assert!(pos < i, "{} runs before its dependency", task.name());
                    }
                }
            }
        }
    }
}
