use anyhow::Result;

use super::{Context, Task, TaskResult};
use crate::repository::Direction;

/// Bring the repository worktree up to date before files are compared.
#[derive(Debug)]
pub struct SyncRepository {
    direction: Direction,
}

impl SyncRepository {
    /// Create the task for a sync in `direction`.
    #[must_use]
    pub const fn new(direction: Direction) -> Self {
        Self { direction }
    }
}

impl Task for SyncRepository {
    fn name(&self) -> &'static str {
        "Sync repository"
    }

    fn should_run(&self, _ctx: &Context) -> bool {
        true
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        ctx.log
            .debug(&format!("repository: {}", ctx.backend.describe()));
        ctx.backend
            .prepare(self.direction, ctx.dry_run, ctx.log.as_ref())?;
        if ctx.dry_run {
            Ok(TaskResult::DryRun)
        } else {
            Ok(TaskResult::Ok)
        }
    }
}

/// Commit and push the repository worktree after files were pushed.
#[derive(Debug)]
pub struct PublishRepository;

impl Task for PublishRepository {
    fn name(&self) -> &'static str {
        "Publish repository"
    }

    super::task_deps![super::transfer::PushFiles];

    fn should_run(&self, ctx: &Context) -> bool {
        ctx.backend.is_remote()
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        if ctx.dry_run {
            ctx.log
                .dry_run(&format!("would commit and push to {}", ctx.backend.describe()));
            return Ok(TaskResult::DryRun);
        }
        if !ctx.backend.publish(&commit_message(), ctx.log.as_ref())? {
            ctx.log.info("nothing to publish");
        }
        Ok(TaskResult::Ok)
    }
}

/// `dotdex push from <host> at <UTC timestamp>`.
fn commit_message() -> String {
    let host = hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .filter(|h| !h.is_empty())
        .unwrap_or_else(|| "unknown host".to_string());
    let now = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
    format!("dotdex push from {host} at {now}")
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::tasks::test_helpers::Workspace;

    #[test]
    fn sync_creates_repository_on_push() {
        let ws = Workspace::new("files = []\n");
        std::fs::remove_dir(ws.repo()).unwrap();
        let ctx = ws.context();
        let result = SyncRepository::new(Direction::Push).run(&ctx).unwrap();
        assert!(matches!(result, TaskResult::Ok));
        assert!(ws.repo().is_dir());
    }

    #[test]
    fn sync_reports_dry_run() {
        let ws = Workspace::new("files = []\n");
        let mut ctx = ws.context();
        ctx.dry_run = true;
        let result = SyncRepository::new(Direction::Pull).run(&ctx).unwrap();
        assert!(matches!(result, TaskResult::DryRun));
    }

    #[test]
    fn sync_fails_when_pulling_from_missing_directory() {
        let ws = Workspace::new("files = []\n");
        std::fs::remove_dir(ws.repo()).unwrap();
        assert!(
            SyncRepository::new(Direction::Pull)
                .run(&ws.context())
                .is_err()
        );
    }

    #[test]
    fn publish_not_applicable_for_directory() {
        let ws = Workspace::new("files = []\n");
        assert!(!PublishRepository.should_run(&ws.context()));
    }

    #[test]
    fn commit_message_names_host_and_time() {
        let msg = commit_message();
        assert!(msg.starts_with("dotdex push from "));
        assert!(msg.contains(" at "));
        assert!(msg.ends_with('Z'));
    }
}
