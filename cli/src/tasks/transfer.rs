//! Copy changed files between the home directory and the repository.
use std::path::Path;

use anyhow::Result;

use super::{Context, Task, TaskResult, process_resources};
use crate::config::ConflictStrategy;
use crate::detect::{ChangeKind, ChangeSet, FileChange, detect};
use crate::error::SyncError;
use crate::repository::Direction;
use crate::resources::file::SyncFile;
use crate::snapshot::Snapshot;

/// Copy files changed at home into the repository.
#[derive(Debug)]
pub struct PushFiles;

impl Task for PushFiles {
    fn name(&self) -> &'static str {
        "Push files"
    }

    super::task_deps![super::repository::SyncRepository];

    fn should_run(&self, _ctx: &Context) -> bool {
        true
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        transfer(ctx, Direction::Push)
    }
}

/// Copy files changed in the repository into the home directory.
#[derive(Debug)]
pub struct PullFiles;

impl Task for PullFiles {
    fn name(&self) -> &'static str {
        "Pull files"
    }

    super::task_deps![super::repository::SyncRepository];

    fn should_run(&self, _ctx: &Context) -> bool {
        true
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        transfer(ctx, Direction::Pull)
    }
}

/// Which files a transfer touches.
#[derive(Debug, Default)]
struct Plan<'a> {
    /// Files copied (or deleted) on the receiving side.
    send: Vec<&'a FileChange>,
    /// Files already identical on both sides.
    unchanged: u32,
    /// Files with changes flowing the other way, or conflicts the receiving
    /// side wins.
    held: Vec<&'a FileChange>,
}

impl<'a> Plan<'a> {
    /// Split `changes` for a transfer in `direction`.
    ///
    /// Under [`ConflictStrategy::Fail`] any conflict aborts planning, so no
    /// file is touched.
    fn new(
        changes: &'a ChangeSet,
        direction: Direction,
        strategy: ConflictStrategy,
    ) -> Result<Self, SyncError> {
        let conflicts = changes.conflicts();
        if strategy == ConflictStrategy::Fail && !conflicts.is_empty() {
            return Err(SyncError::Conflicts(conflicts));
        }

        let outgoing = match direction {
            Direction::Push => ChangeKind::LocalChanged,
            Direction::Pull => ChangeKind::RepoChanged,
        };
        let wins_conflicts = matches!(
            (direction, strategy),
            (Direction::Push, ConflictStrategy::Local) | (Direction::Pull, ConflictStrategy::Repo)
        );

        let mut plan = Self::default();
        for change in &changes.changes {
            match change.kind() {
                ChangeKind::Unchanged => plan.unchanged += 1,
                ChangeKind::Conflict if wins_conflicts => plan.send.push(change),
                kind if kind == outgoing => plan.send.push(change),
                _ => plan.held.push(change),
            }
        }
        Ok(plan)
    }
}

/// Detect changes and apply the ones flowing in `direction`.
fn transfer(ctx: &Context, direction: Direction) -> Result<TaskResult> {
    let home = ctx.home.as_path();
    let repo = ctx.repo_root();
    report_missing_entries(ctx, home, repo);

    let snapshot = Snapshot::load(&ctx.snapshot_path)?;
    let changes = detect(&ctx.config, home, repo, &snapshot)?;
    let strategy = ctx.conflict_strategy(direction);
    let plan = Plan::new(&changes, direction, strategy)?;

    let (source_root, target_root, other) = match direction {
        Direction::Push => (home, repo, Direction::Pull),
        Direction::Pull => (repo, home, Direction::Push),
    };

    for change in &plan.held {
        if change.kind() == ChangeKind::Conflict {
            ctx.log.warn(&format!(
                "{}: changed on both sides, keeping the {} copy",
                change.path,
                side_name(other)
            ));
        } else {
            ctx.log.debug(&format!(
                "{}: {} (left for {})",
                change.path,
                change.describe(),
                other.verb()
            ));
        }
    }

    let backup_conflicts = direction == Direction::Pull && ctx.config.backup;
    let resources = plan.send.iter().map(|change| {
        let conflict = change.kind() == ChangeKind::Conflict;
        if conflict {
            ctx.log.warn(&format!(
                "{}: changed on both sides, the {} copy wins",
                change.path,
                side_name(direction)
            ));
        }
        SyncFile::new(&change.path, source_root, target_root)
            .with_backup(conflict && backup_conflicts)
    });

    let mut stats = process_resources(ctx, resources, direction.verb())?;
    stats.already_ok += plan.unchanged;
    stats.skipped += u32::try_from(plan.held.len()).unwrap_or(u32::MAX);
    Ok(stats.finish(ctx))
}

/// Name of the side a transfer in `direction` copies from.
const fn side_name(direction: Direction) -> &'static str {
    match direction {
        Direction::Push => "home",
        Direction::Pull => "repository",
    }
}

fn report_missing_entries(ctx: &Context, home: &Path, repo: &Path) {
    for entry in &ctx.config.files {
        let exists = |root: &Path| root.join(entry).symlink_metadata().is_ok();
        if !exists(home) && !exists(repo) {
            ctx.log
                .debug(&format!("{entry}: not found at home or in the repository"));
        }
    }
}
