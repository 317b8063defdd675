use std::collections::BTreeSet;

use anyhow::Result;

use super::{Context, Task, TaskResult};
use crate::detect::detect;
use crate::snapshot::Snapshot;

/// Remember which files are now identical on both sides.
///
/// Files that still differ keep their previous base so the next run
/// classifies them the same way.  Entries for files no longer tracked are
/// dropped.
#[derive(Debug)]
pub struct RecordSnapshot;

impl Task for RecordSnapshot {
    fn name(&self) -> &'static str {
        "Record snapshot"
    }

    super::task_deps![
        super::transfer::PushFiles,
        super::transfer::PullFiles,
        super::repository::PublishRepository,
    ];

    fn should_run(&self, _ctx: &Context) -> bool {
        true
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        if ctx.dry_run {
            ctx.log.dry_run(&format!(
                "would record snapshot {}",
                ctx.snapshot_path.display()
            ));
            return Ok(TaskResult::DryRun);
        }

        let mut snapshot = Snapshot::load(&ctx.snapshot_path)?;
        let changes = detect(&ctx.config, &ctx.home, ctx.repo_root(), &snapshot)?;

        let mut in_sync = 0usize;
        for change in &changes.changes {
            if change.local == change.repo {
                snapshot.record(&change.path, change.local.clone());
                in_sync += 1;
            } else {
                ctx.log
                    .debug(&format!("{}: {}", change.path, change.describe()));
            }
        }
        let tracked: BTreeSet<&str> = changes.changes.iter().map(|c| c.path.as_str()).collect();
        snapshot.files.retain(|path, _| tracked.contains(path.as_str()));
        snapshot.repo = ctx.config.repo_display().to_string();
        snapshot.save(&ctx.snapshot_path)?;

        let pending = changes.changes.len() - in_sync;
        if pending > 0 {
            ctx.log
                .info(&format!("{in_sync} file(s) in sync, {pending} still differ"));
        } else {
            ctx.log.info(&format!("{in_sync} file(s) in sync"));
        }
        Ok(TaskResult::Ok)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::detect::hash_file;
    use crate::tasks::test_helpers::Workspace;

    #[test]
    fn records_matching_files_only() {
        let ws = Workspace::new("files = [\".bashrc\", \".vimrc\"]\n");
        ws.write_home(".bashrc", "same");
        ws.write_repo(".bashrc", "same");
        ws.write_home(".vimrc", "mine");
        ws.write_repo(".vimrc", "theirs");

        RecordSnapshot.run(&ws.context()).unwrap();

        let snap = ws.snapshot();
        assert_eq!(
            snap.base(".bashrc"),
            hash_file(&ws.home().join(".bashrc")).unwrap().as_deref()
        );
        assert_eq!(snap.base(".vimrc"), None);
        assert_eq!(snap.repo, ws.config.repo_display());
        assert!(snap.recorded_at.is_some());
    }

    #[test]
    fn drops_untracked_and_deleted_entries() {
        let ws = Workspace::new("files = [\".bashrc\"]\n");
        let mut snap = Snapshot::default();
        snap.record(".old", Some("aa".to_string()));
        snap.record(".bashrc", Some("bb".to_string()));
        snap.save(&ws.snapshot_path()).unwrap();

        RecordSnapshot.run(&ws.context()).unwrap();

        let snap = ws.snapshot();
        assert!(snap.files.is_empty(), "unexpected entries: {:?}", snap.files);
    }

    #[test]
    fn dry_run_does_not_write() {
        let ws = Workspace::new("files = [\".bashrc\"]\n");
        ws.write_home(".bashrc", "x");
        ws.write_repo(".bashrc", "x");
        let mut ctx = ws.context();
        ctx.dry_run = true;

        let result = RecordSnapshot.run(&ctx).unwrap();
        assert!(matches!(result, TaskResult::DryRun));
        assert!(!ws.snapshot_path().exists());
    }
}
