use std::sync::Arc;

use anyhow::Result;

use super::CommandSetup;
use crate::cli::GlobalOpts;
use crate::detect::{ChangeKind, ChangeSet, detect};
use crate::logging::Logger;
use crate::repository::Direction;
use crate::snapshot::Snapshot;

/// Run the status command.
///
/// The repository is brought up to date the way a dry-run push would, then
/// every tracked file is classified and the differing ones are listed.
/// Nothing is written to the home directory, the repository or the snapshot.
///
/// # Errors
///
/// Returns an error if configuration loading fails, the repository cannot be
/// reached, or a tracked file cannot be read.
pub fn run(global: &GlobalOpts, log: &Arc<Logger>) -> Result<()> {
    let setup = CommandSetup::init(global, log)?;
    let ctx = setup.context(global, false, Arc::clone(log))?;

    ctx.backend
        .prepare(Direction::Push, true, ctx.log.as_ref())?;
    let snapshot = Snapshot::load(&ctx.snapshot_path)?;
    let changes = detect(&ctx.config, &ctx.home, ctx.repo_root(), &snapshot)?;

    log.stage("Status");
    for line in render(&changes) {
        log.info(&line);
    }
    Ok(())
}

/// One line per differing file, followed by a totals line.
///
/// Markers: `>` push would copy home to repo, `<` pull would copy repo to
/// home, `!` conflict.
fn render(changes: &ChangeSet) -> Vec<String> {
    let mut lines: Vec<String> = changes
        .changes
        .iter()
        .filter_map(|c| {
            let marker = match c.kind() {
                ChangeKind::Unchanged => return None,
                ChangeKind::LocalChanged => '>',
                ChangeKind::RepoChanged => '<',
                ChangeKind::Conflict => '!',
            };
            Some(format!("{marker} {} ({})", c.path, c.describe()))
        })
        .collect();

    if changes.is_clean() {
        lines.push(format!(
            "everything up to date ({} file(s))",
            changes.changes.len()
        ));
    } else {
        lines.push(format!(
            "{} to push, {} to pull, {} conflict(s), {} unchanged",
            changes.count(ChangeKind::LocalChanged),
            changes.count(ChangeKind::RepoChanged),
            changes.count(ChangeKind::Conflict),
            changes.count(ChangeKind::Unchanged),
        ));
    }
    lines
}
