use std::sync::Arc;

use anyhow::Result;

use super::{CommandSetup, run_tasks_to_completion};
use crate::cli::{GlobalOpts, SyncOpts};
use crate::logging::Logger;
use crate::tasks;

/// Run the push command.
///
/// # Errors
///
/// Returns an error if configuration loading fails or any task fails.
pub fn run(global: &GlobalOpts, opts: &SyncOpts, log: &Arc<Logger>) -> Result<()> {
    let setup = CommandSetup::init(global, log)?;
    let ctx = setup.context(global, opts.force, Arc::clone(log))?;

    let tasks = tasks::all_push_tasks();
    run_tasks_to_completion(tasks.iter().map(AsRef::as_ref), &ctx, log)
}
