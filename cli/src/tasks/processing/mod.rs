//! Generic resource processing loop: check state, apply, collect stats.

mod apply;

use anyhow::Result;

use super::context::Context;
use crate::resources::Resource;

/// Result of a single task execution.
///
/// # Examples
///
/// ```
/// use dotdex_cli::tasks::TaskResult;
///
/// let ok = TaskResult::Ok;
/// let dry = TaskResult::DryRun;
///
/// assert!(matches!(ok, TaskResult::Ok));
/// assert!(matches!(dry, TaskResult::DryRun));
/// ```
#[derive(Debug, Clone)]
pub enum TaskResult {
    /// Task completed successfully.
    Ok,
    /// Task ran in dry-run mode.
    DryRun,
}

/// Counters for batch tasks that process many items.
///
/// Provides consistent summary logging across all tasks.
///
/// # Examples
///
/// ```
/// use dotdex_cli::tasks::TaskStats;
///
/// let mut stats = TaskStats::new();
/// stats.changed = 3;
/// stats.already_ok = 10;
///
/// assert_eq!(stats.summary(false), "3 changed, 10 already ok");
/// assert_eq!(stats.summary(true), "3 would change, 10 already ok");
/// ```
///
/// When items are skipped, the summary includes the count:
///
/// ```
/// use dotdex_cli::tasks::TaskStats;
///
/// let stats = TaskStats { changed: 1, already_ok: 2, skipped: 3 };
/// assert_eq!(stats.summary(false), "1 changed, 2 already ok, 3 skipped");
/// ```
#[derive(Debug, Default)]
pub struct TaskStats {
    /// Number of items changed or applied.
    pub changed: u32,
    /// Number of items already in the correct state.
    pub already_ok: u32,
    /// Number of items left alone (e.g. changes flowing the other way).
    pub skipped: u32,
}

impl TaskStats {
    /// Create a new empty stats counter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Format the summary string (e.g. "3 changed, 10 already ok, 1 skipped").
    #[must_use]
    pub fn summary(&self, dry_run: bool) -> String {
        let verb = if dry_run { "would change" } else { "changed" };
        if self.skipped > 0 {
            format!(
                "{} {verb}, {} already ok, {} skipped",
                self.changed, self.already_ok, self.skipped
            )
        } else {
            format!("{} {verb}, {} already ok", self.changed, self.already_ok)
        }
    }

    /// Log the summary and return the appropriate `TaskResult`.
    #[must_use]
    pub fn finish(self, ctx: &Context) -> TaskResult {
        ctx.log.info(&self.summary(ctx.dry_run));
        if ctx.dry_run {
            TaskResult::DryRun
        } else {
            TaskResult::Ok
        }
    }
}

impl std::ops::AddAssign for TaskStats {
    fn add_assign(&mut self, other: Self) {
        self.changed += other.changed;
        self.already_ok += other.already_ok;
        self.skipped += other.skipped;
    }
}

/// Process resources by checking each one's current state and applying as needed.
///
/// `verb` names the direction in log messages (e.g. "push", "pull").
///
/// # Errors
///
/// Returns an error if any resource fails to check its state or to apply.
pub fn process_resources<R: Resource>(
    ctx: &Context,
    resources: impl IntoIterator<Item = R>,
    verb: &str,
) -> Result<TaskStats> {
    let mut stats = TaskStats::new();
    for resource in resources {
        let current = resource.current_state()?;
        stats += apply::process_single(ctx, &resource, current, verb)?;
    }
    Ok(stats)
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::resources::{Applicable, ResourceChange, ResourceState};
    use crate::tasks::test_helpers::Workspace;

    /// A configurable mock resource for testing the processing pipeline.
    struct MockResource {
        state_result: Result<ResourceState, String>,
        apply_result: Result<ResourceChange, String>,
    }

    impl MockResource {
        fn new(state: ResourceState) -> Self {
            Self {
                state_result: Ok(state),
                apply_result: Ok(ResourceChange::Applied),
            }
        }

        fn with_state_error(mut self, err: impl Into<String>) -> Self {
            self.state_result = Err(err.into());
            self
        }

        fn with_apply(mut self, result: Result<ResourceChange, String>) -> Self {
            self.apply_result = result;
            self
        }
    }

    impl Applicable for MockResource {
        fn description(&self) -> String {
            "mock resource".to_string()
        }

        fn apply(&self) -> Result<ResourceChange> {
            self.apply_result
                .clone()
                .map_err(|s| anyhow::anyhow!("{s}"))
        }
    }

    impl Resource for MockResource {
        fn current_state(&self) -> Result<ResourceState> {
            self.state_result
                .clone()
                .map_err(|s| anyhow::anyhow!("{s}"))
        }
    }

    #[test]
    fn stats_summary_changed_only() {
        let stats = TaskStats {
            changed: 3,
            already_ok: 0,
            skipped: 0,
        };
        assert_eq!(stats.summary(false), "3 changed, 0 already ok");
    }

    #[test]
    fn stats_add_assign_sums_fields() {
        let mut total = TaskStats {
            changed: 1,
            already_ok: 2,
            skipped: 3,
        };
        total += TaskStats {
            changed: 10,
            already_ok: 20,
            skipped: 30,
        };
        assert_eq!(total.summary(true), "11 would change, 22 already ok, 33 skipped");
    }

    #[test]
    fn stats_finish_returns_dry_run_result() {
        let ws = Workspace::new("files = []\n");
        let mut ctx = ws.context();
        ctx.dry_run = true;
        assert!(matches!(TaskStats::new().finish(&ctx), TaskResult::DryRun));
    }

    #[test]
    fn stats_finish_returns_ok_result() {
        let ws = Workspace::new("files = []\n");
        assert!(matches!(
            TaskStats::new().finish(&ws.context()),
            TaskResult::Ok
        ));
    }

    #[test]
    fn process_resources_counts_each_state() {
        let ws = Workspace::new("files = []\n");
        let resources = vec![
            MockResource::new(ResourceState::Correct),
            MockResource::new(ResourceState::Missing),
            MockResource::new(ResourceState::Incorrect {
                current: "content differs".to_string(),
            }),
            MockResource::new(ResourceState::Invalid {
                reason: "source is a directory".to_string(),
            }),
        ];
        let stats = process_resources(&ws.context(), resources, "push").unwrap();
        assert_eq!(stats.changed, 2);
        assert_eq!(stats.already_ok, 1);
        assert_eq!(stats.skipped, 1);
    }

    #[test]
    fn process_resources_dry_run_never_applies() {
        let ws = Workspace::new("files = []\n");
        let mut ctx = ws.context();
        ctx.dry_run = true;
        let resource =
            MockResource::new(ResourceState::Missing).with_apply(Err("should not call".into()));
        let stats = process_resources(&ctx, [resource], "push").unwrap();
        assert_eq!(stats.changed, 1);
    }

    #[test]
    fn process_resources_propagates_state_error() {
        let ws = Workspace::new("files = []\n");
        let resource = MockResource::new(ResourceState::Correct).with_state_error("unreadable");
        let err = process_resources(&ws.context(), [resource], "push").unwrap_err();
        assert!(err.to_string().contains("unreadable"));
    }

    #[test]
    fn apply_error_bails() {
        let ws = Workspace::new("files = []\n");
        let resource =
            MockResource::new(ResourceState::Missing).with_apply(Err("disk full".to_string()));
        let err = process_resources(&ws.context(), [resource], "push").unwrap_err();
        assert!(err.to_string().contains("disk full"));
    }

    #[test]
    fn apply_skipped_bails() {
        let ws = Workspace::new("files = []\n");
        let resource =
            MockResource::new(ResourceState::Missing).with_apply(Ok(ResourceChange::Skipped {
                reason: "source is a directory".to_string(),
            }));
        let err = process_resources(&ws.context(), [resource], "push").unwrap_err();
        assert!(err.to_string().contains("failed to push mock resource"));
    }

    #[test]
    fn apply_already_correct_counts_as_ok() {
        let ws = Workspace::new("files = []\n");
        let resource = MockResource::new(ResourceState::Missing)
            .with_apply(Ok(ResourceChange::AlreadyCorrect));
        let stats = process_resources(&ws.context(), [resource], "push").unwrap();
        assert_eq!(stats.already_ok, 1);
        assert_eq!(stats.changed, 0);
    }
}
