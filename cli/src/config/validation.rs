//! Non-fatal configuration checks reported as warnings.
use std::collections::HashSet;
use std::path::Path;

use super::Config;

/// A validation warning detected during configuration loading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationWarning {
    /// The specific item that triggered the warning.
    pub item: String,
    /// Human-readable warning message.
    pub message: String,
}

impl ValidationWarning {
    #[must_use]
    fn new(item: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            item: item.into(),
            message: message.into(),
        }
    }
}

impl Config {
    /// Check the configuration for entries that load fine but are probably
    /// mistakes.
    #[must_use]
    pub fn validate(&self) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();

        if self.files.is_empty() {
            warnings.push(ValidationWarning::new(
                "files",
                "no tracked files configured; nothing will be synchronized",
            ));
        }

        let mut seen = HashSet::new();
        for file in &self.files {
            if !seen.insert(file.as_str()) {
                warnings.push(ValidationWarning::new(file, "tracked more than once"));
            }
            if self.exclude.is_excluded(Path::new(file)) {
                warnings.push(ValidationWarning::new(
                    file,
                    "tracked path is matched by an exclude pattern and will be ignored",
                ));
            }
        }

        for (i, file) in self.files.iter().enumerate() {
            let nested_in = self
                .files
                .iter()
                .enumerate()
                .find(|(j, other)| *j != i && *other != file && is_inside(file, other));
            if let Some((_, parent)) = nested_in {
                warnings.push(ValidationWarning::new(
                    file,
                    format!("already covered by tracked directory '{parent}'"),
                ));
            }
        }

        warnings
    }
}

/// Whether `path` lies strictly below `dir` (both `/`-separated).
fn is_inside(path: &str, dir: &str) -> bool {
    path.strip_prefix(dir).is_some_and(|rest| rest.starts_with('/'))
}
