// profile.rs: Per-project identity passed into the engine and registry.

use serde::{Deserialize, Serialize};

/// Optional tool groups a project can turn on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Extension {
    /// list/read/edit tools over the project's own staged files.
    StagedReview,
}

/// Who a project is: how it is named to the agent, where its staged files
/// and logs live, and which extra tools it gets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectProfile {
    /// Shown in every message, e.g. "Web".
    pub label: String,
    /// Inserted into tool names: `read_<prefix>_file`.
    pub tool_prefix: String,
    /// Namespace under `.staging/` and `logs/`.
    pub staging_subdir: String,
    pub extensions: Vec<Extension>,
}

impl ProjectProfile {
    pub fn new(
        label: impl Into<String>,
        tool_prefix: impl Into<String>,
        staging_subdir: impl Into<String>,
    ) -> Self {
        Self {
            label: label.into(),
            tool_prefix: tool_prefix.into(),
            staging_subdir: staging_subdir.into(),
            extensions: Vec::new(),
        }
    }

    pub fn with_extension(mut self, extension: Extension) -> Self {
        if !self.extensions.contains(&extension) {
            self.extensions.push(extension);
        }
        self
    }

    pub fn has_extension(&self, extension: Extension) -> bool {
        self.extensions.contains(&extension)
    }
}
