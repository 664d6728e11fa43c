use std::collections::HashMap;

use crate::pr::PullRequestSnapshot;
use crate::util;

/// Placeholder names a prompt template may use, as `{{NAME}}`.
pub const VARIABLE_NAMES: [&str; 8] = [
    "PR_DIFF",
    "PR_TITLE",
    "PR_NUMBER",
    "PR_AUTHOR",
    "PR_BODY",
    "CHANGED_FILES",
    "REPOSITORY",
    "BASE_BRANCH",
];

/// Values for every name in `VARIABLE_NAMES`, derived from one snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateVariables(HashMap<String, String>);

impl TemplateVariables {
    pub fn from_snapshot(snapshot: &PullRequestSnapshot, repository: &str, base_branch: &str) -> Self {
        let values = [
            ("PR_DIFF", snapshot.diff.clone()),
            ("PR_TITLE", snapshot.title.clone()),
            ("PR_NUMBER", snapshot.number.to_string()),
            ("PR_AUTHOR", snapshot.author.clone()),
            ("PR_BODY", snapshot.body.clone()),
            ("CHANGED_FILES", snapshot.changed_files.join("\n")),
            ("REPOSITORY", repository.to_string()),
            ("BASE_BRANCH", base_branch.to_string()),
        ];
        Self(
            values
                .into_iter()
                .map(|(name, value)| (name.to_string(), value))
                .collect(),
        )
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Substitute these variables into `template`.
    pub fn render(&self, template: &str) -> String {
        util::substitute_template(template, &self.0)
    }
}

/// Result of prompt preparation, handed to later stages without re-fetching.
#[derive(Debug, Clone)]
pub struct PreparedPrompt {
    pub prompt: String,
    pub base_branch: String,
    pub snapshot: PullRequestSnapshot,
}
