/// Pull request data fetched once per run.
///
/// Not Deserialize: built from the GraphQL node plus the locally computed diff.
#[derive(Debug, Clone, PartialEq)]
pub struct PullRequestSnapshot {
    /// PR number (e.g., 42)
    pub number: u64,
    /// PR title
    pub title: String,
    /// Author's GitHub login, "unknown" when the account is gone
    pub author: String,
    /// PR description, empty when none was written
    pub body: String,
    /// Branch the PR merges into
    pub base_branch: String,
    /// Branch the PR merges from
    pub head_branch: String,
    /// Head commit id
    pub head_sha: String,
    /// Commits on the PR (first 100)
    pub commits: Vec<CommitSummary>,
    /// Changed file paths, in API order (first 100)
    pub changed_files: Vec<String>,
    /// Unified diff of `origin/<base_branch>..head_sha`, or a bracketed
    /// `[Unable to fetch diff: ...]` placeholder
    pub diff: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CommitSummary {
    pub oid: String,
    pub headline: String,
}

#[cfg(test)]
pub fn sample_snapshot() -> PullRequestSnapshot {
    PullRequestSnapshot {
        number: 42,
        title: "Add OAuth2 login flow".to_string(),
        author: "alice".to_string(),
        body: "Implements login".to_string(),
        base_branch: "main".to_string(),
        head_branch: "feature/oauth".to_string(),
        head_sha: "0f1e2d3c".to_string(),
        commits: vec![CommitSummary {
            oid: "0f1e2d3c".to_string(),
            headline: "Add login handler".to_string(),
        }],
        changed_files: vec!["src/auth/login.rs".to_string(), "src/main.rs".to_string()],
        diff: "+fn login() {}".to_string(),
    }
}
