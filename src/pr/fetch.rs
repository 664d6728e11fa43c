use tracing::{debug, info, instrument, warn};

use super::types::{CommitSummary, PullRequestSnapshot};
use super::PrError;
use crate::git::{Git, GitError};
use crate::github::{GitHubApi, PullRequestNode};
use crate::util::Repository;

/// Author shown when the GitHub account no longer exists.
pub const UNKNOWN_AUTHOR: &str = "unknown";

/// Fetch PR metadata over GraphQL and compute the diff locally.
///
/// Diff failures never fail the fetch: the snapshot carries an
/// `[Unable to fetch diff: ...]` placeholder instead.
#[instrument(skip(github, git, repository), fields(repo = %repository))]
pub async fn fetch_pr_data(
    github: &dyn GitHubApi,
    git: &dyn Git,
    repository: &Repository,
    pr_number: u64,
    remote: &str,
) -> Result<PullRequestSnapshot, PrError> {
    debug!("querying pull request");
    let node = github
        .pull_request(repository, pr_number)
        .await?
        .ok_or_else(|| PrError::NotFound {
            repository: repository.full_name(),
            number: pr_number,
        })?;

    let diff = match compute_diff(git, remote, &node.base_ref_name, &node.head_ref_oid).await {
        Ok(diff) => {
            debug!(diff_bytes = diff.len(), "computed diff");
            diff
        }
        Err(err) => {
            warn!(error = %err, "could not compute diff, continuing without it");
            format!("[Unable to fetch diff: {err}]")
        }
    };

    let snapshot = snapshot_from_node(node, diff);
    info!(
        title = %snapshot.title,
        files = snapshot.changed_files.len(),
        commits = snapshot.commits.len(),
        "fetched PR data"
    );
    Ok(snapshot)
}

async fn compute_diff(
    git: &dyn Git,
    remote: &str,
    base_branch: &str,
    head_sha: &str,
) -> Result<String, GitError> {
    git.fetch(remote, base_branch).await?;
    git.diff(&format!("{remote}/{base_branch}"), head_sha).await
}

fn snapshot_from_node(node: PullRequestNode, diff: String) -> PullRequestSnapshot {
    let changed_files = node
        .files
        .map(|files| files.nodes.into_iter().map(|f| f.path).collect())
        .unwrap_or_default();
    let commits = node
        .commits
        .map(|commits| {
            commits
                .nodes
                .into_iter()
                .map(|n| CommitSummary {
                    oid: n.commit.oid,
                    headline: n.commit.message_headline,
                })
                .collect()
        })
        .unwrap_or_default();

    PullRequestSnapshot {
        number: node.number,
        title: node.title,
        author: node
            .author
            .map(|a| a.login)
            .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string()),
        body: node.body.unwrap_or_default(),
        base_branch: node.base_ref_name,
        head_branch: node.head_ref_name,
        head_sha: node.head_ref_oid,
        commits,
        changed_files,
        diff,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::mock::MockGit;
    use crate::github::mock::{sample_pull_request, MockGitHub};
    use crate::util::parse_repository;

    fn repo() -> Repository {
        parse_repository("octo/widgets").unwrap()
    }

    #[tokio::test]
    async fn test_fetch_builds_snapshot() {
        let github = MockGitHub::with_pull_request(sample_pull_request());
        let git = MockGit::new();
        git.set_diff("diff --git a/src/main.rs b/src/main.rs\n");

        let snapshot = fetch_pr_data(&github, &git, &repo(), 42, "origin").await.unwrap();
        assert_eq!(snapshot.number, 42);
        assert_eq!(snapshot.author, "alice");
        assert_eq!(snapshot.base_branch, "main");
        assert_eq!(snapshot.head_sha, "0f1e2d3c");
        assert_eq!(snapshot.changed_files, vec!["src/auth/login.rs", "src/main.rs"]);
        assert_eq!(snapshot.commits.len(), 1);
        assert!(snapshot.diff.starts_with("diff --git"));

        assert_eq!(git.calls_to("fetch"), vec!["origin main"]);
        assert_eq!(git.calls_to("diff"), vec!["origin/main 0f1e2d3c"]);
    }

    #[tokio::test]
    async fn test_diff_failure_degrades_to_placeholder() {
        let github = MockGitHub::with_pull_request(sample_pull_request());
        let git = MockGit::new();
        git.fail("diff");

        let snapshot = fetch_pr_data(&github, &git, &repo(), 42, "origin").await.unwrap();
        assert!(snapshot.diff.starts_with("[Unable to fetch diff:"));
        assert!(snapshot.diff.contains("mock: diff failed"));
        assert_eq!(snapshot.title, "Add OAuth2 login flow");
    }

    #[tokio::test]
    async fn test_fetch_failure_skips_diff() {
        let github = MockGitHub::with_pull_request(sample_pull_request());
        let git = MockGit::new();
        git.fail("fetch");

        let snapshot = fetch_pr_data(&github, &git, &repo(), 42, "origin").await.unwrap();
        assert!(snapshot.diff.contains("Unable to fetch diff"));
        assert!(!git.called("diff"));
    }

    #[tokio::test]
    async fn test_missing_pull_request_is_not_found() {
        let github = MockGitHub::new();
        let git = MockGit::new();
        let err = fetch_pr_data(&github, &git, &repo(), 99, "origin").await.unwrap_err();
        assert!(matches!(err, PrError::NotFound { number: 99, .. }));
        assert_eq!(err.to_string(), "Pull request octo/widgets#99 not found");
        assert!(!git.called("fetch"));
    }

    #[test]
    fn test_snapshot_defaults_for_missing_fields() {
        let mut node = sample_pull_request();
        node.author = None;
        node.body = None;
        node.files = None;
        node.commits = None;

        let snapshot = snapshot_from_node(node, String::new());
        assert_eq!(snapshot.author, UNKNOWN_AUTHOR);
        assert_eq!(snapshot.body, "");
        assert!(snapshot.changed_files.is_empty());
        assert!(snapshot.commits.is_empty());
    }
}
