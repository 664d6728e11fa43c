use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::branch::BranchName;
use crate::config::{self, ConfigError};
use crate::git::{Git, GitError};

pub const DEFAULT_BOT_NAME: &str = "github-actions[bot]";
pub const DEFAULT_BOT_EMAIL: &str = "41898282+github-actions[bot]@users.noreply.github.com";

#[derive(Debug, Error)]
pub enum CommitError {
    #[error("Failed to {step}: {source}")]
    Git {
        step: &'static str,
        #[source]
        source: GitError,
    },
}

/// Validated inputs of the commit-and-push stage.
#[derive(Debug, Clone)]
pub struct CommitConfig {
    pub branch_name: String,
    pub provider: String,
    /// Falls back to the number embedded in `branch_name`.
    pub pr_number: Option<u64>,
    pub remote: String,
    pub bot_name: String,
    pub bot_email: String,
}

impl CommitConfig {
    pub fn new(
        branch_name: Option<&str>,
        provider: Option<&str>,
        pr_number: Option<&str>,
    ) -> Result<Self, ConfigError> {
        let branch_name = config::required("BRANCH_NAME", branch_name)?;
        let pr_number = match pr_number {
            Some(raw) if !raw.trim().is_empty() => Some(config::parse_pr_number("PR_NUMBER", raw)?),
            _ => BranchName::parse_pr_number(&branch_name),
        };

        Ok(Self {
            branch_name,
            provider: provider.unwrap_or("claude").to_string(),
            pr_number,
            remote: "origin".to_string(),
            bot_name: DEFAULT_BOT_NAME.to_string(),
            bot_email: DEFAULT_BOT_EMAIL.to_string(),
        })
    }

    pub fn commit_message(&self) -> String {
        match self.pr_number {
            Some(n) => format!("Apply {} changes for PR #{n}", self.provider),
            None => format!("Apply {} changes", self.provider),
        }
    }
}

/// Commit the working tree and push it to `branch_name`.
///
/// Returns whether there was anything to commit. A clean tree, or a status
/// check that fails, is reported as `false` without touching the remote.
#[instrument(skip_all, fields(branch = %config.branch_name))]
pub async fn commit_and_push(config: &CommitConfig, git: &dyn Git) -> Result<bool, CommitError> {
    let has_changes = match git.status_porcelain().await {
        Ok(status) => !status.trim().is_empty(),
        Err(err) => {
            warn!(error = %err, "git status failed, assuming no changes");
            false
        }
    };

    if !has_changes {
        info!("no changes to commit");
        return Ok(false);
    }

    git.set_identity(&config.bot_name, &config.bot_email)
        .await
        .map_err(failed_to("configure git identity"))?;
    git.add_all().await.map_err(failed_to("stage changes"))?;
    git.commit(&config.commit_message())
        .await
        .map_err(failed_to("commit changes"))?;
    git.push(&config.remote, &config.branch_name)
        .await
        .map_err(failed_to("push branch"))?;

    info!(remote = %config.remote, "pushed changes");
    Ok(true)
}

fn failed_to(step: &'static str) -> impl FnOnce(GitError) -> CommitError {
    move |source| CommitError::Git { step, source }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::mock::MockGit;

    fn config() -> CommitConfig {
        CommitConfig::new(Some("ai/pr-42-1700000000000"), Some("claude"), Some("42")).unwrap()
    }

    #[test]
    fn test_config_requires_branch() {
        assert!(matches!(
            CommitConfig::new(None, Some("claude"), Some("1")),
            Err(ConfigError::Missing("BRANCH_NAME"))
        ));
    }

    #[test]
    fn test_pr_number_recovered_from_branch_name() {
        let cfg = CommitConfig::new(Some("ai/pr-17-1700000000000"), Some("codex"), None).unwrap();
        assert_eq!(cfg.pr_number, Some(17));
        assert_eq!(cfg.commit_message(), "Apply codex changes for PR #17");

        let cfg = CommitConfig::new(Some("feature/x"), None, None).unwrap();
        assert_eq!(cfg.commit_message(), "Apply claude changes");
    }

    #[tokio::test]
    async fn test_clean_tree_skips_commit_and_push() {
        let git = MockGit::new();
        let changed = commit_and_push(&config(), &git).await.unwrap();
        assert!(!changed);
        assert!(!git.called("commit"));
        assert!(!git.called("push"));
    }

    #[tokio::test]
    async fn test_status_failure_assumes_no_changes() {
        let git = MockGit::new();
        git.set_status(" M src/main.rs\n");
        git.fail("status_porcelain");
        assert!(!commit_and_push(&config(), &git).await.unwrap());
        assert!(!git.called("add_all"));
    }

    #[tokio::test]
    async fn test_changes_are_committed_and_pushed() {
        let git = MockGit::new();
        git.set_status(" M src/main.rs\n?? src/new.rs\n");

        assert!(commit_and_push(&config(), &git).await.unwrap());
        assert_eq!(
            git.calls_to("set_identity"),
            vec![format!("{DEFAULT_BOT_NAME} <{DEFAULT_BOT_EMAIL}>")]
        );
        assert!(git.called("add_all"));
        assert_eq!(git.calls_to("commit"), vec!["Apply claude changes for PR #42"]);
        assert_eq!(git.calls_to("push"), vec!["origin ai/pr-42-1700000000000"]);
    }

    #[tokio::test]
    async fn test_push_failure_is_reported() {
        let git = MockGit::new();
        git.set_status(" M src/main.rs\n");
        git.fail("push");
        let err = commit_and_push(&config(), &git).await.unwrap_err();
        assert!(err.to_string().starts_with("Failed to push branch"));
    }
}
