use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::config::{self, ConfigError};
use crate::git::{Git, GitError};

pub const DEFAULT_PREFIX: &str = "ai/";

#[derive(Debug, Error)]
pub enum BranchError {
    #[error("Failed to create branch {branch}: {source}")]
    Checkout {
        branch: String,
        #[source]
        source: GitError,
    },
}

/// `{prefix}pr-{number}-{millis}`. Unique per PR as long as two runs do not
/// start within the same millisecond.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchName(String);

impl BranchName {
    pub fn new(prefix: &str, pr_number: u64, timestamp_millis: i64) -> Self {
        Self(format!("{prefix}pr-{pr_number}-{timestamp_millis}"))
    }

    pub fn generate(prefix: &str, pr_number: u64) -> Self {
        Self::new(prefix, pr_number, chrono::Utc::now().timestamp_millis())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Recover the PR number from a name ending in `pr-{N}-{timestamp}`.
    pub fn parse_pr_number(name: &str) -> Option<u64> {
        static RE: OnceLock<Regex> = OnceLock::new();
        let re = RE.get_or_init(|| Regex::new(r"pr-(\d+)-\d+$").expect("branch regex is valid"));
        re.captures(name)?.get(1)?.as_str().parse().ok()
    }
}

impl std::fmt::Display for BranchName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Validated inputs of the branch creation stage.
#[derive(Debug, Clone)]
pub struct BranchConfig {
    pub base_branch: String,
    pub pr_number: u64,
    pub prefix: String,
    pub remote: String,
}

impl BranchConfig {
    pub fn new(
        base_branch: Option<&str>,
        pr_number: Option<&str>,
        prefix: Option<&str>,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            base_branch: config::required("BASE_BRANCH", base_branch)?,
            pr_number: config::required_pr_number("PR_NUMBER", pr_number)?,
            prefix: prefix.unwrap_or(DEFAULT_PREFIX).to_string(),
            remote: "origin".to_string(),
        })
    }

    pub fn with_remote(mut self, remote: &str) -> Self {
        self.remote = remote.to_string();
        self
    }
}

/// Create and switch to a fresh branch for the PR.
///
/// Starts from `{remote}/{base_branch}`; if that ref cannot be checked out,
/// the branch is created from the current checkout instead.
#[instrument(skip_all, fields(pr = config.pr_number, base = %config.base_branch))]
pub async fn create_branch(config: &BranchConfig, git: &dyn Git) -> Result<BranchName, BranchError> {
    let branch = BranchName::generate(&config.prefix, config.pr_number);

    if let Err(err) = git.fetch(&config.remote, &config.base_branch).await {
        warn!(error = %err, "could not fetch base branch, using local refs");
    }

    let start_point = format!("{}/{}", config.remote, config.base_branch);
    match git.checkout_new_branch(branch.as_str(), Some(&start_point)).await {
        Ok(()) => {
            info!(%branch, from = %start_point, "created branch");
            Ok(branch)
        }
        Err(err) => {
            warn!(error = %err, "checkout from {start_point} failed, branching from current HEAD");
            git.checkout_new_branch(branch.as_str(), None)
                .await
                .map_err(|source| BranchError::Checkout {
                    branch: branch.to_string(),
                    source,
                })?;
            info!(%branch, "created branch from current HEAD");
            Ok(branch)
        }
    }
}
