pub mod types;

pub use types::{PreparedPrompt, TemplateVariables};

use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::config::{self, ConfigError};
use crate::git::Git;
use crate::github::{GitHubApi, GitHubError};
use crate::pr::{self, PrError};
use crate::util::{self, Repository};

#[derive(Debug, Error)]
pub enum PromptError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to resolve default branch: {0}")]
    DefaultBranch(#[from] GitHubError),

    #[error(transparent)]
    Pr(#[from] PrError),
}

/// Validated inputs of the prompt preparation stage.
#[derive(Debug, Clone)]
pub struct PrepareConfig {
    pub template: String,
    pub pr_number: u64,
    pub token: String,
    pub repository: Repository,
    /// Explicit base branch; the repository default branch is used when None.
    pub base_branch: Option<String>,
    /// Plan text from an earlier planning run.
    pub plan: Option<String>,
    pub remote: String,
}

impl PrepareConfig {
    /// Check preconditions in order, naming the first missing value.
    pub fn new(
        template: Option<&str>,
        pr_number: Option<&str>,
        token: Option<&str>,
        repository: Option<&str>,
    ) -> Result<Self, ConfigError> {
        let template = config::required("PROMPT_TEMPLATE", template)?;
        let pr_number = config::required_pr_number("PR_NUMBER", pr_number)?;
        let token = config::required("GITHUB_TOKEN", token)?;
        let repository = config::required("REPOSITORY", repository)?;
        let repository = util::parse_repository(&repository).map_err(|e| ConfigError::Invalid {
            name: "REPOSITORY",
            reason: e.to_string(),
        })?;

        Ok(Self {
            template,
            pr_number,
            token,
            repository,
            base_branch: None,
            plan: None,
            remote: "origin".to_string(),
        })
    }

    pub fn with_base_branch(mut self, base_branch: Option<&str>) -> Self {
        self.base_branch = util::non_blank(base_branch).map(str::to_string);
        self
    }

    pub fn with_plan(mut self, plan: Option<&str>) -> Self {
        self.plan = plan.map(str::to_string);
        self
    }

    pub fn with_remote(mut self, remote: &str) -> Self {
        self.remote = remote.to_string();
        self
    }
}

/// Fetch the PR, fill the template, and prepend the plan if there is one.
#[instrument(skip_all, fields(pr = config.pr_number, repo = %config.repository))]
pub async fn prepare_prompt(
    config: &PrepareConfig,
    github: &dyn GitHubApi,
    git: &dyn Git,
) -> Result<PreparedPrompt, PromptError> {
    let base_branch = match &config.base_branch {
        Some(branch) => branch.clone(),
        None => {
            let branch = github.default_branch(&config.repository).await?;
            debug!(%branch, "using repository default branch");
            branch
        }
    };

    let snapshot = pr::fetch_pr_data(
        github,
        git,
        &config.repository,
        config.pr_number,
        &config.remote,
    )
    .await?;

    let variables =
        TemplateVariables::from_snapshot(&snapshot, &config.repository.full_name(), &base_branch);
    let prompt = embed_plan(&variables.render(&config.template), config.plan.as_deref());
    info!(prompt_chars = prompt.len(), "prepared prompt");

    Ok(PreparedPrompt {
        prompt,
        base_branch,
        snapshot,
    })
}

/// Prefix `prompt` with a fenced plan block. Blank plans change nothing.
pub fn embed_plan(prompt: &str, plan: Option<&str>) -> String {
    match util::non_blank(plan) {
        Some(plan) => {
            let fence = plan_fence(plan);
            format!("Based on this plan:\n\n{fence}\n{plan}\n{fence}\n\n{prompt}")
        }
        None => prompt.to_string(),
    }
}

/// A backtick fence longer than any backtick run inside `plan`, so fenced
/// code in the plan cannot close the block.
fn plan_fence(plan: &str) -> String {
    let longest = plan
        .split(|c| c != '`')
        .map(str::len)
        .max()
        .unwrap_or(0);
    "`".repeat(longest.max(2) + 1)
}
