pub mod fetch;
pub mod resolve;
pub mod types;

pub use fetch::fetch_pr_data;
pub use resolve::{resolve_pr_number, EventContext, ResolveConfig};
pub use types::PullRequestSnapshot;

use thiserror::Error;

use crate::config::ConfigError;
use crate::github::GitHubError;

#[derive(Debug, Error)]
pub enum PrError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    GitHub(#[from] GitHubError),

    #[error("Issue #{0} is not a pull request")]
    NotAPullRequest(u64),

    #[error("Could not determine a PR number for event '{event}'")]
    NoPrNumber { event: String },

    #[error("Pull request {repository}#{number} not found")]
    NotFound { repository: String, number: u64 },
}
