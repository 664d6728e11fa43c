use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// PR Autopilot: turn a GitHub pull request into an AI coding prompt, run
/// Claude or Codex against it, and push the result to a fresh branch.
///
/// Every option can also be given through the environment variable shown
/// next to it. Missing values are reported by the stage that needs them.
#[derive(Parser, Debug)]
#[command(name = "pr-autopilot", version, about)]
pub struct Cli {
    /// Settings file (default: ./.pr-autopilot.toml when present)
    #[arg(long, global = true, env = "PR_AUTOPILOT_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Work out which PR the triggering event refers to
    ResolvePr(ResolvePrArgs),
    /// Fetch PR data and fill in the prompt template
    PreparePrompt(PreparePromptArgs),
    /// Create and check out a work branch for the PR
    CreateBranch(CreateBranchArgs),
    /// Run Claude or Codex with a prompt
    RunLlm(RunLlmArgs),
    /// Read the plan left behind by a planning run
    ExtractPlan(ExtractPlanArgs),
    /// Commit any changes as the bot and push the branch
    CommitPush(CommitPushArgs),
    /// Run every stage in one process
    Run(RunArgs),
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::ResolvePr(_) => "resolve-pr",
            Command::PreparePrompt(_) => "prepare-prompt",
            Command::CreateBranch(_) => "create-branch",
            Command::RunLlm(_) => "run-llm",
            Command::ExtractPlan(_) => "extract-plan",
            Command::CommitPush(_) => "commit-push",
            Command::Run(_) => "run",
        }
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct GitHubArgs {
    /// GitHub API token
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: Option<String>,

    /// Repository as owner/name
    #[arg(long, env = "REPOSITORY")]
    pub repository: Option<String>,

    /// REST API base URL, for GitHub Enterprise
    #[arg(long, env = "GITHUB_API_URL")]
    pub github_api_url: Option<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct EventArgs {
    /// PR number carried by a pull request event
    #[arg(long, env = "EVENT_PR_NUMBER")]
    pub event_pr_number: Option<String>,

    /// Issue number carried by an issue comment event
    #[arg(long, env = "EVENT_ISSUE_NUMBER")]
    pub event_issue_number: Option<String>,

    #[arg(long, env = "GITHUB_EVENT_NAME")]
    pub event_name: Option<String>,

    /// Webhook payload file
    #[arg(long, env = "GITHUB_EVENT_PATH")]
    pub event_path: Option<PathBuf>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct GitArgs {
    /// Checkout to run git in (default: current directory)
    #[arg(long, env = "WORKDIR")]
    pub workdir: Option<PathBuf>,

    /// Git remote (default: origin)
    #[arg(long, env = "GIT_REMOTE")]
    pub remote: Option<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct ProviderArgs {
    /// claude or codex
    #[arg(long, env = "PROVIDER")]
    pub provider: Option<String>,

    #[arg(long, env = "MODEL")]
    pub model: Option<String>,

    /// Claude --permission-mode
    #[arg(long, env = "PERMISSION_MODE")]
    pub permission_mode: Option<String>,

    #[arg(long, env = "ANTHROPIC_API_KEY", hide_env_values = true)]
    pub anthropic_api_key: Option<String>,

    #[arg(long, env = "CLAUDE_CODE_OAUTH_TOKEN", hide_env_values = true)]
    pub claude_code_oauth_token: Option<String>,

    /// Route Claude through Amazon Bedrock
    #[arg(long, env = "USE_BEDROCK")]
    pub use_bedrock: Option<String>,

    /// Route Claude through Google Vertex AI
    #[arg(long, env = "USE_VERTEX")]
    pub use_vertex: Option<String>,

    /// Extra Claude arguments, JSON array or whitespace separated
    #[arg(long, env = "CLAUDE_ARGS", allow_hyphen_values = true)]
    pub claude_args: Option<String>,

    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: Option<String>,

    /// Extra Codex arguments, JSON array or whitespace separated
    #[arg(long, env = "CODEX_ARGS", allow_hyphen_values = true)]
    pub codex_args: Option<String>,

    /// Codex --sandbox mode
    #[arg(long, env = "CODEX_SANDBOX")]
    pub codex_sandbox: Option<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct ResolvePrArgs {
    /// Explicit PR number; wins over the event
    #[arg(long, env = "PR_NUMBER")]
    pub pr_number: Option<String>,

    #[command(flatten)]
    pub event: EventArgs,

    #[command(flatten)]
    pub github: GitHubArgs,
}

#[derive(Args, Debug, Clone, Default)]
pub struct PreparePromptArgs {
    /// Template with {{PLACEHOLDER}} variables
    #[arg(long, env = "PROMPT_TEMPLATE")]
    pub prompt_template: Option<String>,

    #[arg(long, env = "PR_NUMBER")]
    pub pr_number: Option<String>,

    /// Base branch (default: the repository default branch)
    #[arg(long, env = "BASE_BRANCH")]
    pub base_branch: Option<String>,

    /// Plan text to put in front of the prompt
    #[arg(long, env = "PLAN")]
    pub plan: Option<String>,

    #[command(flatten)]
    pub github: GitHubArgs,

    #[command(flatten)]
    pub git: GitArgs,
}

#[derive(Args, Debug, Clone, Default)]
pub struct CreateBranchArgs {
    #[arg(long, env = "BASE_BRANCH")]
    pub base_branch: Option<String>,

    #[arg(long, env = "PR_NUMBER")]
    pub pr_number: Option<String>,

    /// Branch name prefix (default: ai/)
    #[arg(long, env = "BRANCH_PREFIX")]
    pub branch_prefix: Option<String>,

    #[command(flatten)]
    pub git: GitArgs,
}

#[derive(Args, Debug, Clone, Default)]
pub struct RunLlmArgs {
    #[arg(long, env = "PROMPT")]
    pub prompt: Option<String>,

    /// Capture stdout instead of letting the CLI edit files
    #[arg(long, env = "CAPTURE_OUTPUT")]
    pub capture_output: Option<String>,

    /// Where to write captured output for extract-plan
    #[arg(long, env = "PLAN_FILE")]
    pub plan_file: Option<PathBuf>,

    #[command(flatten)]
    pub provider: ProviderArgs,
}

#[derive(Args, Debug, Clone, Default)]
pub struct ExtractPlanArgs {
    /// Plan file (default: <temp-dir>/plan.txt)
    #[arg(long, env = "PLAN_FILE")]
    pub plan_file: Option<PathBuf>,

    /// JSON execution log read when the plan file is empty
    #[arg(long, env = "EXECUTION_FILE")]
    pub execution_file: Option<PathBuf>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct CommitPushArgs {
    #[arg(long, env = "BRANCH_NAME")]
    pub branch_name: Option<String>,

    /// Used in the commit message (default: claude)
    #[arg(long, env = "PROVIDER")]
    pub provider: Option<String>,

    /// Defaults to the number in the branch name
    #[arg(long, env = "PR_NUMBER")]
    pub pr_number: Option<String>,

    #[command(flatten)]
    pub git: GitArgs,
}

#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    #[arg(long, env = "PR_NUMBER")]
    pub pr_number: Option<String>,

    #[arg(long, env = "PROMPT_TEMPLATE")]
    pub prompt_template: Option<String>,

    #[arg(long, env = "BASE_BRANCH")]
    pub base_branch: Option<String>,

    #[arg(long, env = "BRANCH_PREFIX")]
    pub branch_prefix: Option<String>,

    /// Plan text to put in front of the prompt
    #[arg(long, env = "PLAN")]
    pub plan: Option<String>,

    /// Run a planning pass first and feed its plan to the implementation run
    #[arg(long, env = "PLAN_PHASE")]
    pub plan_phase: Option<String>,

    /// Where to leave a copy of the generated plan
    #[arg(long, env = "PLAN_FILE")]
    pub plan_file: Option<PathBuf>,

    #[command(flatten)]
    pub event: EventArgs,

    #[command(flatten)]
    pub github: GitHubArgs,

    #[command(flatten)]
    pub git: GitArgs,

    #[command(flatten)]
    pub provider: ProviderArgs,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_create_branch_flags() {
        let cli = Cli::try_parse_from([
            "pr-autopilot",
            "create-branch",
            "--base-branch",
            "develop",
            "--pr-number",
            "7",
            "--branch-prefix",
            "bot/",
        ])
        .unwrap();
        match cli.command {
            Command::CreateBranch(args) => {
                assert_eq!(args.base_branch.as_deref(), Some("develop"));
                assert_eq!(args.pr_number.as_deref(), Some("7"));
                assert_eq!(args.branch_prefix.as_deref(), Some("bot/"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_global_config_flag_after_subcommand() {
        let cli = Cli::try_parse_from([
            "pr-autopilot",
            "extract-plan",
            "--config",
            "ci.toml",
            "--plan-file",
            "/tmp/p.txt",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("ci.toml")));
        assert!(matches!(cli.command, Command::ExtractPlan(_)));
    }

    #[test]
    fn test_extra_args_accept_leading_hyphens() {
        let cli = Cli::try_parse_from([
            "pr-autopilot",
            "run-llm",
            "--codex-args",
            "--full-auto",
        ])
        .unwrap();
        match cli.command {
            Command::RunLlm(args) => {
                assert_eq!(args.provider.codex_args.as_deref(), Some("--full-auto"))
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
