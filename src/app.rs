use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, info_span, Instrument};

use crate::branch::{self, BranchConfig, BranchError, DEFAULT_PREFIX};
use crate::cli::{
    Cli, Command, CommitPushArgs, CreateBranchArgs, EventArgs, ExtractPlanArgs, GitArgs,
    GitHubArgs, PreparePromptArgs, ProviderArgs, ResolvePrArgs, RunArgs, RunLlmArgs,
};
use crate::commit::{self, CommitConfig, CommitError, DEFAULT_BOT_EMAIL, DEFAULT_BOT_NAME};
use crate::config::{self, ConfigError, Settings};
use crate::git::RealGit;
use crate::github::GitHubClient;
use crate::llm::{self, CliRunner, RunLlmConfig};
use crate::output::{OutputError, Outputs};
use crate::pipeline::{self, PipelineConfig, PipelineError};
use crate::plan::{self, PlanConfig, PlanError};
use crate::pr::{self, EventContext, PrError, ResolveConfig};
use crate::prompt::{self, PrepareConfig, PreparedPrompt, PromptError};
use crate::util::{self, Repository};

const DEFAULT_REMOTE: &str = "origin";

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Pr(#[from] PrError),

    #[error(transparent)]
    Prompt(#[from] PromptError),

    #[error(transparent)]
    Branch(#[from] BranchError),

    #[error("LLM run failed: {0}")]
    Llm(String),

    #[error(transparent)]
    Plan(#[from] PlanError),

    #[error(transparent)]
    Commit(#[from] CommitError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error(transparent)]
    Output(#[from] OutputError),
}

/// Load settings and dispatch to the selected stage.
pub async fn run(cli: Cli) -> Result<(), AppError> {
    let settings = Settings::load(cli.config.as_deref())?;
    let outputs = Outputs::from_env();

    match cli.command {
        Command::ResolvePr(args) => {
            resolve_pr(&settings, &args, &outputs)
                .instrument(info_span!("resolve_pr"))
                .await
        }
        Command::PreparePrompt(args) => {
            prepare_prompt(&settings, &args, &outputs)
                .instrument(info_span!("prepare_prompt"))
                .await
        }
        Command::CreateBranch(args) => {
            create_branch(&settings, &args, &outputs)
                .instrument(info_span!("create_branch"))
                .await
        }
        Command::RunLlm(args) => {
            run_llm(&settings, &args, &outputs)
                .instrument(info_span!("run_llm"))
                .await
        }
        Command::ExtractPlan(args) => {
            let _span = info_span!("extract_plan").entered();
            extract_plan(&settings, &args, &outputs)
        }
        Command::CommitPush(args) => {
            commit_push(&settings, &args, &outputs)
                .instrument(info_span!("commit_push"))
                .await
        }
        Command::Run(args) => {
            run_all(&settings, &args, &outputs)
                .instrument(info_span!("run"))
                .await
        }
    }
}

async fn resolve_pr(
    settings: &Settings,
    args: &ResolvePrArgs,
    outputs: &Outputs,
) -> Result<(), AppError> {
    let config = ResolveConfig {
        explicit: args.pr_number.clone(),
        repository: optional_repository(args.github.repository.as_deref())?,
        event: event_context(&args.event),
    };
    let github = github_client(settings, &args.github);

    let pr_number = pr::resolve_pr_number(&config, &github).await?;
    info!(pr = pr_number, "resolved PR number");
    outputs.set("pr_number", &pr_number.to_string())?;
    Ok(())
}

async fn prepare_prompt(
    settings: &Settings,
    args: &PreparePromptArgs,
    outputs: &Outputs,
) -> Result<(), AppError> {
    let token = settings.github_token(args.github.github_token.as_deref());
    let config = PrepareConfig::new(
        args.prompt_template.as_deref(),
        args.pr_number.as_deref(),
        token.as_deref(),
        args.github.repository.as_deref(),
    )?
    .with_base_branch(args.base_branch.as_deref())
    .with_plan(args.plan.as_deref())
    .with_remote(&remote(settings, &args.git));

    let github = github_client(settings, &args.github);
    let git = git_client(&args.git);
    let prepared = prompt::prepare_prompt(&config, &github, &git).await?;
    emit_prepared(outputs, &prepared, &prepared.prompt)
}

async fn create_branch(
    settings: &Settings,
    args: &CreateBranchArgs,
    outputs: &Outputs,
) -> Result<(), AppError> {
    let prefix = util::non_blank(args.branch_prefix.as_deref())
        .or(settings.branch.prefix.as_deref())
        .unwrap_or(DEFAULT_PREFIX);
    let config = BranchConfig::new(
        args.base_branch.as_deref(),
        args.pr_number.as_deref(),
        Some(prefix),
    )?
    .with_remote(&remote(settings, &args.git));

    let branch = branch::create_branch(&config, &git_client(&args.git)).await?;
    outputs.set("branch_name", branch.as_str())?;
    Ok(())
}

async fn run_llm(settings: &Settings, args: &RunLlmArgs, outputs: &Outputs) -> Result<(), AppError> {
    let prompt = config::required("PROMPT", args.prompt.as_deref())?;
    let capture = config::parse_flag(args.capture_output.as_deref());
    let config = llm_config(settings, &args.provider, prompt, capture);

    let result = llm::run_llm(&config).await;
    if !result.success {
        return Err(AppError::Llm(result.error.unwrap_or_default()));
    }

    if let Some(output) = result.output.filter(|_| capture) {
        if let Some(path) = args.plan_file.as_ref().or(settings.plan.file.as_ref()) {
            plan::write_plan(path, &output)?;
        }
        outputs.set("output", &output)?;
    }
    Ok(())
}

fn extract_plan(settings: &Settings, args: &ExtractPlanArgs, outputs: &Outputs) -> Result<(), AppError> {
    let config = PlanConfig {
        plan_file: plan_file(settings, args.plan_file.as_deref()),
        execution_file: args
            .execution_file
            .clone()
            .or_else(|| settings.plan.execution_file.clone()),
    };
    let plan = plan::extract_plan(&config)?;
    outputs.set("plan", &plan)?;
    Ok(())
}

async fn commit_push(
    settings: &Settings,
    args: &CommitPushArgs,
    outputs: &Outputs,
) -> Result<(), AppError> {
    let mut config = CommitConfig::new(
        args.branch_name.as_deref(),
        util::non_blank(args.provider.as_deref()),
        args.pr_number.as_deref(),
    )?;
    config.remote = remote(settings, &args.git);
    config.bot_name = bot_name(settings);
    config.bot_email = bot_email(settings);

    let has_changes = commit::commit_and_push(&config, &git_client(&args.git)).await?;
    outputs.set("has_changes", &has_changes.to_string())?;
    Ok(())
}

async fn run_all(settings: &Settings, args: &RunArgs, outputs: &Outputs) -> Result<(), AppError> {
    let token = settings.github_token(args.github.github_token.as_deref());
    // Same checks, same order, as prepare-prompt; PR_NUMBER is resolved later.
    let template = config::required("PROMPT_TEMPLATE", args.prompt_template.as_deref())?;
    let token = config::required("GITHUB_TOKEN", token.as_deref())?;
    let repository = required_repository(args.github.repository.as_deref())?;

    let config = PipelineConfig {
        resolve: ResolveConfig {
            explicit: args.pr_number.clone(),
            repository: Some(repository.clone()),
            event: event_context(&args.event),
        },
        template,
        token,
        repository,
        base_branch: util::non_blank(args.base_branch.as_deref()).map(str::to_string),
        plan: util::non_blank(args.plan.as_deref()).map(str::to_string),
        plan_phase: config::parse_flag(args.plan_phase.as_deref()),
        plan_file: args.plan_file.clone().or_else(|| settings.plan.file.clone()),
        branch_prefix: util::non_blank(args.branch_prefix.as_deref())
            .or(settings.branch.prefix.as_deref())
            .unwrap_or(DEFAULT_PREFIX)
            .to_string(),
        remote: remote(settings, &args.git),
        bot_name: bot_name(settings),
        bot_email: bot_email(settings),
        llm: llm_config(settings, &args.provider, String::new(), false),
    };

    let github = github_client(settings, &args.github);
    let git = git_client(&args.git);
    let result = pipeline::run_pipeline(&config, &github, &git, &CliRunner).await?;

    emit_prepared(outputs, &result.prepared, &result.final_prompt)?;
    if let Some(plan) = &result.plan {
        outputs.set("plan", plan)?;
    }
    if let Some(output) = &result.llm_output {
        outputs.set("output", output)?;
    }
    outputs.set("branch_name", result.branch.as_str())?;
    outputs.set("has_changes", &result.has_changes.to_string())?;
    Ok(())
}

/// `final_prompt` differs from `prepared.prompt` when a generated plan was embedded.
fn emit_prepared(
    outputs: &Outputs,
    prepared: &PreparedPrompt,
    final_prompt: &str,
) -> Result<(), AppError> {
    let snapshot = &prepared.snapshot;
    outputs.set("final_prompt", final_prompt)?;
    outputs.set("pr_number", &snapshot.number.to_string())?;
    outputs.set("pr_title", &snapshot.title)?;
    outputs.set("pr_author", &snapshot.author)?;
    outputs.set("pr_body", &snapshot.body)?;
    outputs.set("base_branch", &prepared.base_branch)?;
    outputs.set("head_sha", &snapshot.head_sha)?;
    outputs.set("changed_files", &snapshot.changed_files.join("\n"))?;
    Ok(())
}

fn github_client(settings: &Settings, args: &GitHubArgs) -> GitHubClient {
    let api_url = settings.api_url(args.github_api_url.as_deref());
    let token = settings.github_token(args.github_token.as_deref());
    debug!(%api_url, authenticated = token.is_some(), "github client");
    GitHubClient::new(&api_url, token.as_deref())
}

fn git_client(args: &GitArgs) -> RealGit {
    RealGit::new(args.workdir.clone().unwrap_or_else(|| PathBuf::from(".")))
}

fn event_context(args: &EventArgs) -> EventContext {
    EventContext::load(
        args.event_name.as_deref(),
        args.event_path.as_deref(),
        args.event_pr_number.as_deref(),
        args.event_issue_number.as_deref(),
    )
}

fn remote(settings: &Settings, args: &GitArgs) -> String {
    util::non_blank(args.remote.as_deref())
        .or(settings.git.remote.as_deref())
        .unwrap_or(DEFAULT_REMOTE)
        .to_string()
}

fn bot_name(settings: &Settings) -> String {
    settings
        .git
        .bot_name
        .clone()
        .unwrap_or_else(|| DEFAULT_BOT_NAME.to_string())
}

fn bot_email(settings: &Settings) -> String {
    settings
        .git
        .bot_email
        .clone()
        .unwrap_or_else(|| DEFAULT_BOT_EMAIL.to_string())
}

fn plan_file(settings: &Settings, from_env: Option<&Path>) -> PathBuf {
    from_env
        .map(Path::to_path_buf)
        .or_else(|| settings.plan.file.clone())
        .unwrap_or_else(plan::default_plan_file)
}

fn required_repository(value: Option<&str>) -> Result<Repository, ConfigError> {
    let raw = config::required("REPOSITORY", value)?;
    parse_repository_value(&raw)
}

fn optional_repository(value: Option<&str>) -> Result<Option<Repository>, ConfigError> {
    util::non_blank(value).map(parse_repository_value).transpose()
}

fn parse_repository_value(raw: &str) -> Result<Repository, ConfigError> {
    util::parse_repository(raw).map_err(|e| ConfigError::Invalid {
        name: "REPOSITORY",
        reason: e.to_string(),
    })
}

/// Settings-file executables apply unless a flag/env value says otherwise.
fn llm_config(settings: &Settings, args: &ProviderArgs, prompt: String, capture: bool) -> RunLlmConfig {
    let defaults = RunLlmConfig::default();
    let owned = |value: &Option<String>| util::non_blank(value.as_deref()).map(str::to_string);

    RunLlmConfig {
        provider: owned(&args.provider).unwrap_or(defaults.provider),
        prompt,
        capture_output: capture,
        model: owned(&args.model),
        permission_mode: owned(&args.permission_mode),
        anthropic_api_key: owned(&args.anthropic_api_key),
        claude_oauth_token: owned(&args.claude_code_oauth_token),
        use_bedrock: config::parse_flag(args.use_bedrock.as_deref()),
        use_vertex: config::parse_flag(args.use_vertex.as_deref()),
        claude_args: owned(&args.claude_args),
        openai_api_key: owned(&args.openai_api_key),
        codex_args: owned(&args.codex_args),
        codex_sandbox: owned(&args.codex_sandbox),
        claude_executable: settings
            .llm
            .claude_executable
            .clone()
            .unwrap_or(defaults.claude_executable),
        codex_executable: settings
            .llm
            .codex_executable
            .clone()
            .unwrap_or(defaults.codex_executable),
        codex_prompt_file: defaults.codex_prompt_file,
    }
}
