use std::path::PathBuf;

use thiserror::Error;
use tracing::{info, info_span, instrument, Instrument};

use crate::branch::{self, BranchConfig, BranchError, BranchName};
use crate::commit::{self, CommitConfig, CommitError};
use crate::git::Git;
use crate::github::GitHubApi;
use crate::llm::{codex, LlmRunner, Provider, RunLlmConfig};
use crate::plan::{self, PlanError};
use crate::pr::{self, PrError, ResolveConfig};
use crate::prompt::{self, PrepareConfig, PreparedPrompt, PromptError};
use crate::util::Repository;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Pr(#[from] PrError),

    #[error(transparent)]
    Prompt(#[from] PromptError),

    #[error(transparent)]
    Plan(#[from] PlanError),

    #[error(transparent)]
    Branch(#[from] BranchError),

    #[error("{phase} run failed: {error}")]
    Llm { phase: &'static str, error: String },

    #[error(transparent)]
    Commit(#[from] CommitError),
}

/// Inputs for running every stage in one process.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub resolve: ResolveConfig,
    pub template: String,
    pub token: String,
    pub repository: Repository,
    pub base_branch: Option<String>,
    /// Plan supplied from outside; ignored when `plan_phase` is set.
    pub plan: Option<String>,
    /// Run a capture-mode LLM pass first and embed its output.
    pub plan_phase: bool,
    /// Where to leave a copy of the generated plan.
    pub plan_file: Option<PathBuf>,
    pub branch_prefix: String,
    pub remote: String,
    pub bot_name: String,
    pub bot_email: String,
    /// Provider settings; prompt and capture mode are filled in per phase.
    pub llm: RunLlmConfig,
}

/// Everything the stages produced, threaded in-process.
#[derive(Debug, Clone)]
pub struct PipelineResult {
    pub pr_number: u64,
    pub prepared: PreparedPrompt,
    pub plan: Option<String>,
    /// Prompt given to the implementation run
    pub final_prompt: String,
    pub branch: BranchName,
    /// Captured output of the implementation run, if any
    pub llm_output: Option<String>,
    pub has_changes: bool,
}

#[instrument(skip_all, fields(repo = %config.repository, provider = %config.llm.provider))]
pub async fn run_pipeline(
    config: &PipelineConfig,
    github: &dyn GitHubApi,
    git: &dyn Git,
    llm: &dyn LlmRunner,
) -> Result<PipelineResult, PipelineError> {
    check_provider(&config.llm.provider)?;
    let pr_number = pr::resolve_pr_number(&config.resolve, github).await?;

    let prepare = PrepareConfig {
        template: config.template.clone(),
        pr_number,
        token: config.token.clone(),
        repository: config.repository.clone(),
        base_branch: config.base_branch.clone(),
        plan: if config.plan_phase { None } else { config.plan.clone() },
        remote: config.remote.clone(),
    };
    let prepared = prompt::prepare_prompt(&prepare, github, git).await?;

    let plan = if config.plan_phase {
        let plan = run_plan_phase(config, &prepared.prompt, llm)
            .instrument(info_span!("plan_phase"))
            .await?;
        if let Some(path) = &config.plan_file {
            plan::write_plan(path, &plan)?;
        }
        Some(plan)
    } else {
        None
    };
    let final_prompt = prompt::embed_plan(&prepared.prompt, plan.as_deref());

    let branch_config = BranchConfig {
        base_branch: prepared.base_branch.clone(),
        pr_number,
        prefix: config.branch_prefix.clone(),
        remote: config.remote.clone(),
    };
    let branch = branch::create_branch(&branch_config, git).await?;

    let implement = RunLlmConfig {
        prompt: final_prompt.clone(),
        capture_output: false,
        ..config.llm.clone()
    };
    let result = llm.run(&implement).instrument(info_span!("implement_phase")).await;
    if !result.success {
        return Err(PipelineError::Llm {
            phase: "Implementation",
            error: result.error.unwrap_or_default(),
        });
    }

    let commit_config = CommitConfig {
        branch_name: branch.to_string(),
        provider: config.llm.provider.clone(),
        pr_number: Some(pr_number),
        remote: config.remote.clone(),
        bot_name: config.bot_name.clone(),
        bot_email: config.bot_email.clone(),
    };
    let has_changes = commit::commit_and_push(&commit_config, git).await?;
    info!(pr = pr_number, %branch, has_changes, "pipeline finished");

    Ok(PipelineResult {
        pr_number,
        prepared,
        plan,
        final_prompt,
        branch,
        llm_output: result.output,
        has_changes,
    })
}

/// Fail before touching the working tree when the implementation run
/// cannot succeed.
fn check_provider(provider: &str) -> Result<(), PipelineError> {
    let error = match provider.parse::<Provider>() {
        Ok(Provider::Claude) => return Ok(()),
        Ok(Provider::Codex) => codex::IMPLEMENTATION_UNSUPPORTED.to_string(),
        Err(error) => error,
    };
    Err(PipelineError::Llm {
        phase: "Implementation",
        error,
    })
}

/// Capture-mode run whose output becomes the plan, read-only in Claude's
/// `plan` permission mode.
async fn run_plan_phase(
    config: &PipelineConfig,
    prompt: &str,
    llm: &dyn LlmRunner,
) -> Result<String, PipelineError> {
    let planning = RunLlmConfig {
        prompt: prompt.to_string(),
        capture_output: true,
        permission_mode: Some("plan".to_string()),
        ..config.llm.clone()
    };

    let result = llm.run(&planning).await;
    let plan = match (result.success, result.output) {
        (true, Some(output)) if !output.trim().is_empty() => output,
        (true, _) => {
            return Err(PipelineError::Llm {
                phase: "Planning",
                error: "no plan text was produced".to_string(),
            })
        }
        (false, _) => {
            return Err(PipelineError::Llm {
                phase: "Planning",
                error: result.error.unwrap_or_default(),
            })
        }
    };
    info!(chars = plan.len(), "generated plan");
    Ok(plan)
}
