use tracing::{debug, info, instrument};

use super::types::{ExtraArgs, LlmResult, RunLlmConfig};
use super::{cli_available, execute};
use crate::util;

pub const IMPLEMENTATION_UNSUPPORTED: &str =
    "Codex implementation mode is not supported by run-llm; run it with the openai/codex-action instead";

/// Only planning (capture) runs go through here; implementation runs use
/// the dedicated Codex action.
#[instrument(skip_all, fields(capture = config.capture_output))]
pub async fn run(config: &RunLlmConfig) -> LlmResult {
    if !config.capture_output {
        return LlmResult::failed(IMPLEMENTATION_UNSUPPORTED);
    }

    let Some(api_key) = util::non_blank(config.openai_api_key.as_deref()) else {
        return LlmResult::failed("OPENAI_API_KEY is required for the codex provider");
    };

    if !cli_available(&config.codex_executable) {
        return LlmResult::failed(format!(
            "Codex CLI '{}' not found. Install it with: npm install -g @openai/codex",
            config.codex_executable
        ));
    }

    if let Err(err) = tokio::fs::write(&config.codex_prompt_file, &config.prompt).await {
        return LlmResult::failed(format!(
            "Failed to write prompt file {}: {err}",
            config.codex_prompt_file.display()
        ));
    }
    debug!(path = %config.codex_prompt_file.display(), "wrote codex prompt file");

    let args = build_args(config);
    let envs = vec![("OPENAI_API_KEY".to_string(), api_key.to_string())];
    info!("running codex exec");

    match execute(&config.codex_executable, &args, &envs, true).await {
        Ok(output) => LlmResult::succeeded(output),
        Err(error) => LlmResult::failed(error),
    }
}

/// `exec [--sandbox S] [extra...] <prompt file>`
pub fn build_args(config: &RunLlmConfig) -> Vec<String> {
    let mut args = vec!["exec".to_string()];
    if let Some(sandbox) = util::non_blank(config.codex_sandbox.as_deref()) {
        args.extend(["--sandbox".to_string(), sandbox.to_string()]);
    }
    if let Some(extra) = util::non_blank(config.codex_args.as_deref()) {
        args.extend(ExtraArgs::parse(extra).into_vec());
    }
    args.push(config.codex_prompt_file.to_string_lossy().into_owned());
    args
}
