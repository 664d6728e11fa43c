use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Error)]
pub enum PlanError {
    #[error("Plan file not found or empty: {}", .0.display())]
    Missing(PathBuf),

    #[error(
        "Plan file not found or empty: {}; no assistant text in execution log {}",
        .plan_file.display(),
        .execution_file.display()
    )]
    MissingEverywhere {
        plan_file: PathBuf,
        execution_file: PathBuf,
    },

    #[error("Failed to write plan file {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Default plan location, `<temp-dir>/plan.txt`.
pub fn default_plan_file() -> PathBuf {
    std::env::temp_dir().join("plan.txt")
}

#[derive(Debug, Clone)]
pub struct PlanConfig {
    pub plan_file: PathBuf,
    /// Structured execution log scanned when the plan file has nothing.
    pub execution_file: Option<PathBuf>,
}

impl Default for PlanConfig {
    fn default() -> Self {
        Self {
            plan_file: default_plan_file(),
            execution_file: None,
        }
    }
}

/// Read the plan produced by a planning run.
#[instrument(skip_all, fields(plan_file = %config.plan_file.display()))]
pub fn extract_plan(config: &PlanConfig) -> Result<String, PlanError> {
    if let Some(plan) = read_non_blank(&config.plan_file) {
        info!(chars = plan.len(), "read plan from file");
        return Ok(plan);
    }

    let Some(execution_file) = &config.execution_file else {
        return Err(PlanError::Missing(config.plan_file.clone()));
    };

    debug!(execution_file = %execution_file.display(), "plan file empty, scanning execution log");
    let plan = std::fs::read_to_string(execution_file)
        .ok()
        .and_then(|contents| plan_from_execution_log(&contents));
    match plan {
        Some(plan) => {
            info!(chars = plan.len(), "read plan from execution log");
            Ok(plan)
        }
        None => Err(PlanError::MissingEverywhere {
            plan_file: config.plan_file.clone(),
            execution_file: execution_file.clone(),
        }),
    }
}

fn read_non_blank(path: &Path) -> Option<String> {
    match std::fs::read_to_string(path) {
        Ok(contents) => {
            let trimmed = contents.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Err(err) => {
            debug!(path = %path.display(), error = %err, "plan file unreadable");
            None
        }
    }
}

/// Join the text of every assistant message in a JSON execution log.
///
/// Expected shape: `[{"type": "assistant", "message": {"content": [{"type": "text", "text": "..."}]}}, ...]`.
/// Entries of any other shape are skipped.
pub fn plan_from_execution_log(contents: &str) -> Option<String> {
    let entries: Vec<Value> = match serde_json::from_str(contents) {
        Ok(Value::Array(entries)) => entries,
        Ok(_) => {
            warn!("execution log is not a JSON array");
            return None;
        }
        Err(err) => {
            warn!(error = %err, "execution log is not valid JSON");
            return None;
        }
    };

    let segments: Vec<&str> = entries
        .iter()
        .filter(|entry| entry.get("type").and_then(Value::as_str) == Some("assistant"))
        .filter_map(|entry| entry.pointer("/message/content").and_then(Value::as_array))
        .flatten()
        .filter(|item| item.get("type").and_then(Value::as_str) == Some("text"))
        .filter_map(|item| item.get("text").and_then(Value::as_str))
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .collect();

    (!segments.is_empty()).then(|| segments.join("\n\n"))
}

/// Persist a plan for a later process to pick up.
pub fn write_plan(path: &Path, plan: &str) -> Result<(), PlanError> {
    std::fs::write(path, plan).map_err(|source| PlanError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), "wrote plan file");
    Ok(())
}
