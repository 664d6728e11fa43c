use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use colored::Colorize;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write output file: {0}")]
    FileWrite(#[from] std::io::Error),

    #[error("Output value for '{0}' contains the heredoc delimiter")]
    DelimiterCollision(String),
}

/// Named step outputs. Written to the `GITHUB_OUTPUT` file when one is
/// configured, printed to stdout otherwise.
#[derive(Debug, Clone, Default)]
pub struct Outputs {
    sink: Option<PathBuf>,
}

impl Outputs {
    pub fn new(sink: Option<PathBuf>) -> Self {
        Self { sink }
    }

    pub fn from_env() -> Self {
        let sink = std::env::var_os("GITHUB_OUTPUT")
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);
        Self::new(sink)
    }

    pub fn set(&self, key: &str, value: &str) -> Result<(), OutputError> {
        match &self.sink {
            Some(path) => {
                debug!(key, path = %path.display(), "writing output");
                let delimiter = format!("ghadelimiter_{}", uuid::Uuid::new_v4());
                let entry = format_entry(key, value, &delimiter)?;
                append(path, &entry)
            }
            None => {
                println!("{}: {}", key.bold(), value);
                Ok(())
            }
        }
    }
}

/// `key=value`, or the heredoc form for multi-line values.
fn format_entry(key: &str, value: &str, delimiter: &str) -> Result<String, OutputError> {
    if !value.contains('\n') && !value.contains('\r') {
        return Ok(format!("{key}={value}\n"));
    }
    if value.contains(delimiter) {
        return Err(OutputError::DelimiterCollision(key.to_string()));
    }
    Ok(format!("{key}<<{delimiter}\n{value}\n{delimiter}\n"))
}

fn append(path: &Path, entry: &str) -> Result<(), OutputError> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(entry.as_bytes())?;
    Ok(())
}

/// Escape a message for a `::error::` workflow command.
pub fn escape_command_value(message: &str) -> String {
    message
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

/// Best-effort failure report to the workflow runner. No-op outside Actions.
pub fn report_failure(message: &str) {
    if std::env::var("GITHUB_ACTIONS").is_ok_and(|v| v == "true") {
        println!("::error::{}", escape_command_value(message));
    }
}
