pub mod app;
pub mod branch;
pub mod cli;
pub mod commit;
pub mod config;
pub mod git;
pub mod github;
pub mod llm;
pub mod output;
pub mod pipeline;
pub mod plan;
pub mod pr;
pub mod prompt;
pub mod util;
