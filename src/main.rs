use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use pr_autopilot::cli::Cli;
use pr_autopilot::{app, output, util};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    info!(command = cli.command.name(), "starting");

    if let Err(err) = app::run(cli).await {
        let message = util::error_message(&err);
        error!(%message, "stage failed");
        output::report_failure(&message);
        std::process::exit(1);
    }
}
