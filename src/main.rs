use anyhow::Result;
use clap::Parser;
use navwatch::cli::Cli;
use navwatch::dispatcher::dispatch_command;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging; stdout is reserved for report output
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    dispatch_command(cli).await
}
