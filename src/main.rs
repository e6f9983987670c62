use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use pairswap::app::{self, AppCfg};
use pairswap::application::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Config must be read before the subscriber exists, it may carry the log level
    let app_cfg = AppCfg::resolve(&cli)?;
    let filter = EnvFilter::try_new(&app_cfg.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    app::run(app_cfg, cli.command).await
}
