// src/app.rs
use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::{debug, info};

use crate::application::commands::{Cli, CommandExecutor, Commands};
use crate::config::Config;

pub const DEFAULT_STATE_FILE: &str = "pool-state.json";
pub const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Clone)]
pub struct AppCfg {
    pub config: Config,
    pub state_file: PathBuf,
    pub log_level: String,
}

impl AppCfg {
    /// Priority: CLI args > config file > defaults
    pub fn resolve(cli: &Cli) -> Result<Self> {
        let config = match &cli.config {
            Some(path) => Config::from_file(path)?,
            None => Config::default(),
        };

        let state_file = cli
            .state
            .clone()
            .or_else(|| config.state_file.clone())
            .unwrap_or_else(|| DEFAULT_STATE_FILE.to_string());
        let log_level = cli
            .log_level
            .clone()
            .or_else(|| config.log_level.clone())
            .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());

        Ok(Self {
            config,
            state_file: PathBuf::from(state_file),
            log_level,
        })
    }
}

pub async fn run(app_cfg: AppCfg, command: Commands) -> Result<()> {
    debug!("Configuration: {:?}", app_cfg);
    info!("Using state file {}", app_cfg.state_file.display());

    let output = CommandExecutor::execute(command, &app_cfg).await?;
    let rendered = serde_json::to_string_pretty(&output).context("render command output")?;
    println!("{}", rendered);
    Ok(())
}
