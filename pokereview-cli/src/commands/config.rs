//! Configuration inspection

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use pokereview_server::AppConfig;

#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print the default config file location
    Path,
    /// Print the effective configuration (file + environment), password masked
    Show {
        /// Config file (default: ~/.pokereview/config.toml)
        #[arg(long, value_name = "PATH")]
        config: Option<PathBuf>,
    },
}

pub fn run_config(args: ConfigArgs) -> Result<()> {
    match args.command {
        ConfigCommand::Path => {
            let path = AppConfig::default_path();
            let marker = if path.exists() { "" } else { " (not created)" };
            println!("{}{}", path.display(), marker);
        }
        ConfigCommand::Show { config } => {
            let config = AppConfig::load(config.as_deref()).context("Failed to load configuration")?;
            print!("{}", config.to_redacted_toml()?);
        }
    }
    Ok(())
}
