//! Schema migration command

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use pokereview_server::db::{create_pool, migrations};
use pokereview_server::AppConfig;

/// Arguments for the migrate command
#[derive(Parser, Debug)]
pub struct MigrateArgs {
    /// Database URL (overrides config/environment)
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// Config file (default: ~/.pokereview/config.toml)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

pub async fn run_migrate(args: MigrateArgs) -> Result<()> {
    let mut config = AppConfig::load(args.config.as_deref()).context("Failed to load configuration")?;
    if let Some(url) = args.database_url {
        config.database.url = Some(url);
    }

    let url = config
        .database_url()
        .context("DATABASE_URL not set. Set via --database-url, DATABASE_URL env, or ~/.pokereview/.env")?;
    let pool = create_pool(url, &config.pool_settings())
        .await
        .context("Failed to create database pool")?;

    migrations::run(&pool).await.context("Failed to run migrations")?;
    tracing::info!("Schema is up to date ({} statements)", migrations::STATEMENTS.len());
    Ok(())
}
