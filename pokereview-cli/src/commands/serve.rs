//! HTTP server command
//!
//! Resolution order for every setting: flag > environment > config file >
//! default.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use pokereview_server::db::{create_pool, migrations};
use pokereview_server::{run_server, AppConfig, AppState, MemoryStore, Storage};

/// Arguments for the serve command
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Address to bind to (default: 127.0.0.1:3030)
    #[arg(long, short = 'b')]
    pub bind: Option<SocketAddr>,

    /// Allow permissive CORS (all origins) - use with caution
    #[arg(long)]
    pub cors_permissive: bool,

    /// Database URL (overrides config/environment)
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// Serve from the in-memory store (data is lost on exit)
    #[arg(long)]
    pub in_memory: bool,

    /// Maximum database connections in the pool
    #[arg(long)]
    pub max_connections: Option<u32>,

    /// Seconds a request waits for a free database connection
    #[arg(long, value_name = "SECS")]
    pub acquire_timeout: Option<u64>,

    /// Config file (default: ~/.pokereview/config.toml)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

impl ServeArgs {
    fn resolve(&self) -> Result<AppConfig> {
        let mut config = AppConfig::load(self.config.as_deref()).context("Failed to load configuration")?;

        if let Some(bind) = self.bind {
            config.server.bind = bind;
        }
        if self.cors_permissive {
            config.server.cors_permissive = true;
        }
        if let Some(url) = &self.database_url {
            config.database.url = Some(url.clone());
        }
        if self.in_memory {
            config.storage = Storage::Memory;
        }
        if let Some(max) = self.max_connections {
            config.database.max_connections = max;
        }
        if let Some(secs) = self.acquire_timeout {
            config.database.acquire_timeout_secs = secs;
        }

        config.validate().context(
            "Invalid configuration. Set DATABASE_URL, pass --database-url, or use --in-memory",
        )?;
        Ok(config)
    }
}

/// Run the HTTP server
pub async fn run_serve(args: ServeArgs) -> Result<()> {
    let config = args.resolve()?;

    let state = match config.storage {
        Storage::Memory => {
            tracing::warn!("Using in-memory storage - data will not survive a restart");
            AppState::in_memory(MemoryStore::new())
        }
        Storage::Postgres => {
            let pool = create_pool(config.database_url()?, &config.pool_settings())
                .await
                .context("Failed to create database pool")?;

            if config.database.run_migrations {
                migrations::run(&pool).await.context("Failed to run migrations")?;
            }
            AppState::postgres(pool)
        }
    };

    tracing::info!(storage = ?config.storage, "Starting pokereview server on {}", config.server.bind);

    // Blocks until shutdown
    run_server(state, config.server_config())
        .await
        .context("Server error")?;

    Ok(())
}
