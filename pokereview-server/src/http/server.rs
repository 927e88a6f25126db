//! Axum server setup
//!
//! Server skeleton with:
//! - Localhost-only CORS by default
//! - Tracing middleware
//! - Graceful shutdown on SIGTERM/Ctrl+C

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::HeaderValue;
use axum::Router;
use sqlx::PgPool;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::routes;
use crate::db::{
    CategoryRepository, CountryRepository, MemoryStore, OwnerRepository, PgCategoryRepo,
    PgCountryRepo, PgOwnerRepo, PgPokemonRepo, PgReviewRepo, PgReviewerRepo, PokemonRepository,
    ReviewRepository, ReviewerRepository,
};

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to (default: 127.0.0.1:3030)
    pub bind_addr: SocketAddr,

    /// Allow permissive CORS (default: false = localhost only)
    ///
    /// WARNING: Setting this to true allows any origin.
    pub cors_permissive: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3030)),
            cors_permissive: false,
        }
    }
}

/// Store behind the repositories, kept for health checks.
#[derive(Clone)]
pub enum Backend {
    Postgres(PgPool),
    Memory,
}

impl Backend {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Postgres(_) => "postgres",
            Self::Memory => "memory",
        }
    }
}

/// Shared application state: one repository per entity.
#[derive(Clone)]
pub struct AppState {
    pub backend: Backend,
    pub categories: Arc<dyn CategoryRepository>,
    pub countries: Arc<dyn CountryRepository>,
    pub owners: Arc<dyn OwnerRepository>,
    pub pokemon: Arc<dyn PokemonRepository>,
    pub reviews: Arc<dyn ReviewRepository>,
    pub reviewers: Arc<dyn ReviewerRepository>,
}

impl AppState {
    /// PostgreSQL repositories sharing one pool.
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            categories: Arc::new(PgCategoryRepo::new(pool.clone())),
            countries: Arc::new(PgCountryRepo::new(pool.clone())),
            owners: Arc::new(PgOwnerRepo::new(pool.clone())),
            pokemon: Arc::new(PgPokemonRepo::new(pool.clone())),
            reviews: Arc::new(PgReviewRepo::new(pool.clone())),
            reviewers: Arc::new(PgReviewerRepo::new(pool.clone())),
            backend: Backend::Postgres(pool),
        }
    }

    /// Every repository backed by the same in-memory tables.
    pub fn in_memory(store: MemoryStore) -> Self {
        Self {
            categories: Arc::new(store.clone()),
            countries: Arc::new(store.clone()),
            owners: Arc::new(store.clone()),
            pokemon: Arc::new(store.clone()),
            reviews: Arc::new(store.clone()),
            reviewers: Arc::new(store),
            backend: Backend::Memory,
        }
    }
}

fn cors_layer(permissive: bool) -> CorsLayer {
    if permissive {
        tracing::warn!("CORS: Permissive mode enabled - all origins allowed");
        return CorsLayer::permissive();
    }

    // Localhost only
    CorsLayer::new()
        .allow_origin([
            HeaderValue::from_static("http://localhost:3000"),
            HeaderValue::from_static("http://localhost:3030"),
            HeaderValue::from_static("http://127.0.0.1:3000"),
            HeaderValue::from_static("http://127.0.0.1:3030"),
        ])
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Assemble every route with CORS and request tracing.
pub fn build_router(state: AppState, config: &ServerConfig) -> Router {
    Router::new()
        .merge(routes::health::router())
        .merge(routes::categories::router())
        .merge(routes::countries::router())
        .merge(routes::owners::router())
        .merge(routes::pokemon::router())
        .merge(routes::reviews::router())
        .merge(routes::reviewers::router())
        .layer(cors_layer(config.cors_permissive))
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

/// Run the HTTP server.
///
/// # Example
///
/// ```ignore
/// let pool = create_pool(&database_url, &PoolSettings::default()).await?;
/// run_server(AppState::postgres(pool), ServerConfig::default()).await?;
/// ```
pub async fn run_server(state: AppState, config: ServerConfig) -> Result<(), ServerError> {
    let app = build_router(state, &config);

    let listener = TcpListener::bind(config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting shutdown");
        }
    }
}

/// Server error type
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_addr.port(), 3030);
        assert!(!config.cors_permissive);
    }
}
