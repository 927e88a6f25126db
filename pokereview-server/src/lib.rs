//! pokereview-server: HTTP API for the pokemon review catalogue
//!
//! Six resources (categories, countries, owners, pokemon, reviews,
//! reviewers) behind one repository trait each, backed by PostgreSQL or an
//! in-memory store.

pub mod config;
pub mod db;
pub mod http;
pub mod models;

pub use config::{AppConfig, ConfigError, Storage};
pub use db::{DbError, MemoryStore};
pub use http::{build_router, run_server, ApiError, AppState, ServerConfig, ServerError};
