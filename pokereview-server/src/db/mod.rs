//! Database layer - connection pool, sessions and repositories
//!
//! # Design Principles
//!
//! - Connection pool sized from config (`PoolSettings`), passed explicitly
//! - One `Session` (transaction) per logical write, one commit
//! - Natural keys checked up front, DB unique indexes as the backstop
//! - `memory` mirrors the same contracts for tests and `serve --in-memory`

pub mod error;
pub mod memory;
pub mod migrations;
pub mod pool;
pub mod repos;
pub mod session;

pub use error::DbError;
pub use memory::MemoryStore;
pub use pool::{
    create_pool, ping, PoolSettings, DEFAULT_ACQUIRE_TIMEOUT_SECS, DEFAULT_MAX_CONNECTIONS,
};
pub use repos::*;
pub use session::Session;
