//! To-do list server library
//!
//! Users file to-do items under categories they own. Pages are rendered on
//! the server; records live in an embedded redb database.

pub mod config;
pub mod constants;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod security;
pub mod views;

pub use config::Config;
pub use db::{open_database, Db, Store, TodoStore};
pub use error::{AppError, Result};
pub use routes::build_router;

use std::sync::Arc;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn TodoStore>,
    pub config: Config,
}

impl AppState {
    /// Create a new AppState backed by the redb database
    pub fn new(db: Db, config: Config) -> Self {
        Self::with_store(Arc::new(Store::new(db)), config)
    }

    /// Create a new AppState over any store implementation
    pub fn with_store(store: Arc<dyn TodoStore>, config: Config) -> Self {
        Self { store, config }
    }
}
