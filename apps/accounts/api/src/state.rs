//! Application state management.
//!
//! The state is built once in `main` and borrowed by the routers that
//! construct the domain services.

use database::postgres::DatabaseConnection;
use domain_users::InMemoryStore;

/// The store backing every repository
#[derive(Clone)]
pub enum Store {
    Postgres(DatabaseConnection),
    Memory(InMemoryStore),
}

/// Shared application state.
///
/// Cloning is cheap: the connection pool and the in-memory tables are both
/// reference counted.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration loaded from environment variables
    pub config: crate::config::Config,
    pub store: Store,
}
