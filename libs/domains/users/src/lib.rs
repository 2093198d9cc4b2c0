//! Users Domain
//!
//! User accounts, their role assignments and the role catalogue.
//!
//! # Features
//!
//! - User CRUD with keyword search, paging and sorting
//! - Password hashing with Argon2 (hashes are never serialized)
//! - Role grant and revoke, both idempotent
//! - Audit fields stamped from the `x-actor` request header
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  ← HTTP endpoints, audit events, response headers
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Service   │  ← Not-found rules, password hashing
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │ Repository  │  ← Traits + Postgres and in-memory stores
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Models    │  ← Entities, DTOs, paging
//! └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use domain_users::{InMemoryStore, RoleService, UserService, handlers};
//!
//! let store = InMemoryStore::new();
//! let users = handlers::users_router(UserService::new(store.clone(), store.clone()));
//! let roles = handlers::roles_router(RoleService::new(store));
//! ```

pub mod error;
pub mod handlers;
pub mod memory;
pub mod models;
pub mod password;
pub mod postgres;
pub mod repository;
pub mod service;

pub use error::{UserError, UserResult};
pub use handlers::{RolesApiDoc, UsersApiDoc};
pub use memory::InMemoryStore;
pub use models::{
    CreateUser, Page, PageRequest, PatchUser, ReplaceUser, Role, RoleCode, SortOrder, User,
    UserQuery, UserResponse,
};
pub use postgres::{PgRoleRepository, PgUserRepository};
pub use repository::{RoleRepository, UserRepository};
pub use service::{RoleService, UserService};
