use async_trait::async_trait;
use axum_helpers::Actor;

use crate::error::UserResult;
use crate::models::{NewRole, NewUser, PageRequest, Role, User};

/// Repository trait for User persistence.
///
/// Users are returned with their roles loaded. Mutations take the acting
/// principal, which the store writes into the audit columns.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a user with no roles.
    ///
    /// The login check and the insert are atomic; a taken login returns
    /// `DuplicateLogin` and leaves the store unchanged.
    async fn create(&self, user: NewUser, actor: &Actor) -> UserResult<User>;

    async fn get_by_id(&self, id: i64) -> UserResult<Option<User>>;

    async fn get_by_login(&self, login: &str) -> UserResult<Option<User>>;

    /// One page of users matching `keyword` (all users when `None`) and the
    /// total number of matches.
    async fn search(
        &self,
        keyword: Option<String>,
        page: &PageRequest,
    ) -> UserResult<(Vec<User>, u64)>;

    /// Persist name, email and password hash of an existing user.
    ///
    /// Login and roles are not touched. Returns `UserNotFound` if the id is
    /// absent.
    async fn update(&self, user: User, actor: &Actor) -> UserResult<User>;

    /// Delete a user and its role associations. Returns false if absent.
    async fn delete(&self, id: i64) -> UserResult<bool>;

    /// Associate a role; returns false if the user already held it.
    async fn add_role(&self, user_id: i64, role_id: i64, actor: &Actor) -> UserResult<bool>;

    /// Dissociate a role; returns false if the user did not hold it.
    async fn remove_role(&self, user_id: i64, role_id: i64, actor: &Actor) -> UserResult<bool>;
}

/// Repository trait for Role persistence
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RoleRepository: Send + Sync {
    async fn create(&self, role: NewRole) -> UserResult<Role>;

    async fn get_by_id(&self, id: i64) -> UserResult<Option<Role>>;

    /// All roles ordered by id
    async fn list(&self) -> UserResult<Vec<Role>>;
}
