use axum_helpers::Actor;
use std::sync::Arc;

use crate::error::{UserError, UserResult};
use crate::models::{
    CreateUser, NewUser, Page, PatchUser, ReplaceUser, Role, User, UserQuery, UserResponse,
};
use crate::password::hash_password;
use crate::repository::{RoleRepository, UserRepository};

/// Service layer for User business logic.
///
/// Owns password hashing and the not-found rules; login uniqueness is left
/// to the repository so the check stays atomic with the insert.
pub struct UserService<U: UserRepository, R: RoleRepository> {
    users: Arc<U>,
    roles: Arc<R>,
}

impl<U: UserRepository, R: RoleRepository> UserService<U, R> {
    pub fn new(users: U, roles: R) -> Self {
        Self {
            users: Arc::new(users),
            roles: Arc::new(roles),
        }
    }

    /// Page of users matching the query's keyword; never fails on no match.
    pub async fn list(&self, query: UserQuery) -> UserResult<Page<UserResponse>> {
        let page = query.page_request()?;
        let (users, total) = self.users.search(query.keyword(), &page).await?;
        Ok(Page::new(users, total, &page).map(UserResponse::from))
    }

    pub async fn get(&self, id: i64) -> UserResult<UserResponse> {
        Ok(self.find(id).await?.into())
    }

    pub async fn create(&self, input: CreateUser, actor: &Actor) -> UserResult<UserResponse> {
        let password_hash = hash_password(&input.password)?;

        let user = self
            .users
            .create(
                NewUser {
                    name: input.name,
                    login: input.login,
                    email: input.email,
                    password_hash,
                },
                actor,
            )
            .await?;

        tracing::info!(user_id = user.id, login = %user.login, actor = %actor, "Created user");
        Ok(user.into())
    }

    /// Overwrite the fields present in `input`; login is never changed.
    pub async fn partial_update(
        &self,
        id: i64,
        input: PatchUser,
        actor: &Actor,
    ) -> UserResult<UserResponse> {
        let mut user = self.find(id).await?;

        if let Some(name) = input.name {
            user.name = name;
        }
        if let Some(email) = input.email {
            user.email = email;
        }
        if let Some(password) = input.password {
            user.password_hash = hash_password(&password)?;
        }

        let updated = self.users.update(user, actor).await?;
        tracing::info!(user_id = id, actor = %actor, "Patched user");
        Ok(updated.into())
    }

    /// Replace name, email and password; login and roles are kept.
    pub async fn full_update(
        &self,
        id: i64,
        input: ReplaceUser,
        actor: &Actor,
    ) -> UserResult<UserResponse> {
        let mut user = self.find(id).await?;

        user.name = input.name;
        user.email = input.email;
        user.password_hash = hash_password(&input.password)?;

        let updated = self.users.update(user, actor).await?;
        tracing::info!(user_id = id, actor = %actor, "Replaced user");
        Ok(updated.into())
    }

    pub async fn delete(&self, id: i64, actor: &Actor) -> UserResult<()> {
        if !self.users.delete(id).await? {
            return Err(UserError::UserNotFound(id));
        }

        tracing::info!(user_id = id, actor = %actor, "Deleted user");
        Ok(())
    }

    /// Grant a role. Granting a role the user already holds changes nothing.
    pub async fn add_role(
        &self,
        user_id: i64,
        role_id: i64,
        actor: &Actor,
    ) -> UserResult<UserResponse> {
        let user = self.find(user_id).await?;
        self.find_role(role_id).await?;

        if user.has_role(role_id) {
            return Ok(user.into());
        }

        self.users.add_role(user_id, role_id, actor).await?;
        tracing::info!(user_id, role_id, actor = %actor, "Added role to user");

        self.get(user_id).await
    }

    /// Revoke a role. Succeeds when the user did not hold it.
    pub async fn remove_role(&self, user_id: i64, role_id: i64, actor: &Actor) -> UserResult<()> {
        self.find(user_id).await?;
        self.find_role(role_id).await?;

        if self.users.remove_role(user_id, role_id, actor).await? {
            tracing::info!(user_id, role_id, actor = %actor, "Removed role from user");
        }
        Ok(())
    }

    async fn find(&self, id: i64) -> UserResult<User> {
        self.users
            .get_by_id(id)
            .await?
            .ok_or(UserError::UserNotFound(id))
    }

    async fn find_role(&self, id: i64) -> UserResult<Role> {
        self.roles
            .get_by_id(id)
            .await?
            .ok_or(UserError::RoleNotFound(id))
    }
}

/// Service layer for read-only Role access
pub struct RoleService<R: RoleRepository> {
    repository: Arc<R>,
}

impl<R: RoleRepository> RoleService<R> {
    pub fn new(repository: R) -> Self {
        Self {
            repository: Arc::new(repository),
        }
    }

    /// All roles ordered by id, unpaginated
    pub async fn list_roles(&self) -> UserResult<Vec<Role>> {
        self.repository.list().await
    }
}
