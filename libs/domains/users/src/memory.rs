//! In-memory store for tests and database-less development.

use async_trait::async_trait;
use axum_helpers::Actor;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::{UserError, UserResult};
use crate::models::{AuditInfo, NewRole, NewUser, PageRequest, Role, RoleCode, User};
use crate::password::hash_password;
use crate::repository::{RoleRepository, UserRepository};

#[derive(Debug, Clone)]
struct UserRecord {
    id: i64,
    name: String,
    login: String,
    email: String,
    password_hash: String,
    audit: AuditInfo,
}

#[derive(Debug, Default)]
struct Tables {
    users: BTreeMap<i64, UserRecord>,
    roles: BTreeMap<i64, Role>,
    /// (user_id, role_id)
    user_roles: BTreeSet<(i64, i64)>,
    user_seq: i64,
    role_seq: i64,
}

impl Tables {
    fn next_user_id(&mut self) -> i64 {
        self.user_seq += 1;
        self.user_seq
    }

    fn next_role_id(&mut self) -> i64 {
        self.role_seq += 1;
        self.role_seq
    }

    fn assemble(&self, record: &UserRecord) -> User {
        let roles = self
            .user_roles
            .range((record.id, i64::MIN)..=(record.id, i64::MAX))
            .filter_map(|(_, role_id)| self.roles.get(role_id).cloned())
            .collect();

        User {
            id: record.id,
            name: record.name.clone(),
            login: record.login.clone(),
            email: record.email.clone(),
            password_hash: record.password_hash.clone(),
            roles,
            audit: record.audit.clone(),
        }
    }
}

/// Users and roles in one lock, so cross-table writes are atomic.
///
/// Implements both [`UserRepository`] and [`RoleRepository`]; clones share
/// the same tables. Ids start at 1.
#[derive(Debug, Default, Clone)]
pub struct InMemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store holding the default roles and the four seed accounts, the
    /// same data the seed migration writes to PostgreSQL.
    pub async fn seeded() -> UserResult<Self> {
        let store = Self::new();
        let actor = Actor::system();

        let default_role = RoleRepository::create(
            &store,
            NewRole {
                name: "Default User".to_string(),
                code: RoleCode::User,
            },
        )
        .await?;
        let admin_role = RoleRepository::create(
            &store,
            NewRole {
                name: "Administrator".to_string(),
                code: RoleCode::Admin,
            },
        )
        .await?;

        for (index, name) in SEED_USERS.iter().enumerate() {
            let login = seed_login(name);
            let user = UserRepository::create(
                &store,
                NewUser {
                    name: name.to_string(),
                    email: format!("{}@{}", login, SEED_EMAIL_DOMAIN),
                    password_hash: hash_password(&login)?,
                    login,
                },
                &actor,
            )
            .await?;

            store.add_role(user.id, default_role.id, &actor).await?;
            if index == 0 {
                store.add_role(user.id, admin_role.id, &actor).await?;
            }
        }

        tracing::info!(users = SEED_USERS.len(), "Seeded in-memory store");
        Ok(store)
    }
}

const SEED_USERS: [&str; 4] = ["Yin Guo Wei", "Liang Jian", "Wan Jon Yew", "Kwek So Cheer"];
const SEED_EMAIL_DOMAIN: &str = "cn.wilmar-intl.com";

/// "Wan Jon Yew" -> "wanjonyew"
fn seed_login(name: &str) -> String {
    name.split_whitespace().collect::<String>().to_lowercase()
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn create(&self, user: NewUser, actor: &Actor) -> UserResult<User> {
        let mut tables = self.tables.write().await;

        if tables.users.values().any(|u| u.login == user.login) {
            return Err(UserError::DuplicateLogin(user.login));
        }

        let record = UserRecord {
            id: tables.next_user_id(),
            name: user.name,
            login: user.login,
            email: user.email,
            password_hash: user.password_hash,
            audit: AuditInfo::new(actor),
        };
        tables.users.insert(record.id, record.clone());

        tracing::debug!(user_id = record.id, login = %record.login, "Created user");
        Ok(tables.assemble(&record))
    }

    async fn get_by_id(&self, id: i64) -> UserResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.get(&id).map(|r| tables.assemble(r)))
    }

    async fn get_by_login(&self, login: &str) -> UserResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|r| r.login == login)
            .map(|r| tables.assemble(r)))
    }

    async fn search(
        &self,
        keyword: Option<String>,
        page: &PageRequest,
    ) -> UserResult<(Vec<User>, u64)> {
        let tables = self.tables.read().await;
        let needle = keyword.map(|k| k.to_lowercase());

        let mut matches: Vec<User> = tables
            .users
            .values()
            .map(|r| tables.assemble(r))
            .filter(|u| needle.as_deref().is_none_or(|n| u.matches_keyword(n)))
            .collect();

        let total = matches.len() as u64;
        matches.sort_by(|a, b| page.compare(a, b));

        let content = matches
            .into_iter()
            .skip(usize::try_from(page.offset()).unwrap_or(usize::MAX))
            .take(usize::try_from(page.size).unwrap_or(usize::MAX))
            .collect();

        Ok((content, total))
    }

    async fn update(&self, user: User, actor: &Actor) -> UserResult<User> {
        let mut tables = self.tables.write().await;

        let record = tables
            .users
            .get_mut(&user.id)
            .ok_or(UserError::UserNotFound(user.id))?;
        record.name = user.name;
        record.email = user.email;
        record.password_hash = user.password_hash;
        record.audit.touch(actor);

        let record = record.clone();
        Ok(tables.assemble(&record))
    }

    async fn delete(&self, id: i64) -> UserResult<bool> {
        let mut tables = self.tables.write().await;

        if tables.users.remove(&id).is_none() {
            return Ok(false);
        }
        tables.user_roles.retain(|(user_id, _)| *user_id != id);

        tracing::debug!(user_id = id, "Deleted user");
        Ok(true)
    }

    async fn add_role(&self, user_id: i64, role_id: i64, actor: &Actor) -> UserResult<bool> {
        let mut tables = self.tables.write().await;

        if !tables.users.contains_key(&user_id) {
            return Err(UserError::UserNotFound(user_id));
        }
        if !tables.roles.contains_key(&role_id) {
            return Err(UserError::RoleNotFound(role_id));
        }
        if !tables.user_roles.insert((user_id, role_id)) {
            return Ok(false);
        }

        if let Some(record) = tables.users.get_mut(&user_id) {
            record.audit.touch(actor);
        }
        Ok(true)
    }

    async fn remove_role(&self, user_id: i64, role_id: i64, actor: &Actor) -> UserResult<bool> {
        let mut tables = self.tables.write().await;

        if !tables.user_roles.remove(&(user_id, role_id)) {
            return Ok(false);
        }

        if let Some(record) = tables.users.get_mut(&user_id) {
            record.audit.touch(actor);
        }
        Ok(true)
    }
}

#[async_trait]
impl RoleRepository for InMemoryStore {
    async fn create(&self, role: NewRole) -> UserResult<Role> {
        let mut tables = self.tables.write().await;

        let role = Role {
            id: tables.next_role_id(),
            name: role.name,
            code: role.code,
        };
        tables.roles.insert(role.id, role.clone());
        Ok(role)
    }

    async fn get_by_id(&self, id: i64) -> UserResult<Option<Role>> {
        let tables = self.tables.read().await;
        Ok(tables.roles.get(&id).cloned())
    }

    async fn list(&self) -> UserResult<Vec<Role>> {
        let tables = self.tables.read().await;
        Ok(tables.roles.values().cloned().collect())
    }
}
