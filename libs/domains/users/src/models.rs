use axum_helpers::Actor;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::str::FromStr;
use strum::{Display, EnumString};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::error::{UserError, UserResult};

/// Role codes understood by the accounts service
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    ToSchema,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum RoleCode {
    Admin,
    User,
}

/// A named permission group that users can hold.
///
/// Ordering is by `id` first, so a `BTreeSet<Role>` lists roles by id.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
pub struct Role {
    pub id: i64,
    pub name: String,
    pub code: RoleCode,
}

/// Input for inserting a role; the id is assigned by the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRole {
    pub name: String,
    pub code: RoleCode,
}

/// Who created and last modified a record, and when.
///
/// Maintained by the store from the request's [`Actor`]; never serialized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditInfo {
    pub created_at: DateTime<Utc>,
    pub created_by: String,
    pub last_modified_at: DateTime<Utc>,
    pub last_modified_by: String,
}

impl AuditInfo {
    pub fn new(actor: &Actor) -> Self {
        let now = Utc::now();
        Self {
            created_at: now,
            created_by: actor.to_string(),
            last_modified_at: now,
            last_modified_by: actor.to_string(),
        }
    }

    pub fn touch(&mut self, actor: &Actor) {
        self.last_modified_at = Utc::now();
        self.last_modified_by = actor.to_string();
    }
}

/// User entity as held by the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub name: String,
    /// Unique and immutable after creation
    pub login: String,
    pub email: String,
    /// Argon2 PHC string
    pub password_hash: String,
    pub roles: BTreeSet<Role>,
    pub audit: AuditInfo,
}

impl User {
    /// Case-insensitive substring match on login, name and email.
    ///
    /// `needle` must already be lowercase.
    pub fn matches_keyword(&self, needle: &str) -> bool {
        [&self.login, &self.name, &self.email]
            .iter()
            .any(|field| field.to_lowercase().contains(needle))
    }

    pub fn has_role(&self, role_id: i64) -> bool {
        self.roles.iter().any(|r| r.id == role_id)
    }
}

/// Input for inserting a user; the password is already hashed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub name: String,
    pub login: String,
    pub email: String,
    pub password_hash: String,
}

/// User as returned by the API: no password, no audit columns
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: i64,
    pub name: String,
    pub login: String,
    pub email: String,
    /// Ordered by role id
    pub roles: Vec<Role>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            login: user.login,
            email: user.email,
            roles: user.roles.into_iter().collect(),
        }
    }
}

/// DTO for creating a user.
///
/// Unknown fields such as `id` or `roles` are ignored; new users start
/// without roles.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateUser {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(min = 1, max = 50))]
    pub login: String,
    #[validate(email, length(max = 100))]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

/// DTO for `PATCH`: present fields overwrite, absent fields are kept
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct PatchUser {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(email, length(max = 100))]
    pub email: Option<String>,
    #[validate(length(min = 1))]
    pub password: Option<String>,
}

/// DTO for `PUT`: replaces every mutable field. Login and roles are kept.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ReplaceUser {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(email, length(max = 100))]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

/// Query string of `GET /api/users`
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UserQuery {
    /// Case-insensitive substring of login, name or email
    pub keyword: Option<String>,
    /// Zero-based page index (default 0)
    pub page: Option<u64>,
    /// Page size (default 10, at most 2000)
    pub size: Option<u64>,
    /// `property[,asc|desc]`; repeatable. Properties: id, name, login, email
    #[serde(default)]
    pub sort: Vec<String>,
}

impl UserQuery {
    /// Trimmed keyword, or `None` when absent or blank.
    pub fn keyword(&self) -> Option<String> {
        self.keyword
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string)
    }

    pub fn page_request(&self) -> UserResult<PageRequest> {
        let sort = self
            .sort
            .iter()
            .filter(|s| !s.trim().is_empty())
            .map(|s| s.parse())
            .collect::<UserResult<Vec<SortOrder>>>()?;

        Ok(PageRequest::new(
            self.page.unwrap_or(0),
            self.size.unwrap_or(PageRequest::DEFAULT_SIZE),
        )
        .with_sort(sort))
    }
}

/// Sortable user properties
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum SortField {
    Id,
    Name,
    Login,
    Email,
}

impl SortField {
    /// `ORDER BY` expression. Text columns sort case-folded in byte order so
    /// every store agrees regardless of the database collation.
    pub fn order_expr(&self) -> &'static str {
        match self {
            SortField::Id => "id",
            SortField::Name => r#"LOWER(name) COLLATE "C""#,
            SortField::Login => r#"LOWER(login) COLLATE "C""#,
            SortField::Email => r#"LOWER(email) COLLATE "C""#,
        }
    }

    /// In-memory counterpart of [`SortField::order_expr`].
    pub fn compare(&self, a: &User, b: &User) -> Ordering {
        let folded = |x: &str, y: &str| x.to_lowercase().cmp(&y.to_lowercase());
        match self {
            SortField::Id => a.id.cmp(&b.id),
            SortField::Name => folded(&a.name, &b.name),
            SortField::Login => folded(&a.login, &b.login),
            SortField::Email => folded(&a.email, &b.email),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortOrder {
    pub field: SortField,
    pub direction: Direction,
}

impl SortOrder {
    pub fn asc(field: SortField) -> Self {
        Self {
            field,
            direction: Direction::Asc,
        }
    }

    pub fn desc(field: SortField) -> Self {
        Self {
            field,
            direction: Direction::Desc,
        }
    }

    pub fn compare(&self, a: &User, b: &User) -> Ordering {
        let ordering = self.field.compare(a, b);
        match self.direction {
            Direction::Asc => ordering,
            Direction::Desc => ordering.reverse(),
        }
    }
}

/// Parses `property[,asc|desc]`.
impl FromStr for SortOrder {
    type Err = UserError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split(',').map(str::trim);
        let property = parts.next().unwrap_or_default();

        let field = property
            .parse::<SortField>()
            .map_err(|_| UserError::InvalidSort(property.to_string()))?;

        let direction = match parts.next() {
            None | Some("") => Direction::Asc,
            Some(direction) => direction
                .parse::<Direction>()
                .map_err(|_| UserError::InvalidSort(s.to_string()))?,
        };

        if parts.next().is_some() {
            return Err(UserError::InvalidSort(s.to_string()));
        }

        Ok(Self { field, direction })
    }
}

/// Page window and sort order for list queries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub size: u64,
    pub sort: Vec<SortOrder>,
}

impl PageRequest {
    pub const DEFAULT_SIZE: u64 = 10;
    pub const MAX_SIZE: u64 = 2000;
    pub const MAX_OFFSET: u64 = i64::MAX as u64;

    /// `size` is clamped to `1..=MAX_SIZE`.
    pub fn new(page: u64, size: u64) -> Self {
        Self {
            page,
            size: size.clamp(1, Self::MAX_SIZE),
            sort: Vec::new(),
        }
    }

    pub fn with_sort(mut self, sort: Vec<SortOrder>) -> Self {
        self.sort = sort;
        self
    }

    /// Rows to skip, capped at `i64::MAX` so it always fits a SQL `BIGINT`.
    pub fn offset(&self) -> u64 {
        self.page.saturating_mul(self.size).min(Self::MAX_OFFSET)
    }

    /// Requested orders followed by `id asc` unless id is already sorted on.
    pub fn orders(&self) -> Vec<SortOrder> {
        let mut orders = self.sort.clone();
        if !orders.iter().any(|o| o.field == SortField::Id) {
            orders.push(SortOrder::asc(SortField::Id));
        }
        orders
    }

    pub fn compare(&self, a: &User, b: &User) -> Ordering {
        self.orders()
            .iter()
            .map(|order| order.compare(a, b))
            .find(|ordering| ordering.is_ne())
            .unwrap_or(Ordering::Equal)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(0, Self::DEFAULT_SIZE)
    }
}

/// One page of results plus the total number of matches
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub content: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub size: u64,
}

impl<T> Page<T> {
    pub fn new(content: Vec<T>, total: u64, request: &PageRequest) -> Self {
        Self {
            content,
            total,
            page: request.page,
            size: request.size,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            content: self.content.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            size: self.size,
        }
    }
}
