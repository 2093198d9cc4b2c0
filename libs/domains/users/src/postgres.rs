use async_trait::async_trait;
use axum_helpers::Actor;
use chrono::{DateTime, Utc};
use sea_orm::{
    ConnectionTrait, DatabaseConnection, DbBackend, DbErr, FromQueryResult, SqlErr, Statement,
    TransactionTrait, Value,
};
use std::collections::{BTreeSet, HashMap};

use crate::error::{UserError, UserResult};
use crate::models::{AuditInfo, Direction, NewRole, NewUser, PageRequest, Role, RoleCode, User};
use crate::repository::{RoleRepository, UserRepository};

const USER_COLUMNS: &str = "id, name, login, email, password_hash, \
     created_at, created_by, last_modified_at, last_modified_by";

#[derive(Debug, FromQueryResult)]
struct UserRow {
    id: i64,
    name: String,
    login: String,
    email: String,
    password_hash: String,
    created_at: DateTime<Utc>,
    created_by: String,
    last_modified_at: DateTime<Utc>,
    last_modified_by: String,
}

impl UserRow {
    fn into_user(self, roles: BTreeSet<Role>) -> User {
        User {
            id: self.id,
            name: self.name,
            login: self.login,
            email: self.email,
            password_hash: self.password_hash,
            roles,
            audit: AuditInfo {
                created_at: self.created_at,
                created_by: self.created_by,
                last_modified_at: self.last_modified_at,
                last_modified_by: self.last_modified_by,
            },
        }
    }
}

#[derive(Debug, FromQueryResult)]
struct RoleRow {
    id: i64,
    name: String,
    code: String,
}

impl TryFrom<RoleRow> for Role {
    type Error = UserError;

    fn try_from(row: RoleRow) -> Result<Self, Self::Error> {
        let code = row
            .code
            .parse::<RoleCode>()
            .map_err(|_| UserError::Store(format!("unknown role code '{}'", row.code)))?;

        Ok(Role {
            id: row.id,
            name: row.name,
            code,
        })
    }
}

#[derive(Debug, FromQueryResult)]
struct UserRoleRow {
    user_id: i64,
    id: i64,
    name: String,
    code: String,
}

#[derive(Debug, FromQueryResult)]
struct CountRow {
    count: i64,
}

fn statement(sql: &str, values: impl IntoIterator<Item = Value>) -> Statement {
    Statement::from_sql_and_values(DbBackend::Postgres, sql, values)
}

/// `%keyword%` for `LOWER(col) LIKE $1 ESCAPE '\'`, with `\`, `%` and `_`
/// matched literally.
fn like_pattern(keyword: &str) -> String {
    let mut pattern = String::with_capacity(keyword.len() + 2);
    pattern.push('%');
    for c in keyword.to_lowercase().chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// `ORDER BY` body built from whitelisted columns only.
fn order_by(page: &PageRequest) -> String {
    page.orders()
        .iter()
        .map(|order| {
            let direction = match order.direction {
                Direction::Asc => "ASC",
                Direction::Desc => "DESC",
            };
            format!("{} {}", order.field.order_expr(), direction)
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// A grant that loses the race with a user delete violates the `user_id`
/// foreign key. Roles are never deleted, so that is always a missing user.
fn grant_error(err: DbErr, user_id: i64) -> UserError {
    match err.sql_err() {
        Some(SqlErr::ForeignKeyConstraintViolation(_)) => UserError::UserNotFound(user_id),
        _ => err.into(),
    }
}

/// `LIMIT` / `OFFSET` clause; both values fit a `BIGINT`.
fn window(page: &PageRequest) -> String {
    format!("LIMIT {} OFFSET {}", page.size, page.offset())
}

/// Roles of each given user, keyed by user id.
async fn load_roles<C: ConnectionTrait>(
    conn: &C,
    user_ids: Vec<i64>,
) -> UserResult<HashMap<i64, BTreeSet<Role>>> {
    let mut roles: HashMap<i64, BTreeSet<Role>> = HashMap::new();
    if user_ids.is_empty() {
        return Ok(roles);
    }

    let rows = UserRoleRow::find_by_statement(statement(
        r#"
        SELECT ur.user_id, r.id, r.name, r.code
        FROM user_roles ur
        JOIN roles r ON r.id = ur.role_id
        WHERE ur.user_id = ANY($1)
        "#,
        [user_ids.into()],
    ))
    .all(conn)
    .await?;

    for row in rows {
        let role = Role::try_from(RoleRow {
            id: row.id,
            name: row.name,
            code: row.code,
        })?;
        roles.entry(row.user_id).or_default().insert(role);
    }

    Ok(roles)
}

async fn with_roles<C: ConnectionTrait>(conn: &C, row: UserRow) -> UserResult<User> {
    let mut roles = load_roles(conn, vec![row.id]).await?;
    let user_roles = roles.remove(&row.id).unwrap_or_default();
    Ok(row.into_user(user_roles))
}

/// PostgreSQL implementation of UserRepository using raw SQL through SeaORM
#[derive(Clone)]
pub struct PgUserRepository {
    db: DatabaseConnection,
}

impl PgUserRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn find_one(&self, sql: &str, value: Value) -> UserResult<Option<User>> {
        let row = UserRow::find_by_statement(statement(sql, [value]))
            .one(&self.db)
            .await?;

        match row {
            Some(row) => Ok(Some(with_roles(&self.db, row).await?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create(&self, user: NewUser, actor: &Actor) -> UserResult<User> {
        let sql = format!(
            r#"
            INSERT INTO users (name, login, email, password_hash, created_by, last_modified_by)
            VALUES ($1, $2, $3, $4, $5, $5)
            ON CONFLICT (login) DO NOTHING
            RETURNING {USER_COLUMNS}
            "#
        );

        let row = UserRow::find_by_statement(statement(
            &sql,
            [
                user.name.into(),
                user.login.clone().into(),
                user.email.into(),
                user.password_hash.into(),
                actor.as_str().into(),
            ],
        ))
        .one(&self.db)
        .await?
        .ok_or(UserError::DuplicateLogin(user.login))?;

        tracing::debug!(user_id = row.id, login = %row.login, "Created user");
        Ok(row.into_user(BTreeSet::new()))
    }

    async fn get_by_id(&self, id: i64) -> UserResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        self.find_one(&sql, id.into()).await
    }

    async fn get_by_login(&self, login: &str) -> UserResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE login = $1");
        self.find_one(&sql, login.into()).await
    }

    async fn search(
        &self,
        keyword: Option<String>,
        page: &PageRequest,
    ) -> UserResult<(Vec<User>, u64)> {
        let (filter, values): (&str, Vec<Value>) = match keyword {
            Some(keyword) => (
                r#"WHERE LOWER(login) LIKE $1 ESCAPE '\'
                   OR LOWER(name) LIKE $1 ESCAPE '\'
                   OR LOWER(email) LIKE $1 ESCAPE '\'"#,
                vec![like_pattern(&keyword).into()],
            ),
            None => ("", Vec::new()),
        };

        let count = CountRow::find_by_statement(statement(
            &format!("SELECT COUNT(*) AS count FROM users {filter}"),
            values.clone(),
        ))
        .one(&self.db)
        .await?
        .map(|row| row.count)
        .unwrap_or(0);

        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users {filter} ORDER BY {} {}",
            order_by(page),
            window(page),
        );
        let rows = UserRow::find_by_statement(statement(&sql, values))
            .all(&self.db)
            .await?;

        let mut roles = load_roles(&self.db, rows.iter().map(|r| r.id).collect()).await?;
        let users = rows
            .into_iter()
            .map(|row| {
                let user_roles = roles.remove(&row.id).unwrap_or_default();
                row.into_user(user_roles)
            })
            .collect();

        Ok((users, u64::try_from(count).unwrap_or(0)))
    }

    async fn update(&self, user: User, actor: &Actor) -> UserResult<User> {
        let sql = format!(
            r#"
            UPDATE users
            SET name = $2, email = $3, password_hash = $4,
                last_modified_at = now(), last_modified_by = $5
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        );

        let row = UserRow::find_by_statement(statement(
            &sql,
            [
                user.id.into(),
                user.name.into(),
                user.email.into(),
                user.password_hash.into(),
                actor.as_str().into(),
            ],
        ))
        .one(&self.db)
        .await?
        .ok_or(UserError::UserNotFound(user.id))?;

        with_roles(&self.db, row).await
    }

    async fn delete(&self, id: i64) -> UserResult<bool> {
        // user_roles rows go with the user through ON DELETE CASCADE
        let result = self
            .db
            .execute_raw(statement("DELETE FROM users WHERE id = $1", [id.into()]))
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn add_role(&self, user_id: i64, role_id: i64, actor: &Actor) -> UserResult<bool> {
        let txn = self.db.begin().await?;

        let inserted = txn
            .execute_raw(statement(
                r#"
                INSERT INTO user_roles (user_id, role_id) VALUES ($1, $2)
                ON CONFLICT DO NOTHING
                "#,
                [user_id.into(), role_id.into()],
            ))
            .await
            .map_err(|err| grant_error(err, user_id))?
            .rows_affected()
            > 0;

        if inserted {
            touch(&txn, user_id, actor).await?;
        }

        txn.commit().await?;
        Ok(inserted)
    }

    async fn remove_role(&self, user_id: i64, role_id: i64, actor: &Actor) -> UserResult<bool> {
        let txn = self.db.begin().await?;

        let removed = txn
            .execute_raw(statement(
                "DELETE FROM user_roles WHERE user_id = $1 AND role_id = $2",
                [user_id.into(), role_id.into()],
            ))
            .await?
            .rows_affected()
            > 0;

        if removed {
            touch(&txn, user_id, actor).await?;
        }

        txn.commit().await?;
        Ok(removed)
    }
}

async fn touch<C: ConnectionTrait>(conn: &C, user_id: i64, actor: &Actor) -> UserResult<()> {
    conn.execute_raw(statement(
        "UPDATE users SET last_modified_at = now(), last_modified_by = $2 WHERE id = $1",
        [user_id.into(), actor.as_str().into()],
    ))
    .await?;
    Ok(())
}

/// PostgreSQL implementation of RoleRepository
#[derive(Clone)]
pub struct PgRoleRepository {
    db: DatabaseConnection,
}

impl PgRoleRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl RoleRepository for PgRoleRepository {
    async fn create(&self, role: NewRole) -> UserResult<Role> {
        let row = RoleRow::find_by_statement(statement(
            "INSERT INTO roles (name, code) VALUES ($1, $2) RETURNING id, name, code",
            [role.name.into(), role.code.to_string().into()],
        ))
        .one(&self.db)
        .await?
        .ok_or_else(|| UserError::Store("role insert returned no row".to_string()))?;

        Role::try_from(row)
    }

    async fn get_by_id(&self, id: i64) -> UserResult<Option<Role>> {
        RoleRow::find_by_statement(statement(
            "SELECT id, name, code FROM roles WHERE id = $1",
            [id.into()],
        ))
        .one(&self.db)
        .await?
        .map(Role::try_from)
        .transpose()
    }

    async fn list(&self) -> UserResult<Vec<Role>> {
        RoleRow::find_by_statement(statement(
            "SELECT id, name, code FROM roles ORDER BY id",
            [],
        ))
        .all(&self.db)
        .await?
        .into_iter()
        .map(Role::try_from)
        .collect()
    }
}
