use argon2::{
    Argon2,
    password_hash::{PasswordHasher, SaltString, rand_core::OsRng},
};
use sea_orm::{ConnectionTrait, DbBackend, Statement};
use sea_orm_migration::prelude::*;

const SEED_ACTOR: &str = "system";
const EMAIL_DOMAIN: &str = "cn.wilmar-intl.com";

const DEFAULT_ROLE: (&str, &str) = ("Default User", "USER");
const ADMIN_ROLE: (&str, &str) = ("Administrator", "ADMIN");

const SEED_USERS: [&str; 4] = ["Yin Guo Wei", "Liang Jian", "Wan Jon Yew", "Kwek So Cheer"];

/// Login derived from a display name: "Yin Guo Wei" -> "yinguowei".
fn login_for(name: &str) -> String {
    name.split_whitespace().collect::<String>().to_lowercase()
}

fn hash_password(password: &str) -> Result<String, DbErr> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| DbErr::Custom(format!("failed to hash seed password: {}", e)))
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        for (name, code) in [DEFAULT_ROLE, ADMIN_ROLE] {
            db.execute_raw(Statement::from_sql_and_values(
                DbBackend::Postgres,
                "INSERT INTO roles (name, code) VALUES ($1, $2)",
                [name.into(), code.into()],
            ))
            .await?;
        }

        for (index, name) in SEED_USERS.iter().enumerate() {
            let login = login_for(name);
            let email = format!("{}@{}", login, EMAIL_DOMAIN);
            let password_hash = hash_password(&login)?;

            db.execute_raw(Statement::from_sql_and_values(
                DbBackend::Postgres,
                r#"
                INSERT INTO users (name, login, email, password_hash, created_by, last_modified_by)
                VALUES ($1, $2, $3, $4, $5, $5)
                ON CONFLICT (login) DO NOTHING
                "#,
                [
                    (*name).into(),
                    login.clone().into(),
                    email.into(),
                    password_hash.into(),
                    SEED_ACTOR.into(),
                ],
            ))
            .await?;

            // Everyone is a default user; the first account also administers
            let mut roles = vec![DEFAULT_ROLE.0];
            if index == 0 {
                roles.push(ADMIN_ROLE.0);
            }

            for role in roles {
                db.execute_raw(Statement::from_sql_and_values(
                    DbBackend::Postgres,
                    r#"
                    INSERT INTO user_roles (user_id, role_id)
                    SELECT u.id, r.id FROM users u, roles r
                    WHERE u.login = $1 AND r.name = $2
                    ON CONFLICT DO NOTHING
                    "#,
                    [login.clone().into(), role.into()],
                ))
                .await?;
            }
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        let logins: Vec<String> = SEED_USERS.iter().map(|name| login_for(name)).collect();

        for login in logins {
            db.execute_raw(Statement::from_sql_and_values(
                DbBackend::Postgres,
                "DELETE FROM users WHERE login = $1",
                [login.into()],
            ))
            .await?;
        }

        db.execute_raw(Statement::from_sql_and_values(
            DbBackend::Postgres,
            "DELETE FROM roles WHERE name IN ($1, $2)",
            [DEFAULT_ROLE.0.into(), ADMIN_ROLE.0.into()],
        ))
        .await?;

        Ok(())
    }
}
