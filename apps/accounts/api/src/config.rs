use core_config::{AppInfo, ConfigError, CorsConfig, FromEnv, app_info, env_flag, env_or_default, server::ServerConfig};
use database::postgres::PostgresConfig;
use strum::{Display, EnumString};

// Re-export Environment for use in other modules
pub use core_config::Environment;

/// Where user and role data lives, selected with `STORE_BACKEND`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum StoreBackend {
    Postgres,
    /// Seeded in-memory store; nothing survives a restart
    Memory,
}

/// Application-specific configuration
/// Composes shared config components from the `config` library
#[derive(Clone, Debug)]
pub struct Config {
    pub app: AppInfo,
    pub environment: Environment,
    pub server: ServerConfig,
    pub cors: CorsConfig,
    pub store: StoreBackend,
    /// Present exactly when `store` is [`StoreBackend::Postgres`]
    pub database: Option<PostgresConfig>,
    pub run_migrations: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let environment = Environment::from_env();
        let server = ServerConfig::from_env()?; // Uses defaults: HOST=0.0.0.0, PORT=8080
        let cors = CorsConfig::from_env()?; // Required - will fail if not set

        let raw_store = env_or_default("STORE_BACKEND", "postgres");
        let store = raw_store
            .parse::<StoreBackend>()
            .map_err(|_| ConfigError::ParseError {
                key: "STORE_BACKEND".to_string(),
                details: format!("expected 'postgres' or 'memory', got '{}'", raw_store),
            })?;

        let database = match store {
            StoreBackend::Postgres => Some(PostgresConfig::from_env()?),
            StoreBackend::Memory => None,
        };

        Ok(Self {
            app: app_info!(),
            environment,
            server,
            cors,
            store,
            database,
            run_migrations: env_flag("RUN_MIGRATIONS", true)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORIGIN: (&str, Option<&str>) = ("CORS_ALLOWED_ORIGIN", Some("http://localhost:3000"));

    #[test]
    fn test_defaults_to_postgres_with_migrations() {
        temp_env::with_vars(
            [
                ORIGIN,
                ("STORE_BACKEND", None),
                ("RUN_MIGRATIONS", None),
                ("DATABASE_URL", Some("postgresql://localhost/accounts")),
            ],
            || {
                let config = Config::from_env().unwrap();
                assert_eq!(config.store, StoreBackend::Postgres);
                assert!(config.run_migrations);
                assert_eq!(
                    config.database.unwrap().url(),
                    "postgresql://localhost/accounts"
                );
                assert_eq!(config.app.name, "accounts_api");
            },
        );
    }

    #[test]
    fn test_memory_backend_needs_no_database() {
        temp_env::with_vars(
            [
                ORIGIN,
                ("STORE_BACKEND", Some("Memory")),
                ("RUN_MIGRATIONS", Some("false")),
                ("DATABASE_URL", None),
            ],
            || {
                let config = Config::from_env().unwrap();
                assert_eq!(config.store, StoreBackend::Memory);
                assert!(config.database.is_none());
                assert!(!config.run_migrations);
            },
        );
    }

    #[test]
    fn test_postgres_backend_requires_database_url() {
        temp_env::with_vars(
            [ORIGIN, ("STORE_BACKEND", Some("postgres")), ("DATABASE_URL", None)],
            || {
                let err = Config::from_env().unwrap_err();
                assert!(err.to_string().contains("DATABASE_URL"));
            },
        );
    }

    #[test]
    fn test_unknown_backend_is_rejected() {
        temp_env::with_vars([ORIGIN, ("STORE_BACKEND", Some("mongo"))], || {
            let err = Config::from_env().unwrap_err();
            assert!(err.to_string().contains("STORE_BACKEND"));
        });
    }

    #[test]
    fn test_cors_origin_is_required() {
        temp_env::with_vars(
            [
                ("CORS_ALLOWED_ORIGIN", None),
                ("STORE_BACKEND", Some("memory")),
            ],
            || {
                let err = Config::from_env().unwrap_err();
                assert!(err.to_string().contains("CORS_ALLOWED_ORIGIN"));
            },
        );
    }
}
