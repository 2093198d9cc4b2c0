use crate::{env_required, ConfigError, FromEnv};

/// Allowed browser origins for cross-origin API calls.
///
/// Read from `CORS_ALLOWED_ORIGIN` as a comma-separated list, e.g.
/// `CORS_ALLOWED_ORIGIN=http://localhost:3000,https://accounts.example.com`.
/// The variable is required; an empty list is rejected.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

impl CorsConfig {
    pub fn new<I, S>(origins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed_origins: origins.into_iter().map(Into::into).collect(),
        }
    }

    fn parse(raw: &str) -> Result<Self, ConfigError> {
        let allowed_origins: Vec<String> = raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();

        if allowed_origins.is_empty() {
            return Err(ConfigError::ParseError {
                key: "CORS_ALLOWED_ORIGIN".to_string(),
                details: "at least one origin is required".to_string(),
            });
        }

        Ok(Self { allowed_origins })
    }
}

impl FromEnv for CorsConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Self::parse(&env_required("CORS_ALLOWED_ORIGIN")?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cors_config_splits_and_trims() {
        temp_env::with_var(
            "CORS_ALLOWED_ORIGIN",
            Some(" http://localhost:3000 , https://app.example.com,,"),
            || {
                let config = CorsConfig::from_env().unwrap();
                assert_eq!(
                    config.allowed_origins,
                    vec!["http://localhost:3000", "https://app.example.com"]
                );
            },
        );
    }

    #[test]
    fn test_cors_config_missing() {
        temp_env::with_var_unset("CORS_ALLOWED_ORIGIN", || {
            let err = CorsConfig::from_env().unwrap_err();
            assert!(matches!(err, ConfigError::MissingEnvVar(_)));
        });
    }

    #[test]
    fn test_cors_config_empty() {
        temp_env::with_var("CORS_ALLOWED_ORIGIN", Some(" , "), || {
            assert!(CorsConfig::from_env().is_err());
        });
    }
}
