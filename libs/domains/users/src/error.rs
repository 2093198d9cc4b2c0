use axum::http::HeaderValue;
use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use thiserror::Error;

/// Response header naming the failure for clients that render notifications.
pub const ERROR_HEADER: &str = "x-accounts-error";

#[derive(Debug, Error)]
pub enum UserError {
    #[error("User {0} not found")]
    UserNotFound(i64),

    #[error("Role {0} not found")]
    RoleNotFound(i64),

    #[error("Login '{0}' already exists")]
    DuplicateLogin(String),

    #[error("Cannot sort by '{0}', expected one of: id, name, login, email")]
    InvalidSort(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Password hashing error: {0}")]
    PasswordHash(String),
}

pub type UserResult<T> = Result<T, UserError>;

impl From<sea_orm::DbErr> for UserError {
    fn from(err: sea_orm::DbErr) -> Self {
        UserError::Store(err.to_string())
    }
}

impl UserError {
    /// Notification key sent in [`ERROR_HEADER`], if the failure has one.
    pub fn notification_key(&self) -> Option<&'static str> {
        match self {
            UserError::DuplicateLogin(_) => Some("accounts.login-exists"),
            _ => None,
        }
    }
}

impl From<UserError> for AppError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::UserNotFound(_) | UserError::RoleNotFound(_) => {
                AppError::NotFound(err.to_string())
            }
            UserError::DuplicateLogin(_) => AppError::Conflict(err.to_string()),
            UserError::InvalidSort(_) => AppError::InvalidInput(err.to_string()),
            UserError::Store(msg) => AppError::Database(msg),
            UserError::PasswordHash(msg) => AppError::InternalServerError(msg),
        }
    }
}

impl IntoResponse for UserError {
    fn into_response(self) -> Response {
        let notification = self.notification_key();
        let app_error: AppError = self.into();
        let mut response = app_error.into_response();

        if let Some(key) = notification {
            response
                .headers_mut()
                .insert(ERROR_HEADER, HeaderValue::from_static(key));
        }

        response
    }
}
