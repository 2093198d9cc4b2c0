//! Typed path parameter extractor.

use crate::errors::AppError;
use axum::{
    extract::{FromRequestParts, Path},
    http::request::Parts,
};
use serde::de::DeserializeOwned;

/// Path parameters deserialized into `T`, defaulting to a single `i64` id.
///
/// A value that does not parse (e.g. `/api/users/abc`) is rejected with a
/// 400 `INVALID_PATH` error body instead of axum's plain-text rejection.
///
/// ```ignore
/// async fn get_user(IdPath(id): IdPath) -> String {
///     format!("user {id}")
/// }
///
/// async fn add_role(IdPath((user_id, role_id)): IdPath<(i64, i64)>) -> String {
///     format!("user {user_id} role {role_id}")
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct IdPath<T = i64>(pub T);

impl<T, S> FromRequestParts<S> for IdPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state).await?;
        Ok(IdPath(value))
    }
}
