//! Query string extractor that accepts repeated keys.

use crate::errors::AppError;
use axum::{extract::FromRequestParts, http::request::Parts};
use serde::de::DeserializeOwned;

/// Query string deserialized into `T` with `axum_extra::extract::Query`, so
/// `?sort=name&sort=id,desc` fills a `Vec<String>`.
///
/// Malformed input is rejected with a 400 `BAD_REQUEST` error body.
#[derive(Debug, Clone)]
pub struct QueryParams<T>(pub T);

impl<T, S> FromRequestParts<S> for QueryParams<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let axum_extra::extract::Query(value) =
            axum_extra::extract::Query::<T>::from_request_parts(parts, state)
                .await
                .map_err(|e| AppError::BadRequest(e.to_string()))?;
        Ok(QueryParams(value))
    }
}
