//! Custom extractors for Axum handlers.
//!
//! Each one rejects with [`AppError`](crate::errors::AppError), so extraction
//! failures share the JSON error format of the rest of the API.

pub mod id_path;
pub mod query_params;
pub mod validated_json;

pub use id_path::IdPath;
pub use query_params::QueryParams;
pub use validated_json::ValidatedJson;
