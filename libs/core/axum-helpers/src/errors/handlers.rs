use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use super::{ErrorCode, ErrorResponse};

/// Router fallback for unknown paths.
pub async fn not_found() -> Response {
    let body = ErrorResponse::new(ErrorCode::NotFound, "The requested resource was not found");
    (StatusCode::NOT_FOUND, Json(body)).into_response()
}

/// Fallback for known paths hit with an unsupported method.
pub async fn method_not_allowed() -> Response {
    let code = ErrorCode::MethodNotAllowed;
    let body = ErrorResponse::new(code, code.default_message());
    (StatusCode::METHOD_NOT_ALLOWED, Json(body)).into_response()
}
