use axum::http::{HeaderName, HeaderValue, Method, header};
use core_config::CorsConfig;
use std::io;
use std::time::Duration;
use tower_http::cors::CorsLayer;

/// Headers a browser client must be able to read from API responses.
const EXPOSED_HEADERS: [&str; 4] = [
    "location",
    "x-total-count",
    "x-accounts-alert",
    "x-accounts-error",
];

/// Creates a CORS layer for the configured origins.
///
/// - methods: GET, POST, PUT, DELETE, PATCH, OPTIONS
/// - request headers: Content-Type, Accept, `x-actor`
/// - exposes `Location`, `x-total-count` and the notification headers
/// - 1 hour max age
///
/// Fails when an origin is not a valid header value.
pub fn create_cors_layer(config: &CorsConfig) -> io::Result<CorsLayer> {
    let origins = config
        .allowed_origins
        .iter()
        .map(|origin| {
            HeaderValue::from_str(origin).map_err(|e| {
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("invalid CORS origin '{}': {}", origin, e),
                )
            })
        })
        .collect::<io::Result<Vec<_>>>()?;

    Ok(CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::PATCH,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::ACCEPT,
            HeaderName::from_static("x-actor"),
        ])
        .expose_headers(EXPOSED_HEADERS.map(HeaderName::from_static))
        .max_age(Duration::from_secs(3600)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_origins_build_layer() {
        let config = CorsConfig::new(["http://localhost:3000", "https://accounts.example.com"]);
        assert!(create_cors_layer(&config).is_ok());
    }

    #[test]
    fn test_invalid_origin_is_rejected() {
        let config = CorsConfig::new(["http://bad\norigin"]);
        let err = create_cors_layer(&config).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }
}
