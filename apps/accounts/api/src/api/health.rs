//! Readiness check against the configured store.

use crate::state::{AppState, Store};
use axum::{
    extract::State,
    response::{IntoResponse, Response},
};
use axum_helpers::server::{HealthCheckFuture, run_health_checks};
use database::postgres::check_health_detailed;

/// Readiness check endpoint.
///
/// Pings PostgreSQL when it backs the store; the in-memory store is always
/// ready.
pub async fn ready_handler(State(state): State<AppState>) -> Response {
    let checks: Vec<(&str, HealthCheckFuture<'_>)> = match &state.store {
        Store::Postgres(db) => vec![(
            "database",
            Box::pin(async move {
                let status = check_health_detailed(db).await;
                tracing::debug!(response_time_ms = status.response_time_ms, "Database probed");
                if status.healthy {
                    Ok(())
                } else {
                    Err(format!(
                        "Database ping failed: {}",
                        status.message.unwrap_or_default()
                    ))
                }
            }),
        )],
        Store::Memory(_) => vec![("store", Box::pin(async { Ok(()) }))],
    };

    match run_health_checks(checks).await {
        Ok((status, json)) => (status, json).into_response(),
        Err((status, json)) => (status, json).into_response(),
    }
}
