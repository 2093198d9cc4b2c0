//! # Axum Helpers
//!
//! Shared building blocks for the accounts HTTP services.
//!
//! ## Modules
//!
//! - **[`server`]**: Router assembly with API docs, health checks, graceful shutdown
//! - **[`http`]**: HTTP middleware (CORS, security headers)
//! - **[`errors`]**: Structured error responses with error codes
//! - **[`extractors`]**: Custom extractors (typed path ids, repeated query keys, validated JSON)
//! - **[`audit`]**: Audit logging and the acting principal ([`Actor`])
//!
//! ## Quick Start
//!
//! ```ignore
//! use axum_helpers::server::{create_production_app, create_router, health_router};
//! use core_config::{app_info, server::ServerConfig, CorsConfig};
//! use std::time::Duration;
//!
//! let router = create_router::<ApiDoc>(api_routes, &cors)?
//!     .merge(health_router(app_info!()));
//!
//! create_production_app(router, &ServerConfig::default(), Duration::from_secs(30), async {}).await?;
//! ```

pub mod audit;
pub mod errors;
pub mod extractors;
pub mod http;
pub mod server;

pub use server::{
    HealthCheckFuture, HealthResponse, ShutdownCoordinator, create_production_app, create_router,
    health_router, run_health_checks, shutdown_signal,
};

pub use http::{create_cors_layer, security_headers};

pub use errors::{AppError, ErrorCode, ErrorResponse};

pub use extractors::{IdPath, QueryParams, ValidatedJson};

pub use audit::{Actor, AuditEvent, AuditOutcome, extract_ip_from_headers, extract_user_agent};
