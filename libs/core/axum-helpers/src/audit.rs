//! Audit logging and the acting principal.
//!
//! Every mutating request is attributed to an [`Actor`], taken from the
//! `x-actor` header. The actor is stamped into the audit columns of the
//! stored rows and into an [`AuditEvent`] emitted on the `audit` target.
//!
//! ```ignore
//! use axum_helpers::audit::{Actor, AuditEvent, AuditOutcome};
//!
//! async fn delete_user(actor: Actor, headers: HeaderMap, IdPath(id): IdPath) {
//!     AuditEvent::new(&actor, "user.delete", Some(format!("user:{id}")), AuditOutcome::Success)
//!         .with_ip(extract_ip_from_headers(&headers))
//!         .with_user_agent(extract_user_agent(&headers))
//!         .log();
//! }
//! ```

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, request::Parts},
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::convert::Infallible;
use std::fmt;

/// Header carrying the caller's identity.
pub const ACTOR_HEADER: &str = "x-actor";

/// Longest actor name that fits the audit columns.
pub const MAX_ACTOR_LEN: usize = 50;

/// The principal performing a request.
///
/// Authentication is handled upstream; this service trusts `x-actor` and
/// falls back to [`Actor::SYSTEM`] when it is absent or blank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Actor(String);

impl Actor {
    pub const SYSTEM: &'static str = "system";

    /// Trimmed and cut to [`MAX_ACTOR_LEN`] characters; blank becomes `system`.
    pub fn new(name: impl AsRef<str>) -> Self {
        let trimmed = name.as_ref().trim();
        if trimmed.is_empty() {
            return Self::system();
        }
        Self(trimmed.chars().take(MAX_ACTOR_LEN).collect())
    }

    pub fn system() -> Self {
        Self(Self::SYSTEM.to_string())
    }

    pub fn from_headers(headers: &HeaderMap) -> Self {
        headers
            .get(ACTOR_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(Self::new)
            .unwrap_or_else(Self::system)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Actor {
    fn default() -> Self {
        Self::system()
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_headers(&parts.headers))
    }
}

/// Outcome of an audited action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditOutcome {
    Success,
    /// Action failed (e.g. validation error, missing resource)
    Failure,
}

/// Structured audit event.
///
/// Build with [`AuditEvent::new`], add optional fields, then call
/// [`AuditEvent::log`].
#[derive(Debug, Serialize)]
pub struct AuditEvent {
    pub actor: String,
    /// Action performed (e.g. "user.create", "user.role.add")
    pub action: String,
    /// Resource affected (e.g. "user:12", "user:12/role:2")
    pub resource: Option<String>,
    pub outcome: AuditOutcome,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub timestamp: DateTime<Utc>,
    pub details: Option<serde_json::Value>,
}

impl AuditEvent {
    pub fn new(
        actor: &Actor,
        action: impl Into<String>,
        resource: Option<String>,
        outcome: AuditOutcome,
    ) -> Self {
        Self {
            actor: actor.as_str().to_string(),
            action: action.into(),
            resource,
            outcome,
            ip_address: None,
            user_agent: None,
            timestamp: Utc::now(),
            details: None,
        }
    }

    pub fn with_ip(mut self, ip: Option<String>) -> Self {
        self.ip_address = ip;
        self
    }

    pub fn with_user_agent(mut self, user_agent: Option<String>) -> Self {
        self.user_agent = user_agent;
        self
    }

    /// Attach extra context; values that fail to serialize are dropped.
    pub fn with_details(mut self, details: impl Serialize) -> Self {
        self.details = serde_json::to_value(details).ok();
        self
    }

    /// Emit the event on the `audit` tracing target.
    pub fn log(self) {
        tracing::info!(
            target: "audit",
            actor = %self.actor,
            action = %self.action,
            resource = self.resource,
            outcome = ?self.outcome,
            ip = self.ip_address,
            user_agent = self.user_agent,
            timestamp = %self.timestamp,
            details = ?self.details,
            "{}",
            serde_json::to_string(&self).unwrap_or_else(|_| "Failed to serialize audit event".to_string())
        );
    }
}

/// Client IP from `X-Forwarded-For` (first hop) or `X-Real-IP`.
pub fn extract_ip_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(|s| s.trim().to_string())
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|v| v.to_str().ok())
                .map(|s| s.to_string())
        })
}

pub fn extract_user_agent(headers: &HeaderMap) -> Option<String> {
    headers
        .get("user-agent")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}
