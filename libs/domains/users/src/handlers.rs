use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, HeaderName, StatusCode, header},
    response::IntoResponse,
    routing::{get, post},
};
use axum_helpers::{
    Actor, AuditEvent, AuditOutcome, IdPath, QueryParams, ValidatedJson,
    errors::responses::{
        BadRequestParamResponse, BadRequestValidationResponse, ConflictResponse,
        InternalServerErrorResponse, NotFoundResponse,
    },
    extract_ip_from_headers, extract_user_agent,
};
use serde_json::{Value, json};
use std::sync::Arc;
use utoipa::OpenApi;

use crate::error::UserResult;
use crate::models::{CreateUser, PatchUser, ReplaceUser, Role, RoleCode, UserQuery, UserResponse};
use crate::repository::{RoleRepository, UserRepository};
use crate::service::{RoleService, UserService};

/// Response header carrying the total number of matches of a list query
pub const TOTAL_COUNT_HEADER: &str = "x-total-count";

/// Response header carrying a notification key for successful writes
pub const ALERT_HEADER: &str = "x-accounts-alert";

pub const USERS_TAG: &str = "users";
pub const ROLES_TAG: &str = "roles";

/// OpenAPI documentation for the Users API
#[derive(OpenApi)]
#[openapi(
    paths(
        list_users,
        create_user,
        get_user,
        patch_user,
        replace_user,
        delete_user,
        add_role,
        remove_role,
    ),
    components(
        schemas(UserResponse, CreateUser, PatchUser, ReplaceUser, Role, RoleCode),
        responses(
            NotFoundResponse,
            BadRequestValidationResponse,
            BadRequestParamResponse,
            ConflictResponse,
            InternalServerErrorResponse
        )
    ),
    tags(
        (name = USERS_TAG, description = "User account management endpoints")
    )
)]
pub struct UsersApiDoc;

/// OpenAPI documentation for the Roles API
#[derive(OpenApi)]
#[openapi(
    paths(list_roles),
    components(
        schemas(Role, RoleCode),
        responses(InternalServerErrorResponse)
    ),
    tags(
        (name = ROLES_TAG, description = "Role catalogue")
    )
)]
pub struct RolesApiDoc;

type SharedUsers<U, R> = State<Arc<UserService<U, R>>>;

/// Create the users router with all HTTP endpoints
pub fn users_router<U, R>(service: UserService<U, R>) -> Router
where
    U: UserRepository + 'static,
    R: RoleRepository + 'static,
{
    let shared_service = Arc::new(service);

    Router::new()
        .route("/", get(list_users).post(create_user))
        .route(
            "/{id}",
            get(get_user)
                .patch(patch_user)
                .put(replace_user)
                .delete(delete_user),
        )
        .route(
            "/{user_id}/roles/{role_id}",
            post(add_role).delete(remove_role),
        )
        .with_state(shared_service)
}

/// Create the roles router
pub fn roles_router<R: RoleRepository + 'static>(service: RoleService<R>) -> Router {
    Router::new()
        .route("/", get(list_roles))
        .with_state(Arc::new(service))
}

/// Audit event for a mutation. An error result is recorded as a failure
/// with the error message added to `details`.
fn audit_event<T>(
    result: &UserResult<T>,
    actor: &Actor,
    headers: &HeaderMap,
    action: &str,
    resource: String,
    mut details: Value,
) -> AuditEvent {
    let outcome = match result {
        Ok(_) => AuditOutcome::Success,
        Err(err) => {
            details["error"] = json!(err.to_string());
            AuditOutcome::Failure
        }
    };

    let event = AuditEvent::new(actor, action, Some(resource), outcome)
        .with_ip(extract_ip_from_headers(headers))
        .with_user_agent(extract_user_agent(headers));

    if details.is_null() {
        event
    } else {
        event.with_details(details)
    }
}

/// Search users by keyword, one page at a time
#[utoipa::path(
    get,
    path = "",
    tag = USERS_TAG,
    params(UserQuery),
    responses(
        (status = 200, description = "Page of users; total in x-total-count", body = Vec<UserResponse>,
            headers(("x-total-count" = u64, description = "Total matching users"))),
        (status = 400, response = BadRequestValidationResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn list_users<U: UserRepository, R: RoleRepository>(
    State(service): SharedUsers<U, R>,
    QueryParams(query): QueryParams<UserQuery>,
) -> UserResult<impl IntoResponse> {
    let page = service.list(query).await?;

    Ok((
        [(
            HeaderName::from_static(TOTAL_COUNT_HEADER),
            page.total.to_string(),
        )],
        Json(page.content),
    ))
}

/// Create a new user
#[utoipa::path(
    post,
    path = "",
    tag = USERS_TAG,
    request_body = CreateUser,
    responses(
        (status = 201, description = "User created", body = UserResponse,
            headers(("location" = String, description = "URL of the new user"))),
        (status = 400, response = BadRequestValidationResponse),
        (status = 409, response = ConflictResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn create_user<U: UserRepository, R: RoleRepository>(
    State(service): SharedUsers<U, R>,
    actor: Actor,
    headers: HeaderMap,
    ValidatedJson(input): ValidatedJson<CreateUser>,
) -> UserResult<impl IntoResponse> {
    let login = input.login.clone();
    let result = service.create(input, &actor).await;

    let resource = match &result {
        Ok(user) => format!("user:{}", user.id),
        Err(_) => "user".to_string(),
    };
    audit_event(
        &result,
        &actor,
        &headers,
        "user.create",
        resource,
        json!({ "login": login }),
    )
    .log();

    let user = result?;

    Ok((
        StatusCode::CREATED,
        [
            (header::LOCATION, format!("/api/users/{}", user.id)),
            (
                HeaderName::from_static(ALERT_HEADER),
                "accounts.created".to_string(),
            ),
        ],
        Json(user),
    ))
}

/// Get a user by ID
#[utoipa::path(
    get,
    path = "/{id}",
    tag = USERS_TAG,
    params(
        ("id" = i64, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User found", body = UserResponse),
        (status = 400, response = BadRequestParamResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn get_user<U: UserRepository, R: RoleRepository>(
    State(service): SharedUsers<U, R>,
    IdPath(id): IdPath,
) -> UserResult<Json<UserResponse>> {
    let user = service.get(id).await?;
    Ok(Json(user))
}

/// Update the fields present in the body
#[utoipa::path(
    patch,
    path = "/{id}",
    tag = USERS_TAG,
    params(
        ("id" = i64, Path, description = "User ID")
    ),
    request_body = PatchUser,
    responses(
        (status = 200, description = "User updated", body = UserResponse),
        (status = 400, response = BadRequestValidationResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn patch_user<U: UserRepository, R: RoleRepository>(
    State(service): SharedUsers<U, R>,
    actor: Actor,
    headers: HeaderMap,
    IdPath(id): IdPath,
    ValidatedJson(input): ValidatedJson<PatchUser>,
) -> UserResult<Json<UserResponse>> {
    let fields: Vec<&str> = [
        input.name.as_ref().map(|_| "name"),
        input.email.as_ref().map(|_| "email"),
        input.password.as_ref().map(|_| "password"),
    ]
    .into_iter()
    .flatten()
    .collect();

    let result = service.partial_update(id, input, &actor).await;

    audit_event(
        &result,
        &actor,
        &headers,
        "user.patch",
        format!("user:{}", id),
        json!({ "fields": fields }),
    )
    .log();

    Ok(Json(result?))
}

/// Replace a user's name, email and password
#[utoipa::path(
    put,
    path = "/{id}",
    tag = USERS_TAG,
    params(
        ("id" = i64, Path, description = "User ID")
    ),
    request_body = ReplaceUser,
    responses(
        (status = 200, description = "User replaced", body = UserResponse),
        (status = 400, response = BadRequestValidationResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn replace_user<U: UserRepository, R: RoleRepository>(
    State(service): SharedUsers<U, R>,
    actor: Actor,
    headers: HeaderMap,
    IdPath(id): IdPath,
    ValidatedJson(input): ValidatedJson<ReplaceUser>,
) -> UserResult<Json<UserResponse>> {
    let result = service.full_update(id, input, &actor).await;

    audit_event(
        &result,
        &actor,
        &headers,
        "user.replace",
        format!("user:{}", id),
        Value::Null,
    )
    .log();

    Ok(Json(result?))
}

/// Delete a user and their role associations
#[utoipa::path(
    delete,
    path = "/{id}",
    tag = USERS_TAG,
    params(
        ("id" = i64, Path, description = "User ID")
    ),
    responses(
        (status = 204, description = "User deleted"),
        (status = 400, response = BadRequestParamResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn delete_user<U: UserRepository, R: RoleRepository>(
    State(service): SharedUsers<U, R>,
    actor: Actor,
    headers: HeaderMap,
    IdPath(id): IdPath,
) -> UserResult<impl IntoResponse> {
    let result = service.delete(id, &actor).await;

    audit_event(
        &result,
        &actor,
        &headers,
        "user.delete",
        format!("user:{}", id),
        Value::Null,
    )
    .log();

    result?;
    Ok(StatusCode::NO_CONTENT)
}

/// Grant a role to a user
#[utoipa::path(
    post,
    path = "/{user_id}/roles/{role_id}",
    tag = USERS_TAG,
    params(
        ("user_id" = i64, Path, description = "User ID"),
        ("role_id" = i64, Path, description = "Role ID")
    ),
    responses(
        (status = 201, description = "Role granted; the user is returned", body = UserResponse),
        (status = 400, response = BadRequestParamResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn add_role<U: UserRepository, R: RoleRepository>(
    State(service): SharedUsers<U, R>,
    actor: Actor,
    headers: HeaderMap,
    IdPath((user_id, role_id)): IdPath<(i64, i64)>,
) -> UserResult<impl IntoResponse> {
    let result = service.add_role(user_id, role_id, &actor).await;

    audit_event(
        &result,
        &actor,
        &headers,
        "user.role.add",
        format!("user:{}/role:{}", user_id, role_id),
        Value::Null,
    )
    .log();

    Ok((StatusCode::CREATED, Json(result?)))
}

/// Revoke a role from a user
#[utoipa::path(
    delete,
    path = "/{user_id}/roles/{role_id}",
    tag = USERS_TAG,
    params(
        ("user_id" = i64, Path, description = "User ID"),
        ("role_id" = i64, Path, description = "Role ID")
    ),
    responses(
        (status = 204, description = "Role revoked, or was not held"),
        (status = 400, response = BadRequestParamResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn remove_role<U: UserRepository, R: RoleRepository>(
    State(service): SharedUsers<U, R>,
    actor: Actor,
    headers: HeaderMap,
    IdPath((user_id, role_id)): IdPath<(i64, i64)>,
) -> UserResult<impl IntoResponse> {
    let result = service.remove_role(user_id, role_id, &actor).await;

    audit_event(
        &result,
        &actor,
        &headers,
        "user.role.remove",
        format!("user:{}/role:{}", user_id, role_id),
        Value::Null,
    )
    .log();

    result?;
    Ok(StatusCode::NO_CONTENT)
}

/// List all roles
#[utoipa::path(
    get,
    path = "",
    tag = ROLES_TAG,
    responses(
        (status = 200, description = "All roles ordered by id", body = Vec<Role>),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn list_roles<R: RoleRepository>(
    State(service): State<Arc<RoleService<R>>>,
) -> UserResult<Json<Vec<Role>>> {
    let roles = service.list_roles().await?;
    Ok(Json(roles))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::UserError;
    use axum::http::HeaderValue;

    #[test]
    fn test_failed_mutation_is_audited_as_failure() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static("10.1.2.3"));
        let result: UserResult<()> = Err(UserError::DuplicateLogin("a".to_string()));

        let event = audit_event(
            &result,
            &Actor::new("liangjian"),
            &headers,
            "user.create",
            "user".to_string(),
            json!({ "login": "a" }),
        );

        assert_eq!(event.outcome, AuditOutcome::Failure);
        assert_eq!(event.ip_address.as_deref(), Some("10.1.2.3"));
        let details = event.details.unwrap();
        assert_eq!(details["login"], "a");
        assert_eq!(details["error"], "Login 'a' already exists");
    }

    #[test]
    fn test_successful_mutation_is_audited_as_success() {
        let result: UserResult<()> = Ok(());
        let event = audit_event(
            &result,
            &Actor::system(),
            &HeaderMap::new(),
            "user.delete",
            "user:4".to_string(),
            Value::Null,
        );

        assert_eq!(event.outcome, AuditOutcome::Success);
        assert_eq!(event.resource.as_deref(), Some("user:4"));
        assert!(event.details.is_none());

        let missing: UserResult<()> = Err(UserError::UserNotFound(4));
        let event = audit_event(
            &missing,
            &Actor::system(),
            &HeaderMap::new(),
            "user.delete",
            "user:4".to_string(),
            Value::Null,
        );
        assert_eq!(event.outcome, AuditOutcome::Failure);
        assert_eq!(event.details.unwrap()["error"], "User 4 not found");
    }
}
