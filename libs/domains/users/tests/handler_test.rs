//! Handler tests for the Users domain
//!
//! These run the domain routers against the in-memory store and check:
//! - Request deserialization and validation
//! - Response bodies, status codes and headers
//! - Error bodies
//!
//! The PostgreSQL store is covered by integration_test.rs.

use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use domain_users::models::NewRole;
use domain_users::password::verify_password;
use domain_users::*;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt; // For oneshot()

// Helper to parse JSON response body
async fn json_body<T: serde::de::DeserializeOwned>(response: Response<Body>) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn users_app(store: &InMemoryStore) -> Router {
    handlers::users_router(UserService::new(store.clone(), store.clone()))
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn user_a() -> Value {
    json!({"name": "A", "login": "a", "email": "a@x.com", "password": "p"})
}

async fn store_with_roles() -> (InMemoryStore, Role, Role) {
    let store = InMemoryStore::new();
    let user_role = RoleRepository::create(
        &store,
        NewRole {
            name: "Default User".to_string(),
            code: RoleCode::User,
        },
    )
    .await
    .unwrap();
    let admin_role = RoleRepository::create(
        &store,
        NewRole {
            name: "Administrator".to_string(),
            code: RoleCode::Admin,
        },
    )
    .await
    .unwrap();
    (store, user_role, admin_role)
}

#[tokio::test]
async fn test_user_lifecycle_scenario() {
    let store = InMemoryStore::new();
    let app = users_app(&store);

    // Create
    let response = app
        .clone()
        .oneshot(json_request("POST", "/", user_a()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(response.headers()["location"], "/api/users/1");
    assert_eq!(response.headers()["x-accounts-alert"], "accounts.created");
    let created: Value = json_body(response).await;
    assert_eq!(created["id"], 1);

    // Read back without the password
    let response = app
        .clone()
        .oneshot(empty_request("GET", "/1"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let fetched: Value = json_body(response).await;
    assert_eq!(fetched["login"], "a");
    assert!(fetched.get("password").is_none());
    assert!(fetched.get("password_hash").is_none());
    assert_eq!(fetched["roles"], json!([]));

    // Duplicate login
    let response = app
        .clone()
        .oneshot(json_request("POST", "/", user_a()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(
        response.headers()["x-accounts-error"],
        "accounts.login-exists"
    );
    let error: Value = json_body(response).await;
    assert_eq!(error["error"], "CONFLICT");

    // Delete, then gone
    let response = app
        .clone()
        .oneshot(empty_request("DELETE", "/1"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app.oneshot(empty_request("GET", "/1")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let error: Value = json_body(response).await;
    assert_eq!(error["error"], "NOT_FOUND");
}

#[tokio::test]
async fn test_duplicate_login_leaves_count_unchanged() {
    let store = InMemoryStore::new();
    let app = users_app(&store);

    for _ in 0..2 {
        app.clone()
            .oneshot(json_request("POST", "/", user_a()))
            .await
            .unwrap();
    }

    let response = app.oneshot(empty_request("GET", "/")).await.unwrap();
    assert_eq!(response.headers()["x-total-count"], "1");
}

#[tokio::test]
async fn test_patch_email_only_keeps_everything_else() {
    let store = InMemoryStore::new();
    let app = users_app(&store);

    app.clone()
        .oneshot(json_request("POST", "/", user_a()))
        .await
        .unwrap();

    let response = app
        .oneshot(json_request("PATCH", "/1", json!({"email": "new@x.com"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let patched: Value = json_body(response).await;
    assert_eq!(patched["email"], "new@x.com");
    assert_eq!(patched["name"], "A");
    assert_eq!(patched["login"], "a");

    let stored = UserRepository::get_by_id(&store, 1).await.unwrap().unwrap();
    assert!(verify_password("p", &stored.password_hash).unwrap());
}

#[tokio::test]
async fn test_put_replaces_fields_and_keeps_login() {
    let store = InMemoryStore::new();
    let app = users_app(&store);

    app.clone()
        .oneshot(json_request("POST", "/", user_a()))
        .await
        .unwrap();

    let response = app
        .oneshot(json_request(
            "PUT",
            "/1",
            json!({"name": "B", "email": "b@x.com", "password": "q", "login": "ignored"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let replaced: Value = json_body(response).await;
    assert_eq!(replaced["name"], "B");
    assert_eq!(replaced["login"], "a");

    let stored = UserRepository::get_by_id(&store, 1).await.unwrap().unwrap();
    assert!(verify_password("q", &stored.password_hash).unwrap());
}

#[tokio::test]
async fn test_update_missing_user_is_404() {
    let app = users_app(&InMemoryStore::new());

    let response = app
        .clone()
        .oneshot(json_request("PATCH", "/99", json!({"name": "Z"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            "/99",
            json!({"name": "Z", "email": "z@x.com", "password": "p"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let error: Value = json_body(response).await;
    assert_eq!(error["error"], "NOT_FOUND");

    let response = app.oneshot(empty_request("DELETE", "/99")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_add_role_twice_keeps_one_copy() {
    let (store, _, admin_role) = store_with_roles().await;
    let app = users_app(&store);

    app.clone()
        .oneshot(json_request("POST", "/", user_a()))
        .await
        .unwrap();

    let uri = format!("/1/roles/{}", admin_role.id);
    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(empty_request("POST", &uri))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let user: UserResponse = json_body(response).await;
        assert_eq!(user.roles, vec![admin_role.clone()]);
    }
}

#[tokio::test]
async fn test_add_missing_role_is_404() {
    let (store, _, _) = store_with_roles().await;
    let app = users_app(&store);

    app.clone()
        .oneshot(json_request("POST", "/", user_a()))
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(empty_request("POST", "/1/roles/99"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .oneshot(empty_request("POST", "/42/roles/1"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_remove_missing_role_is_404() {
    let (store, _, _) = store_with_roles().await;
    let app = users_app(&store);

    app.clone()
        .oneshot(json_request("POST", "/", user_a()))
        .await
        .unwrap();

    let response = app
        .oneshot(empty_request("DELETE", "/1/roles/99"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let error: Value = json_body(response).await;
    assert_eq!(error["error"], "NOT_FOUND");
}

#[tokio::test]
async fn test_remove_absent_role_is_204() {
    let (store, user_role, _) = store_with_roles().await;
    let app = users_app(&store);

    app.clone()
        .oneshot(json_request("POST", "/", user_a()))
        .await
        .unwrap();

    let uri = format!("/1/roles/{}", user_role.id);
    let response = app
        .clone()
        .oneshot(empty_request("DELETE", &uri))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    app.clone()
        .oneshot(empty_request("POST", &uri))
        .await
        .unwrap();
    let response = app.oneshot(empty_request("DELETE", &uri)).await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let stored = UserRepository::get_by_id(&store, 1).await.unwrap().unwrap();
    assert!(stored.roles.is_empty());
}

#[tokio::test]
async fn test_actor_header_is_recorded() {
    let store = InMemoryStore::new();
    let app = users_app(&store);

    let request = Request::builder()
        .method("POST")
        .uri("/")
        .header("content-type", "application/json")
        .header("x-actor", "admin")
        .body(Body::from(user_a().to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap();

    let stored = UserRepository::get_by_id(&store, 1).await.unwrap().unwrap();
    assert_eq!(stored.audit.created_by, "admin");
    assert_eq!(stored.audit.last_modified_by, "admin");
}

#[tokio::test]
async fn test_create_validates_input() {
    let app = users_app(&InMemoryStore::new());

    let response = app
        .oneshot(json_request(
            "POST",
            "/",
            json!({"name": "", "login": "a", "email": "not-an-email", "password": "p"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let error: Value = json_body(response).await;
    assert_eq!(error["error"], "VALIDATION_ERROR");
    assert!(error["details"].get("name").is_some());
    assert!(error["details"].get("email").is_some());
}

#[tokio::test]
async fn test_malformed_json_is_400() {
    let app = users_app(&InMemoryStore::new());

    let request = Request::builder()
        .method("POST")
        .uri("/")
        .header("content-type", "application/json")
        .body(Body::from("{\"name\": "))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_missing_field_is_422() {
    let app = users_app(&InMemoryStore::new());

    let response = app
        .oneshot(json_request("POST", "/", json!({"name": "A", "login": "a"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_non_numeric_id_is_400() {
    let app = users_app(&InMemoryStore::new());

    let response = app.oneshot(empty_request("GET", "/abc")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let error: Value = json_body(response).await;
    assert_eq!(error["error"], "INVALID_PATH");
}

#[tokio::test]
async fn test_list_pages_with_total_count() {
    let store = InMemoryStore::seeded().await.unwrap();
    let app = users_app(&store);

    let response = app
        .oneshot(empty_request("GET", "/?size=2&page=1&sort=login,desc"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-total-count"], "4");

    let users: Vec<UserResponse> = json_body(response).await;
    let logins: Vec<&str> = users.iter().map(|u| u.login.as_str()).collect();
    // yinguowei, wanjonyew | liangjian, kweksocheer
    assert_eq!(logins, vec!["liangjian", "kweksocheer"]);
}

#[tokio::test]
async fn test_list_page_past_the_end_is_empty() {
    let store = InMemoryStore::seeded().await.unwrap();
    let app = users_app(&store);

    let uri = format!("/?page={}&size=2000", u64::MAX);
    let response = app.oneshot(empty_request("GET", &uri)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-total-count"], "4");

    let users: Vec<UserResponse> = json_body(response).await;
    assert!(users.is_empty());
}

#[tokio::test]
async fn test_list_filters_by_keyword() {
    let store = InMemoryStore::seeded().await.unwrap();
    let app = users_app(&store);

    let response = app
        .oneshot(empty_request("GET", "/?keyword=JON"))
        .await
        .unwrap();
    assert_eq!(response.headers()["x-total-count"], "1");

    let users: Vec<UserResponse> = json_body(response).await;
    assert_eq!(users[0].login, "wanjonyew");
}

#[tokio::test]
async fn test_list_rejects_unknown_sort_property() {
    let app = users_app(&InMemoryStore::new());

    let response = app
        .oneshot(empty_request("GET", "/?sort=password"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_list_roles() {
    let (store, user_role, admin_role) = store_with_roles().await;
    let app = handlers::roles_router(RoleService::new(store));

    let response = app.oneshot(empty_request("GET", "/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let roles: Vec<Value> = json_body(response).await;
    assert_eq!(roles.len(), 2);
    assert_eq!(roles[0]["id"], user_role.id);
    assert_eq!(roles[0]["code"], "USER");
    assert_eq!(roles[1]["code"], "ADMIN");
    assert_eq!(roles[1]["name"], admin_role.name);
}
