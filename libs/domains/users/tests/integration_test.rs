//! Integration tests for the Users domain
//!
//! These tests use real PostgreSQL via testcontainers to ensure:
//! - The raw SQL matches the migrated schema
//! - The unique login index backs duplicate detection
//! - Role joins and cascading deletes behave as expected
//!
//! They need a Docker daemon: `cargo test -- --ignored`.

use axum_helpers::Actor;
use domain_users::models::NewUser;
use domain_users::*;
use test_utils::{TestDataBuilder, TestDatabase, assertions::*};

fn new_user(builder: &TestDataBuilder, suffix: &str) -> NewUser {
    NewUser {
        name: builder.name(suffix),
        login: builder.login(suffix),
        email: builder.email(suffix),
        password_hash: password::hash_password("secret").unwrap(),
    }
}

// ============================================================================
// Repository Tests
// ============================================================================

#[tokio::test]
#[ignore] // Requires Docker
async fn test_create_and_get_user() {
    let db = TestDatabase::new().await;
    let repo = PgUserRepository::new(db.connection());
    let builder = TestDataBuilder::from_test_name("create_and_get");
    let actor = Actor::new("tester");

    let created = assert_ok(
        repo.create(new_user(&builder, "main"), &actor).await,
        "create user",
    );
    assert_eq!(created.login, builder.login("main"));
    assert!(created.roles.is_empty());
    assert_eq!(created.audit.created_by, "tester");

    let by_id = assert_some(repo.get_by_id(created.id).await.unwrap(), "user by id");
    assert_eq!(by_id.email, builder.email("main"));

    let by_login = assert_some(
        repo.get_by_login(&builder.login("main")).await.unwrap(),
        "user by login",
    );
    assert_eq!(by_login.id, created.id);
}

#[tokio::test]
#[ignore] // Requires Docker
async fn test_duplicate_login_is_rejected() {
    let db = TestDatabase::new().await;
    let repo = PgUserRepository::new(db.connection());
    let builder = TestDataBuilder::from_test_name("duplicate_login");
    let actor = Actor::system();

    repo.create(new_user(&builder, "dup"), &actor).await.unwrap();
    let result = repo.create(new_user(&builder, "dup"), &actor).await;

    assert!(matches!(result, Err(UserError::DuplicateLogin(_))));
}

#[tokio::test]
#[ignore] // Requires Docker
async fn test_search_matches_keyword_case_insensitively() {
    let db = TestDatabase::new().await;
    let repo = PgUserRepository::new(db.connection());
    let builder = TestDataBuilder::from_test_name("search_keyword");
    let actor = Actor::system();

    for suffix in ["alpha", "beta", "gamma"] {
        repo.create(new_user(&builder, suffix), &actor).await.unwrap();
    }

    let keyword = builder.login("").to_uppercase();
    let page = PageRequest::new(0, 2).with_sort(vec![SortOrder::desc(models::SortField::Login)]);
    let (users, total) = repo.search(Some(keyword), &page).await.unwrap();

    assert_eq!(total, 3);
    assert_len(&users, 2, "first page");
    assert_eq!(users[0].login, builder.login("gamma"));
    assert_eq!(users[1].login, builder.login("beta"));
}

#[tokio::test]
#[ignore] // Requires Docker
async fn test_search_escapes_like_wildcards() {
    let db = TestDatabase::new().await;
    let repo = PgUserRepository::new(db.connection());

    let (users, total) = repo
        .search(Some("%".to_string()), &PageRequest::default())
        .await
        .unwrap();

    assert_eq!(total, 0);
    assert!(users.is_empty());
}

#[tokio::test]
#[ignore] // Requires Docker
async fn test_update_touches_audit_fields() {
    let db = TestDatabase::new().await;
    let repo = PgUserRepository::new(db.connection());
    let builder = TestDataBuilder::from_test_name("update_audit");

    let mut user = repo
        .create(new_user(&builder, "main"), &Actor::new("creator"))
        .await
        .unwrap();
    user.email = builder.email("changed");

    let updated = repo.update(user, &Actor::new("editor")).await.unwrap();
    assert_eq!(updated.email, builder.email("changed"));
    assert_eq!(updated.audit.created_by, "creator");
    assert_eq!(updated.audit.last_modified_by, "editor");
    assert!(updated.audit.last_modified_at >= updated.audit.created_at);
}

#[tokio::test]
#[ignore] // Requires Docker
async fn test_role_grant_for_deleted_user_is_not_found() {
    let db = TestDatabase::new().await;
    let users = PgUserRepository::new(db.connection());
    let builder = TestDataBuilder::from_test_name("grant_deleted");
    let actor = Actor::system();

    let user = users.create(new_user(&builder, "gone"), &actor).await.unwrap();
    assert!(users.delete(user.id).await.unwrap());

    let result = users.add_role(user.id, 1, &actor).await;
    assert!(matches!(result, Err(UserError::UserNotFound(id)) if id == user.id));
}

#[tokio::test]
#[ignore] // Requires Docker
async fn test_role_grant_is_idempotent_and_cascades() {
    let db = TestDatabase::new().await;
    let users = PgUserRepository::new(db.connection());
    let roles = PgRoleRepository::new(db.connection());
    let builder = TestDataBuilder::from_test_name("role_grant");
    let actor = Actor::system();

    let user = users.create(new_user(&builder, "main"), &actor).await.unwrap();
    let admin = roles
        .list()
        .await
        .unwrap()
        .into_iter()
        .find(|r| r.code == RoleCode::Admin)
        .unwrap();

    assert!(users.add_role(user.id, admin.id, &actor).await.unwrap());
    assert!(!users.add_role(user.id, admin.id, &actor).await.unwrap());

    let reloaded = users.get_by_id(user.id).await.unwrap().unwrap();
    assert_eq!(reloaded.roles.len(), 1);
    assert!(reloaded.has_role(admin.id));

    assert!(users.remove_role(user.id, admin.id, &actor).await.unwrap());
    assert!(!users.remove_role(user.id, admin.id, &actor).await.unwrap());

    users.add_role(user.id, admin.id, &actor).await.unwrap();
    assert!(users.delete(user.id).await.unwrap());
    assert!(users.get_by_id(user.id).await.unwrap().is_none());
    assert!(!users.delete(user.id).await.unwrap());
}

#[tokio::test]
#[ignore] // Requires Docker
async fn test_seed_data_is_present() {
    let db = TestDatabase::new().await;
    let users = PgUserRepository::new(db.connection());
    let roles = PgRoleRepository::new(db.connection());

    let all_roles = roles.list().await.unwrap();
    assert_len(&all_roles, 2, "seeded roles");

    let admin = assert_some(
        users.get_by_login("yinguowei").await.unwrap(),
        "seeded admin",
    );
    assert_eq!(admin.roles.len(), 2);
    assert!(password::verify_password("yinguowei", &admin.password_hash).unwrap());
}

// ============================================================================
// Service Tests
// ============================================================================

#[tokio::test]
#[ignore] // Requires Docker
async fn test_service_add_role_against_postgres() {
    let db = TestDatabase::new().await;
    let service = UserService::new(
        PgUserRepository::new(db.connection()),
        PgRoleRepository::new(db.connection()),
    );
    let builder = TestDataBuilder::from_test_name("service_add_role");
    let actor = Actor::system();

    let created = service
        .create(
            CreateUser {
                name: builder.name("main"),
                login: builder.login("main"),
                email: builder.email("main"),
                password: "secret".to_string(),
            },
            &actor,
        )
        .await
        .unwrap();

    let missing = service.add_role(created.id, 9999, &actor).await;
    assert!(matches!(missing, Err(UserError::RoleNotFound(9999))));

    let first = service.add_role(created.id, 1, &actor).await.unwrap();
    let second = service.add_role(created.id, 1, &actor).await.unwrap();
    assert_eq!(first.roles, second.roles);
    assert_len(&second.roles, 1, "roles after double grant");
}
