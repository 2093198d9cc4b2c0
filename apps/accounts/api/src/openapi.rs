use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    components(
        schemas(axum_helpers::ErrorResponse)
    ),
    info(
        title = "Accounts API",
        version = "0.1.0",
        description = "User accounts and role assignments"
    ),
    servers(
        (url = "/api", description = "API base path")
    ),
    nest(
        (path = "/users", api = domain_users::UsersApiDoc),
        (path = "/roles", api = domain_users::RolesApiDoc),
    )
)]
pub struct ApiDoc;
