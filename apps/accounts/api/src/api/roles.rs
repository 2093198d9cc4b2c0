use axum::Router;
use domain_users::{PgRoleRepository, RoleService, handlers};

use crate::state::{AppState, Store};

pub fn router(state: &AppState) -> Router {
    match &state.store {
        Store::Postgres(db) => {
            handlers::roles_router(RoleService::new(PgRoleRepository::new(db.clone())))
        }
        Store::Memory(store) => handlers::roles_router(RoleService::new(store.clone())),
    }
}
