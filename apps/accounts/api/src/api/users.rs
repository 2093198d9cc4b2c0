use axum::Router;
use domain_users::{PgRoleRepository, PgUserRepository, UserService, handlers};

use crate::state::{AppState, Store};

pub fn router(state: &AppState) -> Router {
    match &state.store {
        Store::Postgres(db) => handlers::users_router(UserService::new(
            PgUserRepository::new(db.clone()),
            PgRoleRepository::new(db.clone()),
        )),
        Store::Memory(store) => {
            handlers::users_router(UserService::new(store.clone(), store.clone()))
        }
    }
}
