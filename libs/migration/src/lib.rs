pub use sea_orm_migration::prelude::*;

mod m20250301_000000_create_roles;
mod m20250301_000001_create_users;
mod m20250301_000002_create_user_roles;
mod m20250302_000000_seed_accounts;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_000000_create_roles::Migration),
            Box::new(m20250301_000001_create_users::Migration),
            Box::new(m20250301_000002_create_user_roles::Migration),
            Box::new(m20250302_000000_seed_accounts::Migration),
        ]
    }
}
