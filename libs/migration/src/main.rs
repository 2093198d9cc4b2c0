use migration::Migrator;
use sea_orm_migration::cli;

/// Reads `DATABASE_URL`; run with `up`, `down`, `status`, `fresh`, ...
#[tokio::main]
async fn main() {
    cli::run_cli(Migrator).await;
}
