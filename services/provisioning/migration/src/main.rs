use sea_orm_migration::prelude::*;

#[tokio::main]
async fn main() {
    cli::run_cli(aidwallet_provisioning_migration::Migrator).await;
}
