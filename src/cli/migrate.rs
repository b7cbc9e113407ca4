use sea_orm::DatabaseConnection;

use crate::config::migrate_database;

/// Run all pending identity schema migrations
pub async fn run_migrations(db: &DatabaseConnection) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!("Running database migrations...");

    migrate_database(db).await?;

    tracing::info!("All migrations completed successfully");
    println!("Migrations applied");

    Ok(())
}
