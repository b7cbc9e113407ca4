use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use migration::{IdentityMigrator, MigratorTrait};

use crate::config::Settings;
use crate::errors::InternalError;

/// Connect to the identity database
///
/// The pool acquire timeout follows the store timeout so a saturated pool
/// fails the same way a slow query does. Does NOT run migrations.
pub async fn init_database(settings: &Settings) -> Result<DatabaseConnection, InternalError> {
    let mut options = ConnectOptions::new(settings.database_url().to_owned());
    options
        .max_connections(settings.max_connections())
        .acquire_timeout(settings.store_timeout())
        .sqlx_logging(false);

    let db = Database::connect(options)
        .await
        .map_err(|e| InternalError::database("connect_database", e))?;

    tracing::debug!("Connected to identity database: {}", settings.database_url());

    Ok(db)
}

/// Run all pending migrations on the identity database
pub async fn migrate_database(db: &DatabaseConnection) -> Result<(), InternalError> {
    IdentityMigrator::up(db, None)
        .await
        .map_err(|e| InternalError::database("run_migrations", e))?;

    tracing::debug!("Identity database migrations completed");

    Ok(())
}
