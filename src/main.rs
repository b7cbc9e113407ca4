use std::sync::Arc;

use clap::Parser;

use identity_admin::AppData;
use identity_admin::cli::{Cli, Commands, execute_command, migrate};
use identity_admin::config::{LoggingConfig, Settings, init_database, init_logging};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    let logging_config = LoggingConfig::from_env();
    init_logging(&logging_config)?;

    let cli = Cli::parse();
    let settings = Settings::from_env()?;

    tracing::debug!(?settings, "Settings loaded");

    let db = init_database(&settings).await?;

    // Migrations run without building AppData
    if let Commands::Migrate = cli.command {
        return migrate::run_migrations(&db).await;
    }

    let app_data = Arc::new(AppData::init(&settings, db));
    let sweeper = app_data.identity_cache.spawn_sweeper();

    let result = execute_command(cli.command, &app_data).await;

    sweeper.abort();
    result
}
