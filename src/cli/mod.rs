// CLI module for administrative operations requiring server access

pub mod bootstrap;
pub mod migrate;

use clap::{Parser, Subcommand};

use crate::app_data::AppData;

/// Identity admin CLI for operations run before or outside the HTTP layer
#[derive(Parser)]
#[command(name = "identity-admin")]
#[command(about = "User administration and role hierarchy backend CLI", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run pending database migrations
    Migrate,

    /// Create a role. Lower sort means more privilege.
    CreateRole {
        #[arg(long)]
        name: String,

        #[arg(long)]
        sort: i32,
    },

    /// Create the top-rank role and the first enabled user
    Bootstrap {
        #[arg(long)]
        username: String,

        /// Generated and printed once when omitted
        #[arg(long)]
        password: Option<String>,
    },
}

/// Execute a CLI command that needs initialized AppData
///
/// `Migrate` is handled by the caller before AppData exists.
///
/// # Arguments
/// * `command` - Parsed subcommand
/// * `app_data` - Application data containing all stores
pub async fn execute_command(command: Commands, app_data: &AppData) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Migrate => {
            migrate::run_migrations(&app_data.db).await?;
        }
        Commands::CreateRole { name, sort } => {
            bootstrap::create_role(app_data, &name, sort).await?;
        }
        Commands::Bootstrap { username, password } => {
            bootstrap::bootstrap_system(app_data, &username, password).await?;
        }
    }

    Ok(())
}
