//! edeposit-users - account administration for edeposit-rest
//!
//! Works directly against the service database, so it can run while the
//! server is stopped or alongside it (SQLite WAL).

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use edeposit_common::config::{resolve_root_folder, RootFolder, TomlConfig, ROOT_FOLDER_ENV};
use tracing_subscriber::EnvFilter;

use edeposit_rest::db::SqliteUserDirectory;
use edeposit_rest::storage::UserDirectory;

#[derive(Parser, Debug)]
#[command(name = "edeposit-users")]
#[command(about = "Manage e-deposit user accounts")]
#[command(version)]
struct Args {
    /// Configuration file (TOML)
    #[arg(short, long, env = "EDEPOSIT_CONFIG")]
    config: Option<PathBuf>,

    /// Root folder holding the database
    #[arg(short, long)]
    root_folder: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create an account
    Add {
        username: String,
        /// Password (prefer the environment variable over the command line)
        #[arg(long, env = "EDEPOSIT_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Verify a username/password pair
    Check {
        username: String,
        #[arg(long, env = "EDEPOSIT_PASSWORD", hide_env_values = true)]
        password: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .init();

    let args = Args::parse();
    let config = TomlConfig::load_or_default(args.config.as_deref())
        .context("Failed to load configuration")?;

    let root = RootFolder::new(resolve_root_folder(
        args.root_folder.as_deref(),
        ROOT_FOLDER_ENV,
        config.root_folder.as_deref(),
    ));
    let db_path = config
        .database_path
        .clone()
        .unwrap_or_else(|| root.database_path());

    let pool = edeposit_common::db::init_database(&db_path)
        .await
        .with_context(|| format!("Failed to open database {}", db_path.display()))?;
    let users = SqliteUserDirectory::new(pool.clone());

    let outcome = match args.command {
        Command::Add { username, password } => users
            .add_user(&username, &password)
            .await
            .map(|_| println!("User '{}' added", username))
            .with_context(|| format!("Failed to add user '{}'", username)),
        Command::Check { username, password } => {
            match users.is_valid_user(&username, &password).await {
                Ok(true) => {
                    println!("Credentials valid");
                    Ok(())
                }
                Ok(false) => Err(anyhow::anyhow!("Credentials rejected for '{}'", username)),
                Err(e) => Err(e).context("User lookup failed"),
            }
        }
    };

    pool.close().await;
    outcome
}
