use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};

use ubuntu_tales::api::{self, AppState};
use ubuntu_tales::config::Config;
use ubuntu_tales::feed::{build_client, refresh_episodes};
use ubuntu_tales::storage::Database;

#[derive(Parser, Debug)]
#[command(
    name = "ubuntu-tales",
    about = "Podcast feed cache and REST API for children's stories"
)]
struct Args {
    /// Path to the TOML config file (optional; defaults apply when missing)
    #[arg(long, value_name = "FILE", default_value = "tales.toml")]
    config: PathBuf,

    /// Listen address, overriding the config file and environment
    #[arg(long, value_name = "ADDR")]
    bind: Option<String>,

    /// Reset database (delete and recreate)
    #[arg(long)]
    reset_db: bool,

    /// Refresh the episode cache once and exit without serving
    #[arg(long)]
    refresh: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let mut config = Config::load(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?
        .with_env_overrides();
    if let Some(bind) = args.bind {
        config.bind_address = bind;
    }
    config.validate().context("Invalid configuration")?;

    if args.reset_db {
        reset_database(&config.database_path)?;
    }

    let db = Database::open(&config.database_path)
        .await
        .with_context(|| format!("Failed to open database at {}", config.database_path))?;
    let client = build_client().context("Failed to build HTTP client")?;

    if args.refresh {
        let count = refresh_episodes(&db, &client, &config.feed)
            .await
            .context("Failed to refresh episodes")?;
        println!("Refreshed {} episodes", count);
        return Ok(());
    }

    let addr = config.socket_addr()?;
    tracing::info!(app = %config.app_name, feed = %config.feed.url, "Starting server");

    api::serve(addr, AppState::new(db, client, config))
        .await
        .with_context(|| format!("Server on {} failed", addr))?;

    println!("Goodbye!");
    Ok(())
}

/// Delete the database file so the next open starts from an empty schema.
fn reset_database(path: &str) -> Result<()> {
    if path == Database::IN_MEMORY {
        return Ok(());
    }

    let db_path = Path::new(path);
    if db_path.exists() {
        std::fs::remove_file(db_path).context("Failed to delete database")?;
        println!("Database reset.");
    }

    // WAL sidecars would otherwise be replayed into the fresh file
    for suffix in ["-wal", "-shm"] {
        let sidecar = PathBuf::from(format!("{}{}", path, suffix));
        if sidecar.exists() {
            std::fs::remove_file(&sidecar)
                .with_context(|| format!("Failed to delete {}", sidecar.display()))?;
        }
    }
    Ok(())
}
