use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};
use std::str::FromStr;
use std::time::Duration;

use super::types::DatabaseError;

// ============================================================================
// Database
// ============================================================================

/// Handle to the episode cache and play history.
///
/// Cheap to clone (wraps a connection pool) and passed explicitly to
/// whatever needs storage.
#[derive(Clone)]
pub struct Database {
    pub(crate) pool: SqlitePool,
}

impl Database {
    /// Path that opens a private in-memory database.
    pub const IN_MEMORY: &'static str = ":memory:";

    /// Open a database connection and run migrations.
    ///
    /// `path` is a filesystem path (created if missing) or `:memory:`.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Migration` if the schema could not be applied
    /// and `DatabaseError::Other` for connection errors.
    pub async fn open(path: &str) -> Result<Self, DatabaseError> {
        let in_memory = path == Self::IN_MEMORY;
        let url = if in_memory {
            "sqlite::memory:".to_string()
        } else {
            format!("sqlite:{}?mode=rwc", path)
        };

        // busy_timeout=5000: SQLite waits up to 5 seconds for locks to release before returning SQLITE_BUSY.
        // Using pragma() ensures all connections in the pool inherit this setting.
        let options = SqliteConnectOptions::from_str(&url)?.pragma("busy_timeout", "5000");

        // Every in-memory connection is its own database, so the pool must
        // hold exactly one connection for the lifetime of the handle.
        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };

        let pool = pool_options
            .acquire_timeout(Duration::from_secs(10))
            .connect_with(options)
            .await?;
        let db = Self { pool };
        db.migrate()
            .await
            .map_err(|e| DatabaseError::Migration(e.to_string()))?;

        tracing::debug!(path = %path, "Database opened");
        Ok(db)
    }

    /// Run database migrations atomically within a transaction.
    ///
    /// All migrations use `IF NOT EXISTS` for idempotency, so re-running on
    /// an existing database is a no-op.
    async fn migrate(&self) -> Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        // Episodes are replaced wholesale on every refresh; rowid keeps feed order.
        // created_at holds Unix microseconds.
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS episodes (
                id TEXT PRIMARY KEY NOT NULL,
                title TEXT NOT NULL,
                description TEXT NOT NULL,
                audio_url TEXT NOT NULL,
                duration TEXT NOT NULL,
                image_url TEXT NOT NULL,
                category TEXT NOT NULL,
                language TEXT NOT NULL,
                pub_date TEXT NOT NULL,
                created_at INTEGER NOT NULL
            )
        "#,
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_episodes_category ON episodes(category)")
            .execute(&mut *tx)
            .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_episodes_language ON episodes(language)")
            .execute(&mut *tx)
            .await?;
        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_episodes_created ON episodes(created_at DESC)",
        )
        .execute(&mut *tx)
        .await?;

        // Play history is append-only; played_at is Unix microseconds and
        // snapshots are stored as JSON documents
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS play_history (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT UNIQUE NOT NULL,
                played_at INTEGER NOT NULL,
                snapshot TEXT NOT NULL
            )
        "#,
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_play_history_played ON play_history(played_at DESC)",
        )
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }
}
