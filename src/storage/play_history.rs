use chrono::Utc;
use serde_json::{Map, Value};

use super::schema::Database;
use super::types::{timestamp_from_micros, DatabaseError, PlayHistoryEntry};

impl Database {
    // ========================================================================
    // Play History Operations
    // ========================================================================

    /// Record that a client played something.
    ///
    /// `snapshot` is stored verbatim apart from `id` and `playedAt`, which
    /// are generated here. Returns the stored entry.
    pub async fn record_play(
        &self,
        mut snapshot: Map<String, Value>,
    ) -> Result<PlayHistoryEntry, DatabaseError> {
        for key in PlayHistoryEntry::RESERVED_KEYS {
            snapshot.remove(key);
        }

        let id = uuid::Uuid::new_v4().to_string();
        let played_at = Utc::now();
        let document = serde_json::to_string(&snapshot)?;

        sqlx::query(
            r#"
            INSERT INTO play_history (id, played_at, snapshot)
            VALUES (?, ?, ?)
        "#,
        )
        .bind(&id)
        .bind(played_at.timestamp_micros())
        .bind(&document)
        .execute(&self.pool)
        .await?;

        tracing::debug!(id = %id, "Recorded play");

        Ok(PlayHistoryEntry {
            id,
            played_at: timestamp_from_micros(played_at.timestamp_micros()),
            snapshot,
        })
    }

    /// The `limit` most recent plays, newest first. Plays recorded in the
    /// same microsecond come back latest insert first.
    pub async fn recent_plays(&self, limit: u32) -> Result<Vec<PlayHistoryEntry>, DatabaseError> {
        let rows: Vec<(String, i64, String)> = sqlx::query_as(
            r#"
            SELECT id, played_at, snapshot
            FROM play_history
            ORDER BY played_at DESC, seq DESC
            LIMIT ?
        "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|(id, played_at, snapshot)| -> Result<_, DatabaseError> {
                Ok(PlayHistoryEntry {
                    id,
                    played_at: timestamp_from_micros(played_at),
                    snapshot: serde_json::from_str(&snapshot)?,
                })
            })
            .collect()
    }
}
