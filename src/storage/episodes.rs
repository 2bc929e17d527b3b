use sqlx::QueryBuilder;

use super::schema::Database;
use super::types::{DatabaseError, Episode, EpisodeDbRow, EpisodeFilter, FacetCount};

/// Rows per multi-row INSERT. 10 columns * 50 = 500 binds, under SQLite's
/// 999 parameter limit.
const BATCH_SIZE: usize = 50;

const EPISODE_COLUMNS: &str = "id, title, description, audio_url, duration, image_url, \
                               category, language, pub_date, created_at";

impl Database {
    // ========================================================================
    // Episode Cache
    // ========================================================================

    /// Replace the whole episode cache with `episodes`, returning how many
    /// were stored.
    ///
    /// Delete and insert run in one transaction: readers see either the
    /// previous set or the new one, never a mix. An empty slice clears the
    /// cache.
    pub async fn replace_episodes(&self, episodes: &[Episode]) -> Result<usize, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let deleted = sqlx::query("DELETE FROM episodes")
            .execute(&mut *tx)
            .await?
            .rows_affected();

        for chunk in episodes.chunks(BATCH_SIZE) {
            let mut insert_builder: QueryBuilder<sqlx::Sqlite> =
                QueryBuilder::new(format!("INSERT INTO episodes ({}) ", EPISODE_COLUMNS));

            insert_builder.push_values(chunk, |mut b, episode| {
                b.push_bind(&episode.id)
                    .push_bind(&episode.title)
                    .push_bind(&episode.description)
                    .push_bind(&episode.audio_url)
                    .push_bind(&episode.duration)
                    .push_bind(&episode.image_url)
                    .push_bind(episode.category.as_str())
                    .push_bind(episode.language.as_str())
                    .push_bind(&episode.pub_date)
                    .push_bind(episode.created_at.timestamp_micros());
            });

            insert_builder.build().execute(&mut *tx).await?;
        }

        tx.commit().await?;

        tracing::info!(
            deleted = deleted,
            inserted = episodes.len(),
            "Replaced episode cache"
        );
        Ok(episodes.len())
    }

    /// Number of cached episodes. Zero means the cache needs a refresh.
    pub async fn count_episodes(&self) -> Result<i64, DatabaseError> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM episodes")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.0)
    }

    /// List cached episodes in feed order, optionally filtered by exact
    /// category and/or language. Both filters together return the
    /// intersection.
    pub async fn list_episodes(&self, filter: &EpisodeFilter) -> Result<Vec<Episode>, DatabaseError> {
        let mut builder: QueryBuilder<sqlx::Sqlite> =
            QueryBuilder::new(format!("SELECT {} FROM episodes WHERE 1 = 1", EPISODE_COLUMNS));

        if let Some(category) = &filter.category {
            builder.push(" AND category = ");
            builder.push_bind(category);
        }
        if let Some(language) = &filter.language {
            builder.push(" AND language = ");
            builder.push_bind(language);
        }
        builder.push(" ORDER BY rowid ASC");

        let rows: Vec<EpisodeDbRow> = builder.build_query_as().fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(EpisodeDbRow::into_episode).collect())
    }

    /// The `limit` most recently ingested episodes, newest first. Episodes
    /// stamped in the same microsecond come back later feed item first,
    /// matching the order a refresh stamps them in.
    pub async fn featured_episodes(&self, limit: u32) -> Result<Vec<Episode>, DatabaseError> {
        let rows: Vec<EpisodeDbRow> = sqlx::query_as(&format!(
            "SELECT {} FROM episodes ORDER BY created_at DESC, rowid DESC LIMIT ?",
            EPISODE_COLUMNS
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(EpisodeDbRow::into_episode).collect())
    }

    /// Episode counts per category, largest first.
    pub async fn category_counts(&self) -> Result<Vec<FacetCount>, DatabaseError> {
        let counts = sqlx::query_as::<_, FacetCount>(
            r#"
            SELECT category AS name, COUNT(*) AS count
            FROM episodes
            GROUP BY category
            ORDER BY count DESC, name ASC
        "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(counts)
    }

    /// Episode counts per language, largest first.
    pub async fn language_counts(&self) -> Result<Vec<FacetCount>, DatabaseError> {
        let counts = sqlx::query_as::<_, FacetCount>(
            r#"
            SELECT language AS name, COUNT(*) AS count
            FROM episodes
            GROUP BY language
            ORDER BY count DESC, name ASC
        "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(counts)
    }
}
