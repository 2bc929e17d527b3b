use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::classify::{Category, Language};

// ============================================================================
// Error Types
// ============================================================================

/// Database-specific errors
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Migration failed
    #[error("Database migration failed: {0}")]
    Migration(String),

    /// A play-history snapshot could not be encoded or decoded
    #[error("Invalid play history document: {0}")]
    Document(#[from] serde_json::Error),

    /// Generic database error
    #[error("Database error: {0}")]
    Other(#[from] sqlx::Error),
}

// ============================================================================
// Episodes
// ============================================================================

/// A tagged podcast episode as cached and served by the API.
///
/// Serialized with camelCase keys (`audioUrl`, `pubDate`, `createdAt`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Episode {
    pub id: String,
    pub title: String,
    pub description: String,
    pub audio_url: String,
    pub duration: String,
    pub image_url: String,
    pub category: Category,
    pub language: Language,
    /// Publish date exactly as the feed wrote it
    pub pub_date: String,
    pub created_at: DateTime<Utc>,
}

/// Internal row type for episode queries (used by sqlx FromRow).
/// Converts to Episode via into_episode().
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct EpisodeDbRow {
    pub id: String,
    pub title: String,
    pub description: String,
    pub audio_url: String,
    pub duration: String,
    pub image_url: String,
    pub category: String,
    pub language: String,
    pub pub_date: String,
    /// Microseconds since the Unix epoch
    pub created_at: i64,
}

impl EpisodeDbRow {
    pub(crate) fn into_episode(self) -> Episode {
        let category = self.category.parse().unwrap_or_else(|_| {
            tracing::warn!(id = %self.id, category = %self.category, "Unknown stored category");
            Category::default()
        });
        let language = self.language.parse().unwrap_or_else(|_| {
            tracing::warn!(id = %self.id, language = %self.language, "Unknown stored language");
            Language::default()
        });

        Episode {
            id: self.id,
            title: self.title,
            description: self.description,
            audio_url: self.audio_url,
            duration: self.duration,
            image_url: self.image_url,
            category,
            language,
            pub_date: self.pub_date,
            created_at: timestamp_from_micros(self.created_at),
        }
    }
}

/// Exact-match filters for listing episodes. `None` means no filter on that
/// dimension.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EpisodeFilter {
    pub category: Option<String>,
    pub language: Option<String>,
}

impl EpisodeFilter {
    /// Wildcard value accepted by the API for "no filter".
    pub const ALL: &'static str = "All";

    /// Builds a filter from raw query values, treating `"All"` and empty
    /// strings as absent.
    pub fn from_query(category: Option<&str>, language: Option<&str>) -> Self {
        fn normalize(value: Option<&str>) -> Option<String> {
            value
                .filter(|v| !v.is_empty() && *v != EpisodeFilter::ALL)
                .map(str::to_string)
        }

        Self {
            category: normalize(category),
            language: normalize(language),
        }
    }
}

/// A `{name, count}` pair from a group-by summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct FacetCount {
    pub name: String,
    pub count: i64,
}

// ============================================================================
// Play History
// ============================================================================

/// One play event: a frozen copy of whatever the client sent, plus the
/// generated `id` and `playedAt`.
///
/// The snapshot is not validated against the episode table; it may name
/// episodes that no longer exist after a refresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayHistoryEntry {
    pub id: String,
    pub played_at: DateTime<Utc>,
    #[serde(flatten)]
    pub snapshot: Map<String, Value>,
}

impl PlayHistoryEntry {
    /// Keys generated by the store; client-supplied values are dropped so
    /// the flattened JSON never carries duplicates.
    pub const RESERVED_KEYS: [&'static str; 2] = ["id", "playedAt"];
}

/// Timestamps are stored as microseconds, the finest precision `Utc::now()`
/// reliably carries across platforms.
pub(crate) fn timestamp_from_micros(micros: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_micros(micros).unwrap_or_default()
}
