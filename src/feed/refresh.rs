use chrono::Utc;
use thiserror::Error;

use super::fetcher::{fetch_feed, FetchError};
use super::parser::{parse_feed, FeedItem, ParseError};
use crate::classify::{categorize, detect_language};
use crate::config::FeedConfig;
use crate::storage::{Database, DatabaseError, Episode};
use crate::util::clean_html;

/// Errors from a full refresh. Each variant names the stage that failed.
#[derive(Debug, Error)]
pub enum RefreshError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("Feed parse failed: {0}")]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Store(#[from] DatabaseError),
}

/// Rebuild the episode cache from the configured feed.
///
/// Downloads and parses the whole feed before touching the database, so a
/// fetch or parse failure leaves the cache exactly as it was. On success the
/// cache holds precisely the episodes from this fetch, in feed order, and the
/// count is returned. A feed with zero usable items empties the cache.
pub async fn refresh_episodes(
    db: &Database,
    client: &reqwest::Client,
    feed: &FeedConfig,
) -> Result<usize, RefreshError> {
    let bytes = fetch_feed(client, feed).await.inspect_err(|e| {
        tracing::warn!(url = %feed.url, error = %e, "Feed fetch failed");
    })?;

    let items = parse_feed(&bytes).inspect_err(|e| {
        tracing::warn!(url = %feed.url, error = %e, "Feed parse failed");
    })?;

    let episodes: Vec<Episode> = items.into_iter().map(tag_episode).collect();
    let stored = db.replace_episodes(&episodes).await?;

    tracing::info!(url = %feed.url, count = stored, "Refreshed episodes");
    Ok(stored)
}

/// Sanitize one parsed item and attach its generated id and tags.
fn tag_episode(item: FeedItem) -> Episode {
    let title = clean_html(Some(&item.title));
    let description = clean_html(item.description.as_deref());

    Episode {
        id: uuid::Uuid::new_v4().to_string(),
        category: categorize(&title, &description),
        language: detect_language(&title, &description),
        title,
        description,
        audio_url: item.audio_url,
        duration: item.duration,
        image_url: item.image_url,
        pub_date: item.pub_date,
        created_at: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{Category, Language};
    use pretty_assertions::assert_eq;

    fn item(title: &str, description: Option<&str>) -> FeedItem {
        FeedItem {
            title: title.to_string(),
            description: description.map(str::to_string),
            audio_url: "https://example.com/a.mp3".to_string(),
            duration: "00:05:00".to_string(),
            image_url: "https://example.com/a.jpg".to_string(),
            pub_date: "Tue, 02 Jan 2024 10:00:00 GMT".to_string(),
        }
    }

    #[test]
    fn test_tag_episode_cleans_before_classifying() {
        let episode = tag_episode(item(
            "<b>The Lion &amp; the Mouse</b>",
            Some("<p>A fable</p>"),
        ));

        assert_eq!(episode.title, "The Lion & the Mouse");
        assert_eq!(episode.description, "A fable");
        assert_eq!(episode.category, Category::Animals);
        assert_eq!(episode.language, Language::English);
        assert_eq!(episode.audio_url, "https://example.com/a.mp3");
        assert_eq!(episode.duration, "00:05:00");
        assert_eq!(episode.pub_date, "Tue, 02 Jan 2024 10:00:00 GMT");
    }

    #[test]
    fn test_tag_episode_missing_description() {
        let episode = tag_episode(item("Grandma's kitchen", None));
        assert_eq!(episode.description, "");
        assert_eq!(episode.category, Category::Stories);
    }

    #[test]
    fn test_tag_episode_generates_unique_ids() {
        let a = tag_episode(item("One", None));
        let b = tag_episode(item("One", None));
        assert_ne!(a.id, b.id);
    }
}
