//! Podcast feed ingestion.
//!
//! - [`fetcher`] downloads the raw RSS document with a size cap and timeout
//! - [`parser`] extracts episode items, including `itunes:` fields
//! - [`refresh`] runs fetch, parse, sanitize and classify, then replaces the
//!   cached episode set in one transaction
//!
//! # Example
//!
//! ```ignore
//! use ubuntu_tales::feed::refresh_episodes;
//!
//! let count = refresh_episodes(&db, &client, &config.feed).await?;
//! ```

mod fetcher;
mod parser;
mod refresh;

pub use fetcher::{build_client, fetch_feed, FetchError};
pub use parser::{parse_feed, FeedItem, ParseError};
pub use refresh::{refresh_episodes, RefreshError};
