mod episodes;
mod play_history;
mod schema;
mod types;

pub use schema::Database;
pub use types::{DatabaseError, Episode, EpisodeFilter, FacetCount, PlayHistoryEntry};
