use std::sync::Arc;

use crate::config::Config;
use crate::storage::Database;

/// Shared handler state. Clones are cheap: the database wraps a pool and
/// `reqwest::Client` is reference-counted internally.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub client: reqwest::Client,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(db: Database, client: reqwest::Client, config: Config) -> Self {
        Self {
            db,
            client,
            config: Arc::new(config),
        }
    }
}
