//! Ubuntu Tales backend: caches a children's story podcast feed, tags each
//! episode with a category and language, and serves it over a small REST API.

pub mod api;
pub mod classify;
pub mod config;
pub mod feed;
pub mod storage;
pub mod util;
