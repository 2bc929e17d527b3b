use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::error::ApiError;
use super::state::AppState;
use crate::feed::refresh_episodes;
use crate::storage::{Episode, EpisodeFilter, FacetCount, PlayHistoryEntry};

const FEATURED_LIMIT: u32 = 3;
const RECENT_LIMIT: u32 = 5;

// ============================================================================
// Request / Response Types
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct EpisodeQuery {
    pub category: Option<String>,
    pub language: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct EpisodesResponse<T> {
    pub episodes: Vec<T>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct CategoriesResponse {
    pub categories: Vec<FacetCount>,
}

#[derive(Debug, Serialize)]
pub struct LanguagesResponse {
    pub languages: Vec<FacetCount>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub app: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// `GET /api/episodes`: cached episodes, optionally filtered.
///
/// An empty cache triggers one synchronous refresh before answering.
pub async fn list_episodes(
    State(state): State<AppState>,
    Query(query): Query<EpisodeQuery>,
) -> Result<Json<EpisodesResponse<Episode>>, ApiError> {
    const CONTEXT: &str = "Error fetching episodes";

    let cached = state
        .db
        .count_episodes()
        .await
        .map_err(|e| ApiError::store(CONTEXT, e))?;

    if cached == 0 {
        tracing::info!("Episode cache empty, refreshing before listing");
        refresh_episodes(&state.db, &state.client, &state.config.feed)
            .await
            .map_err(|e| ApiError::refresh(CONTEXT, e))?;
    }

    let filter = EpisodeFilter::from_query(query.category.as_deref(), query.language.as_deref());
    let episodes = state
        .db
        .list_episodes(&filter)
        .await
        .map_err(|e| ApiError::store(CONTEXT, e))?;

    Ok(Json(EpisodesResponse { episodes }))
}

/// `POST /api/refresh-episodes`
pub async fn refresh(State(state): State<AppState>) -> Result<Json<MessageResponse>, ApiError> {
    let count = refresh_episodes(&state.db, &state.client, &state.config.feed)
        .await
        .map_err(|e| ApiError::refresh("Error refreshing episodes", e))?;

    Ok(Json(MessageResponse {
        message: format!("Successfully refreshed {} episodes", count),
    }))
}

/// `GET /api/categories`
pub async fn categories(State(state): State<AppState>) -> Result<Json<CategoriesResponse>, ApiError> {
    let categories = state
        .db
        .category_counts()
        .await
        .map_err(|e| ApiError::store("Error fetching categories", e))?;

    Ok(Json(CategoriesResponse { categories }))
}

/// `GET /api/languages`
pub async fn languages(State(state): State<AppState>) -> Result<Json<LanguagesResponse>, ApiError> {
    let languages = state
        .db
        .language_counts()
        .await
        .map_err(|e| ApiError::store("Error fetching languages", e))?;

    Ok(Json(LanguagesResponse { languages }))
}

/// `GET /api/featured`: the newest episodes by ingestion time.
pub async fn featured(
    State(state): State<AppState>,
) -> Result<Json<EpisodesResponse<Episode>>, ApiError> {
    let episodes = state
        .db
        .featured_episodes(FEATURED_LIMIT)
        .await
        .map_err(|e| ApiError::store("Error fetching featured episodes", e))?;

    Ok(Json(EpisodesResponse { episodes }))
}

/// `POST /api/play-history`: stores the posted object as-is.
pub async fn add_play_history(
    State(state): State<AppState>,
    Json(snapshot): Json<Map<String, Value>>,
) -> Result<Json<MessageResponse>, ApiError> {
    state
        .db
        .record_play(snapshot)
        .await
        .map_err(|e| ApiError::store("Error adding to play history", e))?;

    Ok(Json(MessageResponse {
        message: "Added to play history".to_string(),
    }))
}

/// `GET /api/recent`: most recent plays.
pub async fn recent(
    State(state): State<AppState>,
) -> Result<Json<EpisodesResponse<PlayHistoryEntry>>, ApiError> {
    let episodes = state
        .db
        .recent_plays(RECENT_LIMIT)
        .await
        .map_err(|e| ApiError::store("Error fetching recent episodes", e))?;

    Ok(Json(EpisodesResponse { episodes }))
}

/// `GET /api/health`
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        app: state.config.app_name.clone(),
    })
}
