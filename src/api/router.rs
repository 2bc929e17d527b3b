use axum::{
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use tower_http::cors::{AllowMethods, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers;
use super::state::AppState;

/// Builds the application router with every route nested under `/api`.
pub fn create_router(state: AppState) -> Router {
    let cors = build_cors(&state.config.cors_origins);

    let api = Router::new()
        .route("/episodes", get(handlers::list_episodes))
        .route("/refresh-episodes", post(handlers::refresh))
        .route("/categories", get(handlers::categories))
        .route("/languages", get(handlers::languages))
        .route("/featured", get(handlers::featured))
        .route("/play-history", post(handlers::add_play_history))
        .route("/recent", get(handlers::recent))
        .route("/health", get(handlers::health));

    Router::new()
        .nest("/api", api)
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Any origin when `origins` is empty; otherwise only the listed ones.
/// Entries that are not valid header values are skipped with a warning.
fn build_cors(origins: &[String]) -> CorsLayer {
    let list: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin.trim()) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    let cors = CorsLayer::new()
        .allow_methods(AllowMethods::any())
        .allow_headers(Any);

    if list.is_empty() {
        cors.allow_origin(Any)
    } else {
        cors.allow_origin(list)
    }
}
