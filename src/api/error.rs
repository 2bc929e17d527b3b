use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::feed::RefreshError;
use crate::storage::DatabaseError;

/// A failed request. Every variant is answered with HTTP 500 and a
/// `detail` string of the form `"<context>: <error>"`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{context}: {source}")]
    Store {
        context: &'static str,
        source: DatabaseError,
    },

    #[error("{context}: {source}")]
    Refresh {
        context: &'static str,
        source: RefreshError,
    },
}

impl ApiError {
    pub fn store(context: &'static str, source: DatabaseError) -> Self {
        Self::Store { context, source }
    }

    pub fn refresh(context: &'static str, source: RefreshError) -> Self {
        Self::Refresh { context, source }
    }
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    detail: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let detail = self.to_string();
        tracing::error!(detail = %detail, "Request failed");

        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse { detail }),
        )
            .into_response()
    }
}
