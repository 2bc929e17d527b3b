//! REST surface over the episode cache and play history.
//!
//! Every route lives under `/api`. Failures are answered with HTTP 500 and a
//! JSON body `{"detail": "<context>: <error>"}` (see [`ApiError`]).

mod error;
mod handlers;
mod router;
mod state;

use std::net::SocketAddr;

pub use error::ApiError;
pub use router::create_router;
pub use state::AppState;

/// Bind `addr` and serve until Ctrl-C.
pub async fn serve(addr: SocketAddr, state: AppState) -> std::io::Result<()> {
    let app = create_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(addr = %listener.local_addr()?, "Listening");

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Failed to listen for shutdown signal");
            std::future::pending::<()>().await;
        }
        tracing::info!("Shutdown signal received");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
}
