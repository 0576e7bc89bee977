//! ==============================================================================
//! server.rs - readings api
//! ==============================================================================
//!
//! routes:
//!     GET /api/readings -> current window as parallel arrays plus `latest`
//!
//! the handler only takes a snapshot of the store, so it never waits on the
//! sampler for longer than one push. cors is wide open: the dashboard
//! frontend runs on another origin and there is nothing to protect.
//!
//! ==============================================================================

use crate::domain::ReadingsSnapshot;
use crate::store::ReadingStore;
use anyhow::{Context, Result};
use axum::{extract::State, response::Json, routing::get, Router};
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;

pub fn router(store: ReadingStore) -> Router {
    Router::new()
        .route("/api/readings", get(readings_handler))
        .layer(CorsLayer::permissive())
        .with_state(store)
}

/// serve until `shutdown` fires
pub async fn serve(bind: String, store: ReadingStore, shutdown: CancellationToken) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("failed to bind {}", bind))?;
    tracing::info!("readings api live at http://{}/api/readings", listener.local_addr()?);

    axum::serve(listener, router(store))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;
    Ok(())
}

async fn readings_handler(State(store): State<ReadingStore>) -> Json<ReadingsSnapshot> {
    Json(store.snapshot().await)
}
