use axum::{middleware, routing::get, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::{download, handlers, streams};
use crate::metrics::track_metrics;
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Stream listing and download resolution
        .route("/stream/{media_type}/{id}", get(streams::list_streams))
        .route(
            "/download/{media_type}/{id}/{torrent_id}",
            get(download::resolve),
        )
        // Health and config
        .route("/api/v1/health", get(handlers::health))
        .route("/api/v1/config", get(handlers::get_config))
        // Observability
        .route("/metrics", get(handlers::metrics))
        .layer(middleware::from_fn(track_metrics))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
