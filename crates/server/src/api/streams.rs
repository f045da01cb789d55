use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::warn;

use debridarr_core::{AggregateError, MediaType, StreamDescriptor};

use crate::state::AppState;

#[derive(Serialize)]
pub struct StreamsResponse {
    pub streams: Vec<StreamDescriptor>,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// List ranked stream candidates for a media id.
pub async fn list_streams(
    State(state): State<Arc<AppState>>,
    Path((media_type, id)): Path<(String, String)>,
) -> Response {
    let Ok(media_type) = media_type.parse::<MediaType>() else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: format!("unknown media type: {}", media_type),
            }),
        )
            .into_response();
    };

    // Stremio-style clients append .json to the id segment.
    let id = id.trim_end_matches(".json");

    match state
        .aggregator()
        .list_streams(state.preferences(), media_type, id, state.public_base_url())
        .await
    {
        Ok(streams) => Json(StreamsResponse { streams }).into_response(),
        // An empty result set is a valid, empty answer to the client.
        Err(AggregateError::NoResults) => {
            Json(StreamsResponse { streams: vec![] }).into_response()
        }
        Err(e @ AggregateError::NoIndexers) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )
            .into_response(),
        Err(e) => {
            warn!(error = %e, "Stream listing failed");
            (
                StatusCode::BAD_GATEWAY,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            )
                .into_response()
        }
    }
}
