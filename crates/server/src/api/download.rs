use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use std::sync::Arc;
use tracing::warn;

use debridarr_core::{DownloadError, MediaType};

use super::streams::ErrorResponse;
use crate::state::AppState;

/// Resolve one torrent to a direct download URL and redirect to it.
pub async fn resolve(
    State(state): State<Arc<AppState>>,
    Path((media_type, id, torrent_id)): Path<(String, String, String)>,
) -> Response {
    let Ok(media_type) = media_type.parse::<MediaType>() else {
        return error_response(
            StatusCode::BAD_REQUEST,
            format!("unknown media type: {}", media_type),
        );
    };

    match state
        .aggregator()
        .resolve_download(state.preferences(), media_type, &id, &torrent_id)
        .await
    {
        Ok(url) => Redirect::temporary(&url).into_response(),
        Err(e @ DownloadError::InvalidCredential(_)) => {
            error_response(StatusCode::FORBIDDEN, e.to_string())
        }
        Err(e @ (DownloadError::NoDownload | DownloadError::TorrentNotFound(_))) => {
            error_response(StatusCode::NOT_FOUND, e.to_string())
        }
        Err(e @ DownloadError::ProviderUnavailable) => {
            error_response(StatusCode::SERVICE_UNAVAILABLE, e.to_string())
        }
        Err(e) => {
            warn!(error = %e, "Download resolution failed");
            error_response(StatusCode::BAD_GATEWAY, e.to_string())
        }
    }
}

fn error_response(status: StatusCode, message: String) -> Response {
    (status, Json(ErrorResponse { error: message })).into_response()
}
