//! Types for media identification and metadata resolution.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Kind of media an aggregation request is about.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MediaType {
    Movie,
    Series,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Movie => "movie",
            MediaType::Series => "series",
        }
    }
}

impl std::str::FromStr for MediaType {
    type Err = MetadataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "movie" => Ok(MediaType::Movie),
            "series" => Ok(MediaType::Series),
            other => Err(MetadataError::InvalidId(format!(
                "unknown media type: {}",
                other
            ))),
        }
    }
}

/// One episode of a series, as listed by the metadata service.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct EpisodeRef {
    pub season: u32,
    pub episode: u32,
}

/// A resolved media request. Immutable for the duration of one aggregation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaRequest {
    pub media_type: MediaType,
    /// External identifier (e.g. an IMDb id like "tt0903747").
    pub external_id: String,
    /// Resolved display title, used to build search queries.
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub season: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub episode: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<u32>,
    pub language: String,
    /// For series: every episode of the show known to the metadata service.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub episodes: Vec<EpisodeRef>,
}

impl MediaRequest {
    /// Canonical identity of this request, used as coalescing key.
    pub fn id(&self) -> String {
        match (self.season, self.episode) {
            (Some(s), Some(e)) => {
                format!("{}:{}:{}:{}", self.media_type.as_str(), self.external_id, s, e)
            }
            _ => format!("{}:{}", self.media_type.as_str(), self.external_id),
        }
    }
}

/// Split a compound identifier ("tt123" or "tt123:2:5") into its parts.
pub fn parse_compound_id(raw: &str) -> Result<(String, Option<u32>, Option<u32>), MetadataError> {
    let mut parts = raw.split(':');
    let external_id = parts
        .next()
        .filter(|p| !p.is_empty())
        .ok_or_else(|| MetadataError::InvalidId(raw.to_string()))?
        .to_string();

    let season = parts
        .next()
        .map(|p| p.parse::<u32>())
        .transpose()
        .map_err(|_| MetadataError::InvalidId(raw.to_string()))?;
    let episode = parts
        .next()
        .map(|p| p.parse::<u32>())
        .transpose()
        .map_err(|_| MetadataError::InvalidId(raw.to_string()))?;

    if parts.next().is_some() || (season.is_some() != episode.is_some()) {
        return Err(MetadataError::InvalidId(raw.to_string()));
    }

    Ok((external_id, season, episode))
}

/// Errors from the metadata service.
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("Invalid media identifier: {0}")]
    InvalidId(String),

    #[error("Media not found: {0}")]
    NotFound(String),

    #[error("Metadata API error: {0}")]
    ApiError(String),

    #[error("Metadata request timed out")]
    Timeout,
}

/// Resolves a compound identifier to a full `MediaRequest`.
#[async_trait]
pub trait MetadataService: Send + Sync {
    async fn resolve(
        &self,
        media_type: MediaType,
        compound_id: &str,
        language: &str,
    ) -> Result<MediaRequest, MetadataError>;
}
