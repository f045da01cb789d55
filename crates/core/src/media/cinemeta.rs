//! Cinemeta metadata client.
//!
//! Resolves external ids (IMDb) against a Cinemeta-compatible endpoint.
//! Cinemeta is keyless; the meta object carries the title, release year and,
//! for series, the full episode listing used for next-episode lookups.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::config::MetadataConfig;

use super::types::{
    parse_compound_id, EpisodeRef, MediaRequest, MediaType, MetadataError, MetadataService,
};

/// Cinemeta API client.
pub struct CinemetaClient {
    client: Client,
    base_url: String,
}

impl CinemetaClient {
    pub fn new(config: MetadataConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
        }
    }

    async fn fetch_meta(
        &self,
        media_type: MediaType,
        external_id: &str,
    ) -> Result<CinemetaMeta, MetadataError> {
        let url = format!(
            "{}/meta/{}/{}.json",
            self.base_url,
            media_type.as_str(),
            urlencoding::encode(external_id)
        );

        debug!(url = %url, "Fetching Cinemeta meta");

        let response = self.client.get(&url).send().await.map_err(|e| {
            if e.is_timeout() {
                MetadataError::Timeout
            } else {
                MetadataError::ApiError(e.to_string())
            }
        })?;

        if response.status() == 404 {
            return Err(MetadataError::NotFound(external_id.to_string()));
        }
        if !response.status().is_success() {
            return Err(MetadataError::ApiError(format!(
                "HTTP {}",
                response.status()
            )));
        }

        let body: CinemetaResponse = response
            .json()
            .await
            .map_err(|e| MetadataError::ApiError(format!("Failed to parse response: {}", e)))?;

        body.meta
            .ok_or_else(|| MetadataError::NotFound(external_id.to_string()))
    }
}

#[async_trait::async_trait]
impl MetadataService for CinemetaClient {
    async fn resolve(
        &self,
        media_type: MediaType,
        compound_id: &str,
        language: &str,
    ) -> Result<MediaRequest, MetadataError> {
        let (external_id, season, episode) = parse_compound_id(compound_id)?;

        if media_type == MediaType::Series && season.is_none() {
            return Err(MetadataError::InvalidId(format!(
                "series request without season/episode: {}",
                compound_id
            )));
        }

        let meta = self.fetch_meta(media_type, &external_id).await?;

        let year = meta
            .year
            .as_deref()
            .and_then(|y| y.split(|c: char| !c.is_ascii_digit()).next()?.parse().ok());

        let episodes = meta
            .videos
            .into_iter()
            .filter_map(|v| {
                Some(EpisodeRef {
                    season: v.season?,
                    episode: v.episode?,
                })
            })
            .collect();

        Ok(MediaRequest {
            media_type,
            external_id,
            title: meta.name,
            season,
            episode,
            year,
            language: language.to_string(),
            episodes,
        })
    }
}

#[derive(Debug, Deserialize)]
struct CinemetaResponse {
    meta: Option<CinemetaMeta>,
}

#[derive(Debug, Deserialize)]
struct CinemetaMeta {
    name: String,
    /// Release year; for series a range like "2008-2013".
    #[serde(default)]
    year: Option<String>,
    #[serde(default)]
    videos: Vec<CinemetaVideo>,
}

#[derive(Debug, Deserialize)]
struct CinemetaVideo {
    #[serde(default)]
    season: Option<u32>,
    #[serde(default)]
    episode: Option<u32>,
}
