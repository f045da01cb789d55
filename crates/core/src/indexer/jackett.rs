//! Jackett-backed indexer registry and search transport.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::config::SearchConfig;
use crate::media::MediaRequest;
use crate::search::{detect_languages, detect_quality, detect_year};

use super::types::{
    torrent_id_from_link, IndexerDescriptor, IndexerRegistry, SearchError, Torrent,
};

const CATEGORY_MOVIES: i32 = 2000;
const CATEGORY_TV: i32 = 5000;

/// Jackett registry implementation.
pub struct JackettRegistry {
    client: Client,
    config: SearchConfig,
}

impl JackettRegistry {
    pub fn new(config: SearchConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()
            .expect("Failed to create HTTP client");

        Self { client, config }
    }

    /// Build the Jackett API URL for a search.
    fn build_search_url(&self, query: &str, indexer: &str, category: i32) -> String {
        format!(
            "{}/api/v2.0/indexers/{}/results?apikey={}&Query={}&Category[]={}",
            self.config.url.trim_end_matches('/'),
            urlencoding::encode(indexer),
            urlencoding::encode(&self.config.api_key),
            urlencoding::encode(query),
            category
        )
    }

    async fn search(
        &self,
        query: &str,
        indexer: &str,
        category: i32,
    ) -> Result<Vec<Torrent>, SearchError> {
        let url = self.build_search_url(query, indexer, category);
        debug!(indexer = indexer, query = query, "Searching Jackett");

        let response = self.client.get(&url).send().await.map_err(|e| {
            if e.is_timeout() {
                SearchError::Timeout
            } else if e.is_connect() {
                SearchError::ConnectionFailed(e.to_string())
            } else {
                SearchError::ApiError(e.to_string())
            }
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SearchError::ApiError(format!(
                "HTTP {}: {}",
                status,
                body.chars().take(200).collect::<String>()
            )));
        }

        let jackett_response: JackettResponse = response
            .json()
            .await
            .map_err(|e| SearchError::ApiError(format!("Failed to parse response: {}", e)))?;

        debug!(
            indexer = indexer,
            results = jackett_response.Results.len(),
            "Jackett search complete"
        );

        Ok(jackett_response
            .Results
            .into_iter()
            .filter_map(|r| map_result(r, indexer))
            .collect())
    }
}

#[async_trait]
impl IndexerRegistry for JackettRegistry {
    async fn list_indexers(&self) -> Result<Vec<IndexerDescriptor>, SearchError> {
        let url = format!(
            "{}/api/v2.0/indexers?apikey={}&configured=true",
            self.config.url.trim_end_matches('/'),
            urlencoding::encode(&self.config.api_key),
        );

        let response = self.client.get(&url).send().await.map_err(|e| {
            if e.is_connect() {
                SearchError::ConnectionFailed(e.to_string())
            } else {
                SearchError::ApiError(e.to_string())
            }
        })?;

        if !response.status().is_success() {
            return Err(SearchError::ApiError(format!(
                "HTTP {}",
                response.status()
            )));
        }

        let indexers: Vec<JackettIndexer> = response
            .json()
            .await
            .map_err(|e| SearchError::ApiError(format!("Failed to parse indexers: {}", e)))?;

        Ok(indexers.into_iter().map(map_indexer).collect())
    }

    async fn search_movie(
        &self,
        request: &MediaRequest,
        indexer_id: &str,
    ) -> Result<Vec<Torrent>, SearchError> {
        let query = match request.year {
            Some(year) => format!("{} {}", request.title, year),
            None => request.title.clone(),
        };
        self.search(&query, indexer_id, CATEGORY_MOVIES).await
    }

    async fn search_episode(
        &self,
        request: &MediaRequest,
        indexer_id: &str,
    ) -> Result<Vec<Torrent>, SearchError> {
        let query = format!(
            "{} S{:02}E{:02}",
            request.title,
            request.season.unwrap_or(1),
            request.episode.unwrap_or(1)
        );
        self.search(&query, indexer_id, CATEGORY_TV).await
    }

    async fn search_season(
        &self,
        request: &MediaRequest,
        indexer_id: &str,
    ) -> Result<Vec<Torrent>, SearchError> {
        let query = format!("{} S{:02}", request.title, request.season.unwrap_or(1));
        self.search(&query, indexer_id, CATEGORY_TV).await
    }
}

fn map_indexer(indexer: JackettIndexer) -> IndexerDescriptor {
    let supports = |prefix: char| {
        indexer
            .caps
            .iter()
            .any(|c| c.ID.starts_with(prefix))
    };
    IndexerDescriptor {
        supports_movie: supports('2'),
        supports_series: supports('5'),
        id: indexer.id,
        title: indexer.name,
    }
}

fn map_result(result: JackettResult, indexer: &str) -> Option<Torrent> {
    let link = result.Link.or(result.MagnetUri)?;
    Some(Torrent {
        id: torrent_id_from_link(&link),
        indexer_id: indexer.to_string(),
        quality: detect_quality(&result.Title),
        languages: detect_languages(&result.Title),
        year: detect_year(&result.Title),
        name: result.Title,
        link,
        size_bytes: result.Size.unwrap_or(0).max(0) as u64,
        seeders: result.Seeders.unwrap_or(0).max(0) as u32,
        from_pack: false,
        infos: None,
        is_cached: false,
        progress: None,
        disabled: false,
        info_text: None,
    })
}

// Jackett API response types
#[derive(Debug, Deserialize)]
#[allow(non_snake_case)]
struct JackettResponse {
    Results: Vec<JackettResult>,
}

#[derive(Debug, Deserialize)]
#[allow(non_snake_case)]
struct JackettResult {
    Title: String,
    MagnetUri: Option<String>,
    Link: Option<String>,
    Size: Option<i64>,
    Seeders: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct JackettIndexer {
    id: String,
    name: String,
    #[serde(default)]
    caps: Vec<JackettCap>,
}

#[derive(Debug, Deserialize)]
#[allow(non_snake_case)]
struct JackettCap {
    ID: String,
}
