//! Fetching torrent metadata from descriptor links.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::indexer::{link_from_torrent_id, Torrent, TorrentInfo};

use super::descriptor::{magnet_info_hash, parse_descriptor};

/// Errors that can occur while fetching torrent metadata.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid torrent id: {0}")]
    InvalidId(String),

    #[error("No descriptor link available")]
    NoDescriptor,

    #[error("Timeout fetching torrent")]
    Timeout,
}

/// Fetches detailed metadata (file list, hash) for search hits.
#[async_trait]
pub trait TorrentFetcher: Send + Sync {
    /// Fetch and parse the metadata behind a search hit.
    async fn fetch_info(&self, torrent: &Torrent) -> Result<TorrentInfo, FetchError>;

    /// Re-fetch the raw descriptor bytes of an enriched torrent.
    async fn fetch_descriptor(&self, infos: &TorrentInfo) -> Result<Vec<u8>, FetchError>;

    /// Fetch metadata by stable torrent id.
    async fn fetch_by_id(&self, torrent_id: &str) -> Result<TorrentInfo, FetchError>;
}

/// HTTP implementation: downloads `.torrent` descriptors from indexer links.
pub struct HttpTorrentFetcher {
    client: Client,
}

impl HttpTorrentFetcher {
    pub fn new(timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to create HTTP client");
        Self { client }
    }

    async fn fetch_from_link(&self, link: &str) -> Result<TorrentInfo, FetchError> {
        if link.starts_with("magnet:") {
            // No descriptor to download; the hash is all a magnet carries.
            let info_hash = magnet_info_hash(link)
                .ok_or_else(|| FetchError::Parse("magnet without btih hash".to_string()))?;
            return Ok(TorrentInfo {
                info_hash,
                files: Vec::new(),
                private: false,
                magnet_url: Some(link.to_string()),
                descriptor_url: None,
            });
        }

        let bytes = self.fetch_bytes(link).await?;
        let mut info = parse_descriptor(&bytes)?;
        info.descriptor_url = Some(link.to_string());
        Ok(info)
    }

    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        debug!(url = %url, "Fetching .torrent descriptor");

        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout
            } else {
                FetchError::Http(e.to_string())
            }
        })?;

        if !response.status().is_success() {
            return Err(FetchError::Http(format!("HTTP {}", response.status())));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| FetchError::Http(e.to_string()))?;

        Ok(bytes.to_vec())
    }
}

impl Default for HttpTorrentFetcher {
    fn default() -> Self {
        Self::new(Duration::from_secs(30))
    }
}

#[async_trait]
impl TorrentFetcher for HttpTorrentFetcher {
    async fn fetch_info(&self, torrent: &Torrent) -> Result<TorrentInfo, FetchError> {
        self.fetch_from_link(&torrent.link).await
    }

    async fn fetch_descriptor(&self, infos: &TorrentInfo) -> Result<Vec<u8>, FetchError> {
        let url = infos.descriptor_url.as_ref().ok_or(FetchError::NoDescriptor)?;
        self.fetch_bytes(url).await
    }

    async fn fetch_by_id(&self, torrent_id: &str) -> Result<TorrentInfo, FetchError> {
        let link = link_from_torrent_id(torrent_id)
            .ok_or_else(|| FetchError::InvalidId(torrent_id.to_string()))?;
        self.fetch_from_link(&link).await
    }
}
