//! Types for indexers and their search results.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::media::MediaRequest;

/// An external torrent search endpoint, as listed by the registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexerDescriptor {
    pub id: String,
    pub title: String,
    pub supports_movie: bool,
    pub supports_series: bool,
}

impl IndexerDescriptor {
    pub fn supports(&self, media_type: crate::media::MediaType) -> bool {
        match media_type {
            crate::media::MediaType::Movie => self.supports_movie,
            crate::media::MediaType::Series => self.supports_series,
        }
    }
}

/// A file within a torrent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileEntry {
    pub name: String,
    pub size_bytes: u64,
}

/// Enrichment result attached to a torrent. Identity is `info_hash`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TorrentInfo {
    /// Lowercase hex info hash.
    pub info_hash: String,
    pub files: Vec<FileEntry>,
    /// Whether the torrent came from a private tracker.
    pub private: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub magnet_url: Option<String>,
    /// Where the raw descriptor bytes can be re-fetched, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub descriptor_url: Option<String>,
}

/// In-flight download state reported by the debrid provider.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct DownloadProgress {
    pub percent: f64,
    pub speed_bps: u64,
}

/// An unenriched search hit. Pipeline stages attach `infos`, cache status,
/// progress and the disabled flag in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Torrent {
    /// Stable identity, derived from the descriptor link.
    pub id: String,
    pub indexer_id: String,
    pub name: String,
    /// `.torrent` descriptor URL or magnet URI.
    pub link: String,
    pub size_bytes: u64,
    pub seeders: u32,
    /// Detected quality token ("2160p", "1080p", ...), empty when unknown.
    pub quality: String,
    pub languages: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<u32>,
    /// True when the hit came from the season-pack sweep.
    #[serde(default)]
    pub from_pack: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub infos: Option<TorrentInfo>,
    #[serde(default)]
    pub is_cached: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<DownloadProgress>,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info_text: Option<String>,
}

impl Torrent {
    /// Info hash of the enrichment result, if enriched.
    pub fn info_hash(&self) -> Option<&str> {
        self.infos.as_ref().map(|i| i.info_hash.as_str())
    }
}

/// Stable torrent identity: the descriptor link, hex-encoded so it survives
/// being a URL path segment. Reversible (see `link_from_torrent_id`).
pub fn torrent_id_from_link(link: &str) -> String {
    let mut out = String::with_capacity(link.len() * 2);
    for b in link.as_bytes() {
        out.push_str(&format!("{:02x}", b));
    }
    out
}

/// Inverse of [`torrent_id_from_link`].
pub fn link_from_torrent_id(id: &str) -> Option<String> {
    if id.len() % 2 != 0 {
        return None;
    }
    let mut bytes = Vec::with_capacity(id.len() / 2);
    for chunk in id.as_bytes().chunks(2) {
        let hex = std::str::from_utf8(chunk).ok()?;
        bytes.push(u8::from_str_radix(hex, 16).ok()?);
    }
    String::from_utf8(bytes).ok()
}

/// Errors that can occur during search operations.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Search backend connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Search backend API error: {0}")]
    ApiError(String),

    #[error("Indexer not found: {0}")]
    IndexerNotFound(String),

    #[error("Request timeout")]
    Timeout,
}

/// Indexer registry and raw search transport.
#[async_trait]
pub trait IndexerRegistry: Send + Sync {
    async fn list_indexers(&self) -> Result<Vec<IndexerDescriptor>, SearchError>;

    async fn search_movie(
        &self,
        request: &MediaRequest,
        indexer_id: &str,
    ) -> Result<Vec<Torrent>, SearchError>;

    /// Search for one specific episode of a series.
    async fn search_episode(
        &self,
        request: &MediaRequest,
        indexer_id: &str,
    ) -> Result<Vec<Torrent>, SearchError>;

    /// Search for whole-season / multi-episode bundles.
    async fn search_season(
        &self,
        request: &MediaRequest,
        indexer_id: &str,
    ) -> Result<Vec<Torrent>, SearchError>;
}
