//! Debrid provider abstraction.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::{DebridBackend, DebridConfig};
use crate::indexer::{DownloadProgress, FileEntry, Torrent};

/// Errors from a debrid provider.
#[derive(Debug, Error, Clone)]
pub enum DebridError {
    /// The user's provider credential is no longer valid.
    #[error("Debrid credential expired")]
    ExpiredCredential,

    /// The content exists on the provider but is not yet downloadable.
    #[error("Content not ready on the debrid service")]
    NotReady,

    #[error("Debrid API error: {0}")]
    Api(String),
}

/// Validity check applied to a cache-resident copy's file list. For series
/// the copy must contain the requested episode's file; movies accept any.
pub type CacheValidity<'a> = &'a (dyn Fn(&[FileEntry]) -> bool + Send + Sync);

/// A debrid-caching service, polymorphic over provider capability.
#[async_trait]
pub trait DebridProvider: Send + Sync {
    /// Short display name prefixed to stream descriptors.
    fn short_name(&self) -> &str;

    /// Stable hash of the user identity, used in download cache keys.
    fn user_identity_hash(&self) -> String;

    /// Whether the provider can answer cache-status queries at all.
    fn supports_cache_check(&self) -> bool;

    /// Info hashes of the given torrents that are already cache-resident
    /// with a copy passing the validity check.
    async fn cached_subset(
        &self,
        torrents: &[Torrent],
        validity: CacheValidity<'_>,
    ) -> Result<HashSet<String>, DebridError>;

    /// In-flight download progress keyed by info hash.
    async fn progress(
        &self,
        torrents: &[Torrent],
    ) -> Result<HashMap<String, DownloadProgress>, DebridError>;

    async fn files_from_magnet(&self, magnet: &str) -> Result<Vec<FileEntry>, DebridError>;

    async fn files_from_hash(&self, info_hash: &str) -> Result<Vec<FileEntry>, DebridError>;

    async fn files_from_descriptor(&self, bytes: &[u8]) -> Result<Vec<FileEntry>, DebridError>;

    /// Resolve a direct download URL for one file.
    async fn resolve_download(&self, file: &FileEntry) -> Result<String, DebridError>;
}

/// Select the provider implementation once, from configuration.
pub fn create_provider(config: &DebridConfig) -> Option<Arc<dyn DebridProvider>> {
    match config.backend {
        DebridBackend::None => None,
    }
}
