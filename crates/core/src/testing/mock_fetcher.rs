//! Mock torrent metadata fetcher for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use crate::enrich::{FetchError, TorrentFetcher};
use crate::indexer::{link_from_torrent_id, Torrent, TorrentInfo};

/// Mock implementation of the `TorrentFetcher` trait.
///
/// Metadata is keyed by descriptor link; a fetch for an unknown link fails,
/// which makes enrichment-drop scenarios easy to stage.
#[derive(Default)]
pub struct MockTorrentFetcher {
    infos: Mutex<HashMap<String, TorrentInfo>>,
    descriptors: Mutex<HashMap<String, Vec<u8>>>,
    delays: Mutex<HashMap<String, Duration>>,
}

impl MockTorrentFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the metadata behind a descriptor link.
    pub fn set_info(&self, link: &str, info: TorrentInfo) {
        self.infos
            .lock()
            .unwrap()
            .insert(link.to_string(), info);
    }

    /// Register raw descriptor bytes, keyed by info hash.
    pub fn set_descriptor(&self, info_hash: &str, bytes: Vec<u8>) {
        self.descriptors
            .lock()
            .unwrap()
            .insert(info_hash.to_string(), bytes);
    }

    /// Delay fetches for a link.
    pub fn set_delay(&self, link: &str, delay: Duration) {
        self.delays
            .lock()
            .unwrap()
            .insert(link.to_string(), delay);
    }

    async fn fetch_link(&self, link: &str) -> Result<TorrentInfo, FetchError> {
        let delay = self.delays.lock().unwrap().get(link).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.infos
            .lock()
            .unwrap()
            .get(link)
            .cloned()
            .ok_or_else(|| FetchError::Http(format!("no descriptor behind {}", link)))
    }
}

#[async_trait]
impl TorrentFetcher for MockTorrentFetcher {
    async fn fetch_info(&self, torrent: &Torrent) -> Result<TorrentInfo, FetchError> {
        self.fetch_link(&torrent.link).await
    }

    async fn fetch_descriptor(&self, infos: &TorrentInfo) -> Result<Vec<u8>, FetchError> {
        self.descriptors
            .lock()
            .unwrap()
            .get(&infos.info_hash)
            .cloned()
            .ok_or(FetchError::NoDescriptor)
    }

    async fn fetch_by_id(&self, torrent_id: &str) -> Result<TorrentInfo, FetchError> {
        let link = link_from_torrent_id(torrent_id)
            .ok_or_else(|| FetchError::InvalidId(torrent_id.to_string()))?;
        self.fetch_link(&link).await
    }
}
