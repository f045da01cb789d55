//! Mock indexer registry for testing.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::indexer::{IndexerDescriptor, IndexerRegistry, SearchError, Torrent};
use crate::media::MediaRequest;

/// Mock implementation of the `IndexerRegistry` trait.
///
/// Provides controllable behavior for testing:
/// - Configurable indexer listing and per-indexer results
/// - Injected per-indexer failures and delays
/// - Search counting for coalescing assertions
#[derive(Default)]
pub struct MockIndexerRegistry {
    indexers: Arc<RwLock<Vec<IndexerDescriptor>>>,
    movie_results: Arc<RwLock<HashMap<String, Vec<Torrent>>>>,
    episode_results: Arc<RwLock<HashMap<String, Vec<Torrent>>>>,
    season_results: Arc<RwLock<HashMap<String, Vec<Torrent>>>>,
    failing: Arc<RwLock<HashSet<String>>>,
    delays: Arc<RwLock<HashMap<String, Duration>>>,
    searches: Arc<AtomicUsize>,
}

impl MockIndexerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an indexer with the given capabilities.
    pub async fn add_indexer(&self, id: &str, supports_movie: bool, supports_series: bool) {
        self.indexers.write().await.push(IndexerDescriptor {
            id: id.to_string(),
            title: id.to_string(),
            supports_movie,
            supports_series,
        });
    }

    pub async fn set_movie_results(&self, indexer: &str, results: Vec<Torrent>) {
        self.movie_results
            .write()
            .await
            .insert(indexer.to_string(), results);
    }

    pub async fn set_episode_results(&self, indexer: &str, results: Vec<Torrent>) {
        self.episode_results
            .write()
            .await
            .insert(indexer.to_string(), results);
    }

    pub async fn set_season_results(&self, indexer: &str, results: Vec<Torrent>) {
        self.season_results
            .write()
            .await
            .insert(indexer.to_string(), results);
    }

    /// Make every search against this indexer fail.
    pub async fn fail_indexer(&self, indexer: &str) {
        self.failing.write().await.insert(indexer.to_string());
    }

    /// Delay every search against this indexer.
    pub async fn set_delay(&self, indexer: &str, delay: Duration) {
        self.delays.write().await.insert(indexer.to_string(), delay);
    }

    /// Number of individual searches served (failures included).
    pub fn search_count(&self) -> usize {
        self.searches.load(Ordering::SeqCst)
    }

    async fn serve(
        &self,
        table: &RwLock<HashMap<String, Vec<Torrent>>>,
        indexer_id: &str,
    ) -> Result<Vec<Torrent>, SearchError> {
        self.searches.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delays.read().await.get(indexer_id).copied() {
            tokio::time::sleep(delay).await;
        }
        if self.failing.read().await.contains(indexer_id) {
            return Err(SearchError::ApiError(format!(
                "injected failure for {}",
                indexer_id
            )));
        }
        Ok(table
            .read()
            .await
            .get(indexer_id)
            .cloned()
            .unwrap_or_default())
    }
}

#[async_trait]
impl IndexerRegistry for MockIndexerRegistry {
    async fn list_indexers(&self) -> Result<Vec<IndexerDescriptor>, SearchError> {
        Ok(self.indexers.read().await.clone())
    }

    async fn search_movie(
        &self,
        _request: &MediaRequest,
        indexer_id: &str,
    ) -> Result<Vec<Torrent>, SearchError> {
        self.serve(&self.movie_results, indexer_id).await
    }

    async fn search_episode(
        &self,
        _request: &MediaRequest,
        indexer_id: &str,
    ) -> Result<Vec<Torrent>, SearchError> {
        self.serve(&self.episode_results, indexer_id).await
    }

    async fn search_season(
        &self,
        _request: &MediaRequest,
        indexer_id: &str,
    ) -> Result<Vec<Torrent>, SearchError> {
        self.serve(&self.season_results, indexer_id).await
    }
}
