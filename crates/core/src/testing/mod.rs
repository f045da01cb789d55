//! Testing utilities and mock implementations for integration tests.
//!
//! This module provides mock implementations of all external collaborator
//! traits, allowing comprehensive pipeline testing without real
//! infrastructure.
//!
//! # Example
//!
//! ```rust,ignore
//! use debridarr_core::testing::{MockDebridProvider, MockIndexerRegistry};
//!
//! let registry = MockIndexerRegistry::new();
//! registry.add_indexer("mock-1", true, true).await;
//! registry.set_movie_results("mock-1", vec![/* torrents */]).await;
//!
//! let provider = MockDebridProvider::new();
//! provider.add_cached("abc123", vec![/* files */]);
//!
//! // Wire into an Aggregator...
//! ```

mod mock_debrid;
mod mock_fetcher;
mod mock_metadata;
mod mock_registry;

pub use mock_debrid::MockDebridProvider;
pub use mock_fetcher::MockTorrentFetcher;
pub use mock_metadata::MockMetadataService;
pub use mock_registry::MockIndexerRegistry;

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::indexer::{torrent_id_from_link, FileEntry, Torrent, TorrentInfo};
    use crate::media::{EpisodeRef, MediaRequest, MediaType};
    use crate::search::{detect_languages, detect_quality, detect_year};

    /// Create a search hit with reasonable defaults. Quality, languages and
    /// year are detected from the name, the way the real transport does it.
    pub fn torrent(name: &str, indexer: &str, seeders: u32) -> Torrent {
        let link = format!(
            "http://{}.example/dl/{}",
            indexer,
            urlencoding::encode(name)
        );
        Torrent {
            id: torrent_id_from_link(&link),
            indexer_id: indexer.to_string(),
            name: name.to_string(),
            link,
            size_bytes: 1024 * 1024 * 1024, // 1 GB
            seeders,
            quality: detect_quality(name),
            languages: detect_languages(name),
            year: detect_year(name),
            from_pack: false,
            infos: None,
            is_cached: false,
            progress: None,
            disabled: false,
            info_text: None,
        }
    }

    /// Create an enrichment result with a single video file.
    pub fn info(info_hash: &str) -> TorrentInfo {
        TorrentInfo {
            info_hash: info_hash.to_string(),
            files: vec![video_file("video.mkv")],
            private: false,
            magnet_url: Some(format!("magnet:?xt=urn:btih:{}", info_hash)),
            descriptor_url: Some(format!("http://indexer.example/dl/{}", info_hash)),
        }
    }

    /// Create a 700 MB video file entry.
    pub fn video_file(name: &str) -> FileEntry {
        FileEntry {
            name: name.to_string(),
            size_bytes: 700 * 1024 * 1024,
        }
    }

    /// A resolved movie request.
    pub fn movie_request() -> MediaRequest {
        MediaRequest {
            media_type: MediaType::Movie,
            external_id: "tt0133093".to_string(),
            title: "The Matrix".to_string(),
            season: None,
            episode: None,
            year: Some(1999),
            language: "en".to_string(),
            episodes: vec![],
        }
    }

    /// A resolved series request for one episode, with a 10-episode season
    /// known to the metadata service.
    pub fn series_request(season: u32, episode: u32) -> MediaRequest {
        MediaRequest {
            media_type: MediaType::Series,
            external_id: "tt0903747".to_string(),
            title: "Breaking Bad".to_string(),
            season: Some(season),
            episode: Some(episode),
            year: Some(2008),
            language: "en".to_string(),
            episodes: (1..=10)
                .map(|e| EpisodeRef {
                    season,
                    episode: e,
                })
                .collect(),
        }
    }
}
