pub mod aggregate;
pub mod cache;
pub mod config;
pub mod debrid;
pub mod download;
pub mod enrich;
pub mod indexer;
pub mod media;
pub mod metrics;
pub mod proxy;
pub mod search;
pub mod stream;
pub mod testing;

pub use aggregate::{AggregateError, Aggregator, Coalescer};
pub use cache::{CachedDownload, KvCache, MemoryCache, DOWNLOAD_TTL};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, DebridBackend,
    SanitizedConfig, SortOrder, UserPreferences,
};
pub use debrid::{create_provider, DebridError, DebridProvider};
pub use download::DownloadError;
pub use enrich::{HttpTorrentFetcher, TorrentFetcher};
pub use indexer::{
    HealthConfig, IndexerDescriptor, IndexerHealth, IndexerRegistry, JackettRegistry, Torrent,
    TorrentInfo,
};
pub use media::{CinemetaClient, MediaRequest, MediaType, MetadataService};
pub use stream::StreamDescriptor;
