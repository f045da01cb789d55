//! The aggregation pipeline and download resolution.

use std::sync::Arc;
use std::time::Instant;

use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::cache::{CachedDownload, KvCache, DOWNLOAD_TTL};
use crate::config::{DebridConfig, ProxyConfig, UserPreferences};
use crate::debrid::{reconcile, DebridError, DebridProvider};
use crate::download::{is_valid_passkey, select_file, substitute_passkey, DownloadError};
use crate::enrich::{dedup_by_info_hash, enrich_all, TorrentFetcher};
use crate::indexer::{FileEntry, IndexerHealth, IndexerRegistry, Torrent, TorrentInfo};
use crate::media::{MediaType, MetadataService};
use crate::metrics;
use crate::proxy;
use crate::search::{filter_and_rank, search_all};
use crate::stream::{build_descriptors, StreamDescriptor};

use super::coalesce::Coalescer;
use super::AggregateError;

/// Coordinates one aggregation: fan-out, rank, enrich, dedup, reconcile.
/// Also owns the narrower download-resolution path.
///
/// Created once at process start; the health tracker and the coalescers are
/// process-scoped state living inside it.
pub struct Aggregator {
    registry: Arc<dyn IndexerRegistry>,
    metadata: Arc<dyn MetadataService>,
    fetcher: Arc<dyn TorrentFetcher>,
    provider: Option<Arc<dyn DebridProvider>>,
    cache: Arc<dyn KvCache>,
    health: Arc<IndexerHealth>,
    proxy: ProxyConfig,
    passkey_substitution: bool,
    aggregations: Coalescer<Result<Vec<Torrent>, AggregateError>>,
    downloads: Coalescer<Result<String, DownloadError>>,
}

impl Aggregator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        registry: Arc<dyn IndexerRegistry>,
        metadata: Arc<dyn MetadataService>,
        fetcher: Arc<dyn TorrentFetcher>,
        provider: Option<Arc<dyn DebridProvider>>,
        cache: Arc<dyn KvCache>,
        health: Arc<IndexerHealth>,
        proxy: ProxyConfig,
        debrid: DebridConfig,
    ) -> Self {
        Self {
            registry,
            metadata,
            fetcher,
            provider,
            cache,
            health,
            proxy,
            passkey_substitution: debrid.passkey_substitution,
            aggregations: Coalescer::new(),
            downloads: Coalescer::new(),
        }
    }

    /// Run the full aggregation for a media request, coalesced per request
    /// identity: concurrent callers for the same id share one execution.
    pub async fn aggregate(
        &self,
        preferences: &UserPreferences,
        media_type: MediaType,
        media_id: &str,
    ) -> Result<Vec<Torrent>, AggregateError> {
        let request = self
            .metadata
            .resolve(media_type, media_id, &preferences.language)
            .await
            .map_err(|e| AggregateError::Metadata(e.to_string()))?;

        let key = request.id();
        let started = Instant::now();

        let result = self
            .aggregations
            .run(&key, || async move {
                let raw =
                    search_all(self.registry.as_ref(), &self.health, preferences, &request)
                        .await?;
                debug!(request = %request.id(), raw = raw.len(), "Fan-out complete");

                let ranked = filter_and_rank(raw, preferences, &request);
                let enriched =
                    enrich_all(ranked, &self.fetcher, preferences.indexer_timeout_ms).await;

                let mut deduped = dedup_by_info_hash(enriched);
                deduped.truncate(preferences.max_results);
                if deduped.is_empty() {
                    return Err(AggregateError::NoResults);
                }

                Ok(reconcile(
                    deduped,
                    self.provider.as_ref(),
                    preferences,
                    &request,
                    self.passkey_substitution,
                )
                .await)
            })
            .await;

        let status = match &result {
            Ok(torrents) => {
                info!(
                    request = %key,
                    results = torrents.len(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Aggregation complete"
                );
                "success"
            }
            Err(AggregateError::NoResults) => "no_results",
            Err(_) => "error",
        };
        metrics::AGGREGATION_DURATION
            .with_label_values(&[status])
            .observe(started.elapsed().as_secs_f64());

        result
    }

    /// Aggregate and shape the result into stream descriptors.
    pub async fn list_streams(
        &self,
        preferences: &UserPreferences,
        media_type: MediaType,
        media_id: &str,
        public_base_url: &str,
    ) -> Result<Vec<StreamDescriptor>, AggregateError> {
        let torrents = self.aggregate(preferences, media_type, media_id).await?;
        let provider_name = self.provider.as_ref().map(|p| p.short_name().to_string());
        Ok(build_descriptors(
            &torrents,
            provider_name.as_deref(),
            media_type,
            media_id,
            public_base_url,
        ))
    }

    /// Resolve a direct download URL for one selected torrent. Idempotent
    /// within the cache TTL and coalesced per composite key.
    pub async fn resolve_download(
        &self,
        preferences: &UserPreferences,
        media_type: MediaType,
        media_id: &str,
        torrent_id: &str,
    ) -> Result<String, DownloadError> {
        let provider = self
            .provider
            .as_ref()
            .ok_or(DownloadError::ProviderUnavailable)?;

        let key = download_key(
            &provider.user_identity_hash(),
            self.proxy.enabled,
            media_type,
            media_id,
            torrent_id,
        );

        let cache_key = key.clone();
        let result = self
            .downloads
            .run(&key, || async move {
                if let Some(cached) = self.cache.get(&cache_key).await {
                    if let Ok(download) = serde_json::from_str::<CachedDownload>(&cached) {
                        debug!(key = %cache_key, "Download URL served from cache");
                        return Ok(download.url);
                    }
                }

                let request = self
                    .metadata
                    .resolve(media_type, media_id, &preferences.language)
                    .await
                    .map_err(|e| DownloadError::Aggregate(e.to_string()))?;

                // Prefer the torrent as the aggregation ranked it; fall back
                // to fetching the descriptor by id when it fell out of the
                // list (or the aggregation failed) in the meantime.
                let listed = match self.aggregate(preferences, media_type, media_id).await {
                    Ok(torrents) => torrents.into_iter().find(|t| t.id == torrent_id),
                    Err(_) => None,
                };

                if let Some(torrent) = &listed {
                    if torrent.disabled {
                        return Err(DownloadError::InvalidCredential(
                            torrent
                                .info_text
                                .clone()
                                .unwrap_or_else(|| "entry is disabled".to_string()),
                        ));
                    }
                }

                let infos = match listed {
                    Some(torrent) => torrent.infos.ok_or(DownloadError::NoDownload)?,
                    None => self
                        .fetcher
                        .fetch_by_id(torrent_id)
                        .await
                        .map_err(|e| DownloadError::Fetch(e.to_string()))?,
                };

                let files = self.provider_files(provider, &infos, preferences).await?;
                let file = select_file(&files, &request).ok_or(DownloadError::NoDownload)?;

                let url = provider
                    .resolve_download(file)
                    .await
                    .map_err(map_debrid_error)?;
                let url = proxy::apply_if_enabled(url, &self.proxy);

                if let Ok(json) = serde_json::to_string(&CachedDownload { url: url.clone() }) {
                    self.cache.set(&cache_key, json, DOWNLOAD_TTL).await;
                }

                Ok(url)
            })
            .await;

        metrics::DOWNLOADS_RESOLVED
            .with_label_values(&[if result.is_ok() { "success" } else { "error" }])
            .inc();
        result
    }

    /// Obtain the provider-side file listing for a torrent, routing by
    /// privacy and credential state.
    async fn provider_files(
        &self,
        provider: &Arc<dyn DebridProvider>,
        infos: &TorrentInfo,
        preferences: &UserPreferences,
    ) -> Result<Vec<FileEntry>, DownloadError> {
        if self.passkey_substitution && infos.private {
            return match preferences.passkey.as_deref() {
                // No credential: the raw descriptor would leak the
                // placeholder, so go through hash-based retrieval.
                None => provider
                    .files_from_hash(&infos.info_hash)
                    .await
                    .map_err(map_debrid_error),
                Some(passkey) if !is_valid_passkey(passkey) => Err(
                    DownloadError::InvalidCredential(
                        "passkey does not match the required pattern".to_string(),
                    ),
                ),
                Some(passkey) => {
                    let bytes = self
                        .fetcher
                        .fetch_descriptor(infos)
                        .await
                        .map_err(|e| DownloadError::Fetch(e.to_string()))?;
                    let rewritten = substitute_passkey(&bytes, passkey)
                        .map_err(|e| DownloadError::InvalidCredential(e.to_string()))?;
                    provider
                        .files_from_descriptor(&rewritten)
                        .await
                        .map_err(map_debrid_error)
                }
            };
        }

        if let Some(magnet) = &infos.magnet_url {
            return provider
                .files_from_magnet(magnet)
                .await
                .map_err(map_debrid_error);
        }
        if infos.descriptor_url.is_some() {
            let bytes = self
                .fetcher
                .fetch_descriptor(infos)
                .await
                .map_err(|e| DownloadError::Fetch(e.to_string()))?;
            return provider
                .files_from_descriptor(&bytes)
                .await
                .map_err(map_debrid_error);
        }
        provider
            .files_from_hash(&infos.info_hash)
            .await
            .map_err(map_debrid_error)
    }
}

fn map_debrid_error(e: DebridError) -> DownloadError {
    match e {
        DebridError::ExpiredCredential => {
            DownloadError::InvalidCredential("debrid credential expired".to_string())
        }
        other => DownloadError::Debrid(other.to_string()),
    }
}

/// Composite identity of one download resolution.
fn download_key(
    user_identity: &str,
    proxied: bool,
    media_type: MediaType,
    media_id: &str,
    torrent_id: &str,
) -> String {
    let composite = format!(
        "{}|{}|{}:{}|{}",
        user_identity,
        proxied,
        media_type.as_str(),
        media_id,
        torrent_id
    );
    format!("download:{:x}", Sha256::digest(composite.as_bytes()))
}
