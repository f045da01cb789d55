//! Bounded-concurrency metadata enrichment.

use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use tracing::debug;

use crate::indexer::Torrent;
use crate::metrics;

use super::fetcher::TorrentFetcher;

/// Hard ceiling on simultaneous in-flight metadata fetches.
const POOL_SIZE: usize = 5;

/// Per-item cap, on top of whatever the user allows per indexer.
const MAX_ITEM_TIMEOUT: Duration = Duration::from_secs(30);

/// Enrich each torrent with its metadata, dropping items whose fetch fails
/// or times out. The ranked order of the input is preserved regardless of
/// fetch completion order.
pub async fn enrich_all(
    torrents: Vec<Torrent>,
    fetcher: &Arc<dyn TorrentFetcher>,
    per_indexer_timeout_ms: u64,
) -> Vec<Torrent> {
    let item_timeout = MAX_ITEM_TIMEOUT.min(Duration::from_millis(per_indexer_timeout_ms));

    let mut enriched: Vec<(usize, Torrent)> = stream::iter(torrents.into_iter().enumerate())
        .map(|(index, mut torrent)| {
            let fetcher = Arc::clone(fetcher);
            async move {
                match tokio::time::timeout(item_timeout, fetcher.fetch_info(&torrent)).await {
                    Ok(Ok(info)) => {
                        torrent.infos = Some(info);
                        Some((index, torrent))
                    }
                    Ok(Err(e)) => {
                        debug!(name = %torrent.name, error = %e, "Enrichment failed, dropping");
                        metrics::ENRICHMENT_FAILURES.inc();
                        None
                    }
                    Err(_) => {
                        debug!(name = %torrent.name, "Enrichment timed out, dropping");
                        metrics::ENRICHMENT_FAILURES.inc();
                        None
                    }
                }
            }
        })
        .buffer_unordered(POOL_SIZE)
        .filter_map(|item| async move { item })
        .collect()
        .await;

    // Final order is the ranked order, not fetch completion order.
    enriched.sort_by_key(|(index, _)| *index);
    enriched.into_iter().map(|(_, torrent)| torrent).collect()
}
