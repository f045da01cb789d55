//! Timeout guard around a single indexer search.

use std::future::Future;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::metrics;

use super::health::IndexerHealth;
use super::types::{SearchError, Torrent};

/// Race one indexer search against a timeout.
///
/// A timed-out or failed search degrades to an empty contribution so a
/// single bad indexer never aborts the aggregation. The outcome duration is
/// fed to the health tracker either way.
pub async fn timed_search<F>(
    health: &IndexerHealth,
    indexer_id: &str,
    timeout: Duration,
    task: F,
) -> Vec<Torrent>
where
    F: Future<Output = Result<Vec<Torrent>, SearchError>>,
{
    let start = Instant::now();
    let outcome = tokio::time::timeout(timeout, task).await;
    let elapsed = start.elapsed();

    let (results, status) = match outcome {
        Ok(Ok(results)) => {
            debug!(
                indexer = indexer_id,
                results = results.len(),
                elapsed_ms = elapsed.as_millis() as u64,
                "Indexer search complete"
            );
            (results, "success")
        }
        Ok(Err(e)) => {
            warn!(indexer = indexer_id, error = %e, "Indexer search failed");
            (Vec::new(), "error")
        }
        Err(_) => {
            warn!(
                indexer = indexer_id,
                timeout_ms = timeout.as_millis() as u64,
                "Indexer search timed out"
            );
            // The underlying transport keeps running if it has no
            // cancellation primitive; we only stop waiting.
            (Vec::new(), "timeout")
        }
    };

    metrics::SEARCH_DURATION
        .with_label_values(&[status])
        .observe(elapsed.as_secs_f64());
    health.record_outcome(indexer_id, elapsed, timeout).await;

    results
}
