//! Per-indexer search health tracking.
//!
//! Keeps a rolling window of slow-search samples per indexer. A single slow
//! streak only penalizes an indexer while its samples stay inside the window;
//! one fast response wipes the indexer's history.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

/// Tuning for the health tracker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthConfig {
    /// A search slower than this is a slow event (ms).
    #[serde(default = "default_slow_threshold_ms")]
    pub slow_threshold_ms: u64,
    /// Samples older than this are purged (seconds).
    #[serde(default = "default_window_secs")]
    pub window_secs: i64,
    /// Slow events at or above this mark an indexer unhealthy. `<= 0`
    /// disables tracking entirely.
    #[serde(default = "default_max_slow_events")]
    pub max_slow_events: i64,
}

fn default_slow_threshold_ms() -> u64 {
    5_000
}

fn default_window_secs() -> i64 {
    900
}

fn default_max_slow_events() -> i64 {
    3
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            slow_threshold_ms: default_slow_threshold_ms(),
            window_secs: default_window_secs(),
            max_slow_events: default_max_slow_events(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Sample {
    duration_ms: u64,
    at: DateTime<Utc>,
}

/// Derived stats over an indexer's surviving samples.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct HealthStats {
    pub min_ms: u64,
    pub avg_ms: u64,
    pub max_ms: u64,
    pub count: usize,
}

/// Process-scoped health state, created once at startup and shared by
/// reference into the pipeline. Entries are pruned by time window on every
/// read and never persisted.
pub struct IndexerHealth {
    config: HealthConfig,
    samples: RwLock<HashMap<String, Vec<Sample>>>,
}

impl IndexerHealth {
    pub fn new(config: HealthConfig) -> Self {
        Self {
            config,
            samples: RwLock::new(HashMap::new()),
        }
    }

    /// Record the outcome of one guarded search.
    ///
    /// A sample is appended only when the duration exceeded the slow
    /// threshold AND the call's allotted timeout was generous enough to
    /// tell slow from merely capped. A fast outcome clears the history.
    pub async fn record_outcome(&self, indexer_id: &str, duration: Duration, allotted: Duration) {
        let duration_ms = duration.as_millis() as u64;
        let allotted_ms = allotted.as_millis() as u64;
        let threshold = self.config.slow_threshold_ms;

        if duration_ms <= threshold {
            let mut samples = self.samples.write().await;
            samples.remove(indexer_id);
            return;
        }

        if allotted_ms <= threshold {
            // Timeout too tight to judge slowness; no signal either way.
            return;
        }

        let mut samples = self.samples.write().await;
        samples
            .entry(indexer_id.to_string())
            .or_default()
            .push(Sample {
                duration_ms,
                at: Utc::now(),
            });
    }

    /// Stats over the samples still inside the window. Purges stale entries.
    pub async fn stats(&self, indexer_id: &str) -> HealthStats {
        let cutoff = Utc::now() - chrono::Duration::seconds(self.config.window_secs);
        let mut samples = self.samples.write().await;

        let Some(entry) = samples.get_mut(indexer_id) else {
            return HealthStats::default();
        };
        entry.retain(|s| s.at >= cutoff);
        if entry.is_empty() {
            samples.remove(indexer_id);
            return HealthStats::default();
        }

        let durations: Vec<u64> = entry.iter().map(|s| s.duration_ms).collect();
        let count = durations.len();
        HealthStats {
            min_ms: *durations.iter().min().unwrap(),
            avg_ms: durations.iter().sum::<u64>() / count as u64,
            max_ms: *durations.iter().max().unwrap(),
            count,
        }
    }

    /// Whether the indexer should be part of the preferred search set.
    pub async fn is_healthy(&self, indexer_id: &str) -> bool {
        if self.config.max_slow_events <= 0 {
            return true;
        }
        let stats = self.stats(indexer_id).await;
        (stats.count as i64) < self.config.max_slow_events
    }
}

impl Default for IndexerHealth {
    fn default() -> Self {
        Self::new(HealthConfig::default())
    }
}
