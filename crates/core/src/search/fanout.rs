//! Parallel search fan-out across the selected indexers.

use std::time::Duration;

use futures::future::join_all;
use tracing::debug;

use crate::aggregate::AggregateError;
use crate::config::UserPreferences;
use crate::indexer::{timed_search, IndexerDescriptor, IndexerHealth, IndexerRegistry, Torrent};
use crate::media::{MediaRequest, MediaType};
use crate::metrics;

use super::pack::is_season_pack;

/// Pick the indexers to fan out to.
///
/// Capability-filtered first, narrowed to the healthy subset when one
/// exists, then intersected with the user's selection. Every narrowing step
/// falls back to the wider set when it would come up empty; only a registry
/// with no indexers at all is fatal.
pub async fn select_indexers(
    registry: &dyn IndexerRegistry,
    health: &IndexerHealth,
    preferences: &UserPreferences,
    media_type: MediaType,
) -> Result<Vec<IndexerDescriptor>, AggregateError> {
    let all = registry
        .list_indexers()
        .await
        .map_err(|e| AggregateError::Registry(e.to_string()))?;
    if all.is_empty() {
        return Err(AggregateError::NoIndexers);
    }

    let capable: Vec<IndexerDescriptor> = all
        .iter()
        .filter(|d| d.supports(media_type))
        .cloned()
        .collect();

    let mut healthy = Vec::with_capacity(capable.len());
    for descriptor in &capable {
        if health.is_healthy(&descriptor.id).await {
            healthy.push(descriptor.clone());
        }
    }

    let pool = if healthy.is_empty() { capable.clone() } else { healthy };

    let selected: Vec<IndexerDescriptor> = if preferences.indexers.is_empty() {
        pool
    } else {
        pool.into_iter()
            .filter(|d| preferences.indexers.contains(&d.id))
            .collect()
    };

    if !selected.is_empty() {
        return Ok(selected);
    }
    if !capable.is_empty() {
        return Ok(capable);
    }
    Ok(all)
}

/// Fan out one aggregation's searches and merge the raw results.
///
/// Movies get one guarded search per indexer. Series get two sweeps per
/// indexer, a specific-episode search and a season-pack search; pack
/// candidates that do not classify as a pack for the requested season are
/// dropped before merging. Failures are per-indexer and non-fatal.
pub async fn search_all(
    registry: &dyn IndexerRegistry,
    health: &IndexerHealth,
    preferences: &UserPreferences,
    request: &MediaRequest,
) -> Result<Vec<Torrent>, AggregateError> {
    let selected = select_indexers(registry, health, preferences, request.media_type).await?;
    let timeout = Duration::from_millis(preferences.indexer_timeout_ms);

    debug!(
        indexers = selected.len(),
        media = request.media_type.as_str(),
        request = %request.id(),
        "Starting search fan-out"
    );

    let merged = match request.media_type {
        MediaType::Movie => {
            let sweeps = selected.iter().map(|d| {
                timed_search(health, &d.id, timeout, registry.search_movie(request, &d.id))
            });
            join_all(sweeps).await.into_iter().flatten().collect()
        }
        MediaType::Series => {
            let episode_sweeps = selected.iter().map(|d| {
                timed_search(
                    health,
                    &d.id,
                    timeout,
                    registry.search_episode(request, &d.id),
                )
            });
            let pack_sweeps = selected.iter().map(|d| {
                timed_search(
                    health,
                    &d.id,
                    timeout,
                    registry.search_season(request, &d.id),
                )
            });

            let (episodes, packs) =
                futures::join!(join_all(episode_sweeps), join_all(pack_sweeps));

            let season = request.season.unwrap_or(1);
            let mut merged: Vec<Torrent> = episodes.into_iter().flatten().collect();
            merged.extend(packs.into_iter().flatten().filter_map(|mut t| {
                if is_season_pack(&t.name, season) {
                    t.from_pack = true;
                    Some(t)
                } else {
                    None
                }
            }));
            merged
        }
    };

    metrics::SEARCH_RESULTS.observe(merged.len() as f64);
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indexer::HealthConfig;
    use crate::testing::{fixtures, MockIndexerRegistry};

    fn prefs() -> UserPreferences {
        UserPreferences::default()
    }

    #[tokio::test]
    async fn test_no_indexers_is_fatal() {
        let registry = MockIndexerRegistry::new();
        let health = IndexerHealth::default();

        let result = select_indexers(&registry, &health, &prefs(), MediaType::Movie).await;
        assert!(matches!(result, Err(AggregateError::NoIndexers)));
    }

    #[tokio::test]
    async fn test_selection_filters_by_capability() {
        let registry = MockIndexerRegistry::new();
        registry.add_indexer("movies-only", true, false).await;
        registry.add_indexer("series-only", false, true).await;

        let health = IndexerHealth::default();
        let selected = select_indexers(&registry, &health, &prefs(), MediaType::Movie)
            .await
            .unwrap();
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].id, "movies-only");
    }

    #[tokio::test]
    async fn test_selection_prefers_healthy_subset() {
        let registry = MockIndexerRegistry::new();
        registry.add_indexer("slowpoke", true, true).await;
        registry.add_indexer("snappy", true, true).await;

        let health = IndexerHealth::new(HealthConfig {
            max_slow_events: 3,
            ..HealthConfig::default()
        });
        for _ in 0..3 {
            health
                .record_outcome(
                    "slowpoke",
                    Duration::from_millis(6_000),
                    Duration::from_millis(10_000),
                )
                .await;
        }

        let selected = select_indexers(&registry, &health, &prefs(), MediaType::Movie)
            .await
            .unwrap();
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].id, "snappy");
    }

    #[tokio::test]
    async fn test_selection_falls_back_when_all_unhealthy() {
        let registry = MockIndexerRegistry::new();
        registry.add_indexer("a", true, true).await;
        registry.add_indexer("b", true, true).await;

        let health = IndexerHealth::default();
        for id in ["a", "b"] {
            for _ in 0..3 {
                health
                    .record_outcome(
                        id,
                        Duration::from_millis(6_000),
                        Duration::from_millis(10_000),
                    )
                    .await;
            }
        }

        let selected = select_indexers(&registry, &health, &prefs(), MediaType::Movie)
            .await
            .unwrap();
        assert_eq!(selected.len(), 2);
    }

    #[tokio::test]
    async fn test_selection_intersects_user_choice() {
        let registry = MockIndexerRegistry::new();
        registry.add_indexer("a", true, true).await;
        registry.add_indexer("b", true, true).await;

        let mut preferences = prefs();
        preferences.indexers = vec!["b".to_string()];

        let health = IndexerHealth::default();
        let selected = select_indexers(&registry, &health, &preferences, MediaType::Movie)
            .await
            .unwrap();
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].id, "b");

        // A selection matching nothing falls back to all capable indexers
        preferences.indexers = vec!["nope".to_string()];
        let selected = select_indexers(&registry, &health, &preferences, MediaType::Movie)
            .await
            .unwrap();
        assert_eq!(selected.len(), 2);
    }

    #[tokio::test]
    async fn test_movie_fanout_merges_per_indexer_results() {
        let registry = MockIndexerRegistry::new();
        registry.add_indexer("a", true, false).await;
        registry.add_indexer("b", true, false).await;
        registry
            .set_movie_results("a", vec![fixtures::torrent("From.A.1080p", "a", 10)])
            .await;
        registry
            .set_movie_results("b", vec![fixtures::torrent("From.B.1080p", "b", 20)])
            .await;

        let health = IndexerHealth::default();
        let request = fixtures::movie_request();
        let results = search_all(&registry, &health, &prefs(), &request)
            .await
            .unwrap();
        assert_eq!(results.len(), 2);
    }

    #[tokio::test]
    async fn test_failing_indexer_contributes_nothing() {
        let registry = MockIndexerRegistry::new();
        registry.add_indexer("ok", true, false).await;
        registry.add_indexer("broken", true, false).await;
        registry
            .set_movie_results("ok", vec![fixtures::torrent("Fine.1080p", "ok", 10)])
            .await;
        registry.fail_indexer("broken").await;

        let health = IndexerHealth::default();
        let request = fixtures::movie_request();
        let results = search_all(&registry, &health, &prefs(), &request)
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].indexer_id, "ok");
    }

    #[tokio::test]
    async fn test_series_fanout_filters_pack_candidates() {
        let registry = MockIndexerRegistry::new();
        registry.add_indexer("a", false, true).await;
        registry
            .set_episode_results("a", vec![fixtures::torrent("Show.S02E05.1080p", "a", 30)])
            .await;
        registry
            .set_season_results(
                "a",
                vec![
                    fixtures::torrent("Show.S02.Complete.1080p", "a", 20),
                    fixtures::torrent("Show.S07.Complete.1080p", "a", 25),
                ],
            )
            .await;

        let health = IndexerHealth::default();
        let request = fixtures::series_request(2, 5);
        let results = search_all(&registry, &health, &prefs(), &request)
            .await
            .unwrap();

        assert_eq!(results.len(), 2);
        let pack: Vec<_> = results.iter().filter(|t| t.from_pack).collect();
        assert_eq!(pack.len(), 1);
        assert_eq!(pack[0].name, "Show.S02.Complete.1080p");
    }
}
