//! Reconciling enriched torrents against the debrid provider's cache.

use std::sync::Arc;

use tracing::warn;

use crate::config::UserPreferences;
use crate::download::{episode_file, is_valid_passkey};
use crate::indexer::Torrent;
use crate::media::{MediaRequest, MediaType};
use crate::metrics;
use crate::search::{priority_cap, priority_reorder, sort_torrents};

use super::types::{DebridError, DebridProvider};

/// Partition the enriched list into cached/uncached against the provider,
/// attach progress, apply access gating and merge per the user's sort
/// preferences.
///
/// Provider failures degrade gracefully: the plain enriched list (without
/// cache annotations) is returned, except for an expired credential, which
/// disables every entry with a user-visible note.
pub async fn reconcile(
    mut torrents: Vec<Torrent>,
    provider: Option<&Arc<dyn DebridProvider>>,
    preferences: &UserPreferences,
    request: &MediaRequest,
    passkey_substitution: bool,
) -> Vec<Torrent> {
    let Some(provider) = provider else {
        return torrents;
    };

    let season = request.season.unwrap_or(0);
    let episode = request.episode.unwrap_or(0);
    let needs_episode =
        request.media_type == MediaType::Series && request.season.is_some();
    let validity = move |files: &[crate::indexer::FileEntry]| {
        !needs_episode || episode_file(files, season, episode).is_some()
    };

    let cached_hashes = match provider.cached_subset(&torrents, &validity).await {
        Ok(hashes) => hashes,
        Err(DebridError::ExpiredCredential) => {
            warn!(provider = provider.short_name(), "Debrid credential expired");
            for torrent in &mut torrents {
                torrent.disabled = true;
                torrent.info_text =
                    Some(format!("{} credential expired", provider.short_name()));
            }
            return torrents;
        }
        Err(e) => {
            warn!(
                provider = provider.short_name(),
                error = %e,
                "Cache reconciliation failed, returning unannotated results"
            );
            metrics::RECONCILE_FAILURES.inc();
            return torrents;
        }
    };

    for torrent in &mut torrents {
        if let Some(hash) = torrent.info_hash() {
            torrent.is_cached = cached_hashes.contains(&hash.to_lowercase());
        }
    }

    match provider.progress(&torrents).await {
        Ok(progress) => {
            for torrent in &mut torrents {
                if let Some(hash) = torrent.info_hash() {
                    torrent.progress = progress.get(&hash.to_lowercase()).copied();
                }
            }
        }
        Err(e) => warn!(error = %e, "Progress query failed"),
    }

    // Uncached private content is unreachable without a tracker credential.
    let has_credential = preferences
        .passkey
        .as_deref()
        .is_some_and(is_valid_passkey);
    if passkey_substitution && !has_credential {
        for torrent in &mut torrents {
            let private = torrent.infos.as_ref().is_some_and(|i| i.private);
            if !torrent.is_cached && private {
                torrent.disabled = true;
                torrent.info_text =
                    Some("Uncached private torrent requires a passkey".to_string());
            }
        }
    }

    let (mut cached, mut uncached): (Vec<Torrent>, Vec<Torrent>) =
        torrents.into_iter().partition(|t| t.is_cached);

    let cap = priority_cap(preferences.max_results);
    sort_torrents(&mut cached, preferences.sort_cached);
    priority_reorder(&mut cached, &preferences.priority_languages, cap);
    sort_torrents(&mut uncached, preferences.sort_uncached);
    priority_reorder(&mut uncached, &preferences.priority_languages, cap);

    let mut merged = cached;
    if !(preferences.hide_uncached && provider.supports_cache_check()) {
        merged.extend(uncached);
    }
    merged
}
