//! Deduplication of enriched torrents by info hash.

use std::collections::HashSet;

use crate::indexer::Torrent;

/// Collapse hits resolving to the same content identity, keeping the first
/// (highest-ranked) occurrence of each info hash. Unenriched items are
/// dropped; every surviving entry has a non-empty `infos.info_hash`.
pub fn dedup_by_info_hash(torrents: Vec<Torrent>) -> Vec<Torrent> {
    let mut seen: HashSet<String> = HashSet::new();
    torrents
        .into_iter()
        .filter(|t| match t.info_hash() {
            Some(hash) if !hash.is_empty() => seen.insert(hash.to_lowercase()),
            _ => false,
        })
        .collect()
}
