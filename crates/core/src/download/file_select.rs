//! Picking the right file out of a torrent's file list.

use crate::indexer::FileEntry;
use crate::media::{MediaRequest, MediaType};
use crate::search::tokenize;

/// Find the file carrying a specific episode, without any fallback.
///
/// Candidates are tried in size-descending order against progressively
/// looser name patterns: `sNNeNNN`, then `sNNeNN`, then the compact
/// season+episode token, then a bare zero-padded episode token.
pub fn episode_file(files: &[FileEntry], season: u32, episode: u32) -> Option<&FileEntry> {
    let mut by_size: Vec<&FileEntry> = files.iter().collect();
    by_size.sort_by(|a, b| b.size_bytes.cmp(&a.size_bytes));

    let padded3 = format!("s{:02}e{:03}", season, episode);
    let padded2 = format!("s{:02}e{:02}", season, episode);
    let compact = format!("{}{:02}", season, episode);
    let bare = format!("{:02}", episode);

    let matchers: [&dyn Fn(&FileEntry) -> bool; 4] = [
        &|f| f.name.to_lowercase().contains(&padded3),
        &|f| f.name.to_lowercase().contains(&padded2),
        &|f| tokenize(&f.name).iter().any(|t| t == &compact),
        &|f| tokenize(&f.name).iter().any(|t| t == &bare),
    ];

    for matches in matchers {
        if let Some(file) = by_size.iter().find(|f| matches(f)).copied() {
            return Some(file);
        }
    }
    None
}

/// Largest file of the list.
pub fn largest_file(files: &[FileEntry]) -> Option<&FileEntry> {
    files.iter().max_by_key(|f| f.size_bytes)
}

/// Select the file to download for a request: the episode match for series
/// (falling back to the largest file), the largest file for movies.
pub fn select_file<'a>(files: &'a [FileEntry], request: &MediaRequest) -> Option<&'a FileEntry> {
    match (request.media_type, request.season, request.episode) {
        (MediaType::Series, Some(season), Some(episode)) => {
            episode_file(files, season, episode).or_else(|| largest_file(files))
        }
        _ => largest_file(files),
    }
}
