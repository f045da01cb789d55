//! Building outward-facing stream descriptors from ranked torrents.

use serde::{Deserialize, Serialize};

use crate::indexer::Torrent;
use crate::media::MediaType;

/// Placeholder URL for entries that cannot currently be played.
pub const DISABLED_URL: &str = "#";

/// One playable (or explicitly disabled) entry offered to the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamDescriptor {
    /// Short display name, e.g. "RD+ 1080p".
    pub name: String,
    /// Multi-line description: torrent name, size/seeders, languages, notes.
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub disabled: bool,
}

/// Human-readable size.
fn fmt_size(bytes: u64) -> String {
    const GB: f64 = 1_073_741_824.0;
    const MB: f64 = 1_048_576.0;
    let bytes = bytes as f64;
    if bytes >= GB {
        format!("{:.2} GB", bytes / GB)
    } else {
        format!("{:.0} MB", bytes / MB)
    }
}

fn build_name(torrent: &Torrent, provider_name: Option<&str>) -> String {
    let prefix = provider_name.unwrap_or("DL");
    let marker = if torrent.is_cached { "+" } else { "-" };
    if torrent.quality.is_empty() {
        format!("{}{}", prefix, marker)
    } else {
        format!("{}{} {}", prefix, marker, torrent.quality)
    }
}

fn build_title(torrent: &Torrent) -> String {
    let mut lines = vec![torrent.name.clone()];

    let mut meta = format!(
        "{} | {} seeders | {}",
        fmt_size(torrent.size_bytes),
        torrent.seeders,
        torrent.indexer_id
    );
    if let Some(progress) = &torrent.progress {
        meta.push_str(&format!(" | {:.0}% downloading", progress.percent));
    }
    lines.push(meta);

    if !torrent.languages.is_empty() {
        lines.push(torrent.languages.join(", "));
    }
    if let Some(note) = &torrent.info_text {
        lines.push(note.clone());
    }

    lines.join("\n")
}

/// Build the descriptor list for a ranked, reconciled torrent list.
pub fn build_descriptors(
    torrents: &[Torrent],
    provider_name: Option<&str>,
    media_type: MediaType,
    media_id: &str,
    public_base_url: &str,
) -> Vec<StreamDescriptor> {
    let base = public_base_url.trim_end_matches('/');
    torrents
        .iter()
        .map(|torrent| {
            let url = if torrent.disabled {
                DISABLED_URL.to_string()
            } else {
                format!(
                    "{}/download/{}/{}/{}",
                    base,
                    media_type.as_str(),
                    urlencoding::encode(media_id),
                    torrent.id
                )
            };
            StreamDescriptor {
                name: build_name(torrent, provider_name),
                title: build_title(torrent),
                url,
                disabled: torrent.disabled,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures;

    #[test]
    fn test_fmt_size() {
        assert_eq!(fmt_size(4_294_967_296), "4.00 GB");
        assert_eq!(fmt_size(52_428_800), "50 MB");
    }

    #[test]
    fn test_name_carries_provider_and_cache_marker() {
        let mut torrent = fixtures::torrent("Movie.1080p", "x", 10);
        torrent.is_cached = true;
        assert_eq!(build_name(&torrent, Some("RD")), "RD+ 1080p");

        torrent.is_cached = false;
        assert_eq!(build_name(&torrent, Some("RD")), "RD- 1080p");
        assert_eq!(build_name(&torrent, None), "DL- 1080p");
    }

    #[test]
    fn test_title_lines() {
        let mut torrent = fixtures::torrent("Movie.MULTI.1080p", "rarbg", 42);
        torrent.size_bytes = 2_147_483_648;
        torrent.info_text = Some("note".to_string());

        let title = build_title(&torrent);
        let lines: Vec<_> = title.lines().collect();
        assert_eq!(lines[0], "Movie.MULTI.1080p");
        assert!(lines[1].contains("2.00 GB"));
        assert!(lines[1].contains("42 seeders"));
        assert!(lines[1].contains("rarbg"));
        assert_eq!(lines[2], "multi");
        assert_eq!(lines[3], "note");
    }

    #[test]
    fn test_descriptor_urls() {
        let enabled = fixtures::torrent("a", "x", 1);
        let mut disabled = fixtures::torrent("b", "x", 1);
        disabled.disabled = true;

        let descriptors = build_descriptors(
            &[enabled.clone(), disabled],
            Some("RD"),
            MediaType::Series,
            "tt123:2:5",
            "http://localhost:8080/",
        );

        assert_eq!(descriptors.len(), 2);
        assert_eq!(
            descriptors[0].url,
            format!(
                "http://localhost:8080/download/series/tt123%3A2%3A5/{}",
                enabled.id
            )
        );
        assert!(!descriptors[0].disabled);
        assert_eq!(descriptors[1].url, DISABLED_URL);
        assert!(descriptors[1].disabled);
    }
}
