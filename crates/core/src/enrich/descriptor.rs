//! Torrent descriptor parsing.
//!
//! Uses librqbit-core to parse bencoded `.torrent` data and extract the
//! file listing and info hash without downloading any content.

use librqbit_core::torrent_metainfo::{torrent_from_bytes, TorrentMetaV1Owned};

use crate::indexer::{FileEntry, TorrentInfo};

use super::FetchError;

/// Parse raw `.torrent` bytes into a `TorrentInfo`.
///
/// Supports both single-file and multi-file descriptors.
pub fn parse_descriptor(bytes: &[u8]) -> Result<TorrentInfo, FetchError> {
    let torrent: TorrentMetaV1Owned =
        torrent_from_bytes(bytes).map_err(|e| FetchError::Parse(e.to_string()))?;

    let info = &torrent.info;

    let root_name = info
        .name
        .as_ref()
        .map(|b| bytes_to_string(b.as_ref()))
        .unwrap_or_else(|| "unknown".to_string());

    let files = if let Some(ref files) = info.files {
        let mut result = Vec::with_capacity(files.len());
        for file in files {
            let mut path_parts = vec![root_name.clone()];
            for part in &file.path {
                path_parts.push(bytes_to_string(part.as_ref()));
            }
            result.push(FileEntry {
                name: path_parts.join("/"),
                size_bytes: file.length,
            });
        }
        if result.is_empty() {
            return Err(FetchError::Parse("empty torrent (no files)".to_string()));
        }
        result
    } else if let Some(length) = info.length {
        vec![FileEntry {
            name: root_name,
            size_bytes: length,
        }]
    } else {
        return Err(FetchError::Parse("empty torrent (no files)".to_string()));
    };

    let info_hash = torrent.info_hash.as_string();

    Ok(TorrentInfo {
        magnet_url: Some(format!("magnet:?xt=urn:btih:{}", info_hash)),
        info_hash,
        files,
        private: is_private(bytes),
        descriptor_url: None,
    })
}

/// BEP 27 private flag, read straight off the bencoded info dict.
fn is_private(bytes: &[u8]) -> bool {
    bytes
        .windows(b"7:privatei1e".len())
        .any(|w| w == b"7:privatei1e")
}

/// Extract the info hash from a magnet URI.
pub fn magnet_info_hash(link: &str) -> Option<String> {
    let marker = "xt=urn:btih:";
    let start = link.find(marker)? + marker.len();
    let hash: String = link[start..]
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric())
        .collect();
    if hash.len() == 40 || hash.len() == 32 {
        Some(hash.to_lowercase())
    } else {
        None
    }
}

/// Convert bytes to a UTF-8 string, lossily when needed.
fn bytes_to_string(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}
