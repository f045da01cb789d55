//! Mock debrid provider for testing.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use crate::debrid::{CacheValidity, DebridError, DebridProvider};
use crate::indexer::{DownloadProgress, FileEntry, Torrent};

/// Mock implementation of the `DebridProvider` trait.
///
/// Cache residency is keyed by info hash with an attached file list, so
/// validity predicates (series episode checks) exercise real logic.
pub struct MockDebridProvider {
    cached: Mutex<HashMap<String, Vec<FileEntry>>>,
    progress: Mutex<HashMap<String, DownloadProgress>>,
    cached_subset_error: Mutex<Option<DebridError>>,
    resolve_error: Mutex<Option<DebridError>>,
    descriptor_files: Mutex<Vec<FileEntry>>,
    last_descriptor: Mutex<Option<Vec<u8>>>,
    supports_cache_check: bool,
}

impl Default for MockDebridProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockDebridProvider {
    pub fn new() -> Self {
        Self {
            cached: Mutex::new(HashMap::new()),
            progress: Mutex::new(HashMap::new()),
            cached_subset_error: Mutex::new(None),
            resolve_error: Mutex::new(None),
            descriptor_files: Mutex::new(Vec::new()),
            last_descriptor: Mutex::new(None),
            supports_cache_check: true,
        }
    }

    /// A provider that cannot answer cache-status queries.
    pub fn without_cache_check() -> Self {
        Self {
            supports_cache_check: false,
            ..Self::new()
        }
    }

    /// Mark a hash cache-resident with the given file list.
    pub fn add_cached(&self, info_hash: &str, files: Vec<FileEntry>) {
        self.cached
            .lock()
            .unwrap()
            .insert(info_hash.to_lowercase(), files);
    }

    pub fn set_progress(&self, info_hash: &str, progress: DownloadProgress) {
        self.progress
            .lock()
            .unwrap()
            .insert(info_hash.to_lowercase(), progress);
    }

    /// Fail the next (and every) cache-status query.
    pub fn fail_cached_subset(&self, error: DebridError) {
        *self.cached_subset_error.lock().unwrap() = Some(error);
    }

    /// Fail download resolution.
    pub fn fail_resolve(&self, error: DebridError) {
        *self.resolve_error.lock().unwrap() = Some(error);
    }

    /// Files reported for descriptor-based retrieval.
    pub fn set_descriptor_files(&self, files: Vec<FileEntry>) {
        *self.descriptor_files.lock().unwrap() = files;
    }

    /// The raw bytes of the last descriptor handed to the provider.
    pub fn last_descriptor(&self) -> Option<Vec<u8>> {
        self.last_descriptor.lock().unwrap().clone()
    }
}

#[async_trait]
impl DebridProvider for MockDebridProvider {
    fn short_name(&self) -> &str {
        "MD"
    }

    fn user_identity_hash(&self) -> String {
        "mock-user".to_string()
    }

    fn supports_cache_check(&self) -> bool {
        self.supports_cache_check
    }

    async fn cached_subset(
        &self,
        torrents: &[Torrent],
        validity: CacheValidity<'_>,
    ) -> Result<HashSet<String>, DebridError> {
        if let Some(error) = self.cached_subset_error.lock().unwrap().clone() {
            return Err(error);
        }

        let cached = self.cached.lock().unwrap();
        let mut hit = HashSet::new();
        for torrent in torrents {
            let Some(hash) = torrent.info_hash() else {
                continue;
            };
            let hash = hash.to_lowercase();
            if let Some(files) = cached.get(&hash) {
                if validity(files) {
                    hit.insert(hash);
                }
            }
        }
        Ok(hit)
    }

    async fn progress(
        &self,
        _torrents: &[Torrent],
    ) -> Result<HashMap<String, DownloadProgress>, DebridError> {
        Ok(self.progress.lock().unwrap().clone())
    }

    async fn files_from_magnet(&self, magnet: &str) -> Result<Vec<FileEntry>, DebridError> {
        // Lenient extraction so tests can use short fake hashes.
        let hash = magnet
            .split("btih:")
            .nth(1)
            .map(|rest| rest.split('&').next().unwrap_or(rest))
            .ok_or_else(|| DebridError::Api("bad magnet".to_string()))?;
        self.files_from_hash(hash).await
    }

    async fn files_from_hash(&self, info_hash: &str) -> Result<Vec<FileEntry>, DebridError> {
        self.cached
            .lock()
            .unwrap()
            .get(&info_hash.to_lowercase())
            .cloned()
            .ok_or(DebridError::NotReady)
    }

    async fn files_from_descriptor(&self, bytes: &[u8]) -> Result<Vec<FileEntry>, DebridError> {
        *self.last_descriptor.lock().unwrap() = Some(bytes.to_vec());
        Ok(self.descriptor_files.lock().unwrap().clone())
    }

    async fn resolve_download(&self, file: &FileEntry) -> Result<String, DebridError> {
        if let Some(error) = self.resolve_error.lock().unwrap().clone() {
            return Err(error);
        }
        Ok(format!(
            "http://provider.example/dl/{}",
            urlencoding::encode(&file.name)
        ))
    }
}
