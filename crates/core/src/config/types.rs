use serde::{Deserialize, Serialize};
use std::net::IpAddr;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub search: Option<SearchConfig>,
    #[serde(default)]
    pub metadata: MetadataConfig,
    #[serde(default)]
    pub debrid: DebridConfig,
    #[serde(default)]
    pub proxy: ProxyConfig,
    #[serde(default)]
    pub health: crate::indexer::HealthConfig,
    #[serde(default)]
    pub preferences: UserPreferences,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Base URL advertised in stream descriptors (e.g. "http://localhost:8080").
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            public_base_url: default_public_base_url(),
        }
    }
}

fn default_host() -> IpAddr {
    "0.0.0.0".parse().unwrap()
}

fn default_port() -> u16 {
    8080
}

fn default_public_base_url() -> String {
    "http://localhost:8080".to_string()
}

/// Search transport configuration (Jackett)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SearchConfig {
    /// Jackett server URL (e.g., "http://localhost:9117")
    pub url: String,
    /// Jackett API key
    pub api_key: String,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_search_timeout")]
    pub timeout_secs: u32,
}

fn default_search_timeout() -> u32 {
    30
}

/// Metadata service configuration (Cinemeta)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MetadataConfig {
    #[serde(default = "default_metadata_url")]
    pub url: String,
    #[serde(default = "default_metadata_timeout")]
    pub timeout_secs: u32,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            url: default_metadata_url(),
            timeout_secs: default_metadata_timeout(),
        }
    }
}

fn default_metadata_url() -> String {
    "https://v3-cinemeta.strem.io".to_string()
}

fn default_metadata_timeout() -> u32 {
    10
}

/// Debrid provider selection.
///
/// Provider protocol implementations plug in behind the `DebridProvider`
/// trait; the backend tag picks one at startup.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DebridConfig {
    #[serde(default)]
    pub backend: DebridBackend,
    /// Substitute the user's tracker passkey into private descriptors; when
    /// on, uncached private results without a credential are gated off.
    #[serde(default = "default_passkey_substitution")]
    pub passkey_substitution: bool,
}

impl Default for DebridConfig {
    fn default() -> Self {
        Self {
            backend: DebridBackend::default(),
            passkey_substitution: default_passkey_substitution(),
        }
    }
}

fn default_passkey_substitution() -> bool {
    true
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DebridBackend {
    #[default]
    None,
    // Future: RealDebrid, AllDebrid, Premiumize
}

/// Reverse-proxy rewriting of resolved download URLs.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ProxyConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Replacement base URL, e.g. "https://proxy.example.com".
    #[serde(default)]
    pub base_url: String,
}

/// How a result set is ordered before presentation.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Seeders,
    Size,
    QualityThenSize,
}

/// Resolved per-request preferences controlling the aggregation pipeline.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UserPreferences {
    /// Metadata language for title resolution.
    #[serde(default = "default_language")]
    pub language: String,
    /// Quality allow-list. Empty allows everything.
    #[serde(default = "default_qualities")]
    pub qualities: Vec<String>,
    /// Keywords that exclude a result when present as a whole token in its name.
    #[serde(default)]
    pub excluded_keywords: Vec<String>,
    /// Maximum entries in the final ranked list.
    #[serde(default = "default_max_results")]
    pub max_results: usize,
    /// Sort order for the cache-resident set.
    #[serde(default = "default_sort_cached")]
    pub sort_cached: SortOrder,
    /// Sort order for the uncached set.
    #[serde(default = "default_sort_uncached")]
    pub sort_uncached: SortOrder,
    /// Languages boosted to the front of each set.
    #[serde(default)]
    pub priority_languages: Vec<String>,
    /// For series: number of season-pack candidates spliced in when the
    /// ranked list would otherwise contain none. 0 disables.
    #[serde(default)]
    pub pack_priority: usize,
    /// Per-indexer search timeout in milliseconds.
    #[serde(default = "default_indexer_timeout_ms")]
    pub indexer_timeout_ms: u64,
    /// Selected indexer ids. Empty selects all capable indexers.
    #[serde(default)]
    pub indexers: Vec<String>,
    /// Private-tracker passkey credential.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub passkey: Option<String>,
    /// Hide uncached results when the provider can report cache status.
    #[serde(default)]
    pub hide_uncached: bool,
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            language: default_language(),
            qualities: default_qualities(),
            excluded_keywords: Vec::new(),
            max_results: default_max_results(),
            sort_cached: default_sort_cached(),
            sort_uncached: default_sort_uncached(),
            priority_languages: Vec::new(),
            pack_priority: 0,
            indexer_timeout_ms: default_indexer_timeout_ms(),
            indexers: Vec::new(),
            passkey: None,
            hide_uncached: false,
        }
    }
}

fn default_language() -> String {
    "en".to_string()
}

fn default_qualities() -> Vec<String> {
    ["2160p", "1080p", "720p", "480p"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_max_results() -> usize {
    15
}

fn default_sort_cached() -> SortOrder {
    SortOrder::QualityThenSize
}

fn default_sort_uncached() -> SortOrder {
    SortOrder::Seeders
}

fn default_indexer_timeout_ms() -> u64 {
    10_000
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<SanitizedSearchConfig>,
    pub metadata: MetadataConfig,
    pub debrid: DebridConfig,
    pub proxy: ProxyConfig,
    pub health: crate::indexer::HealthConfig,
    pub preferences: SanitizedPreferences,
}

/// Sanitized search config (API key hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedSearchConfig {
    pub url: String,
    pub api_key_configured: bool,
    pub timeout_secs: u32,
}

/// Sanitized preferences (passkey hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedPreferences {
    pub language: String,
    pub qualities: Vec<String>,
    pub excluded_keywords: Vec<String>,
    pub max_results: usize,
    pub sort_cached: SortOrder,
    pub sort_uncached: SortOrder,
    pub priority_languages: Vec<String>,
    pub pack_priority: usize,
    pub indexer_timeout_ms: u64,
    pub indexers: Vec<String>,
    pub passkey_configured: bool,
    pub hide_uncached: bool,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        let p = &config.preferences;
        Self {
            server: config.server.clone(),
            search: config.search.as_ref().map(|s| SanitizedSearchConfig {
                url: s.url.clone(),
                api_key_configured: !s.api_key.is_empty(),
                timeout_secs: s.timeout_secs,
            }),
            metadata: config.metadata.clone(),
            debrid: config.debrid.clone(),
            proxy: config.proxy.clone(),
            health: config.health.clone(),
            preferences: SanitizedPreferences {
                language: p.language.clone(),
                qualities: p.qualities.clone(),
                excluded_keywords: p.excluded_keywords.clone(),
                max_results: p.max_results,
                sort_cached: p.sort_cached,
                sort_uncached: p.sort_uncached,
                priority_languages: p.priority_languages.clone(),
                pack_priority: p.pack_priority,
                indexer_timeout_ms: p.indexer_timeout_ms,
                indexers: p.indexers.clone(),
                passkey_configured: p.passkey.is_some(),
                hide_uncached: p.hide_uncached,
            },
        }
    }
}
