//! Reverse-proxy rewriting of resolved download URLs.

use crate::config::ProxyConfig;
use tracing::debug;

/// Rewrite a resolved download URL to go through the configured proxy.
/// A no-op when the proxy is disabled or the URL has no host part.
pub fn apply_if_enabled(url: String, config: &ProxyConfig) -> String {
    if !config.enabled || config.base_url.is_empty() {
        return url;
    }

    let Some(path_start) = url.find("://").map(|i| i + 3) else {
        return url;
    };
    let Some(path) = url[path_start..].find('/').map(|i| &url[path_start + i..]) else {
        return url;
    };

    let rewritten = format!("{}{}", config.base_url.trim_end_matches('/'), path);
    debug!(from = %url, to = %rewritten, "Proxied download URL");
    rewritten
}

#[cfg(test)]
mod tests {
    use super::*;

    fn proxy(enabled: bool) -> ProxyConfig {
        ProxyConfig {
            enabled,
            base_url: "https://proxy.example.com".to_string(),
        }
    }

    #[test]
    fn test_disabled_is_noop() {
        let url = "https://cdn.provider.example/dl/abc".to_string();
        assert_eq!(apply_if_enabled(url.clone(), &proxy(false)), url);
    }

    #[test]
    fn test_rewrites_host() {
        let url = "https://cdn.provider.example/dl/abc?tok=1".to_string();
        assert_eq!(
            apply_if_enabled(url, &proxy(true)),
            "https://proxy.example.com/dl/abc?tok=1"
        );
    }

    #[test]
    fn test_url_without_path_is_untouched() {
        let url = "https://cdn.provider.example".to_string();
        assert_eq!(apply_if_enabled(url.clone(), &proxy(true)), url);
    }
}
