use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Search transport URL and API key are non-empty when configured
/// - Preferences: max_results is not 0, passkey matches the credential pattern
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    // Server validation
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if let Some(search) = &config.search {
        if search.url.is_empty() {
            return Err(ConfigError::ValidationError(
                "search.url cannot be empty".to_string(),
            ));
        }
        if search.api_key.is_empty() {
            return Err(ConfigError::ValidationError(
                "search.api_key cannot be empty".to_string(),
            ));
        }
    }

    if config.preferences.max_results == 0 {
        return Err(ConfigError::ValidationError(
            "preferences.max_results cannot be 0".to_string(),
        ));
    }

    if let Some(passkey) = &config.preferences.passkey {
        if !crate::download::is_valid_passkey(passkey) {
            return Err(ConfigError::ValidationError(
                "preferences.passkey does not match the credential pattern".to_string(),
            ));
        }
    }

    Ok(())
}
