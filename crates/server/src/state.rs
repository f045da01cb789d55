use std::sync::Arc;

use debridarr_core::{Aggregator, Config, SanitizedConfig, UserPreferences};

/// Shared application state
pub struct AppState {
    config: Config,
    aggregator: Arc<Aggregator>,
}

impl AppState {
    pub fn new(config: Config, aggregator: Arc<Aggregator>) -> Self {
        Self { config, aggregator }
    }

    pub fn aggregator(&self) -> &Aggregator {
        &self.aggregator
    }

    pub fn preferences(&self) -> &UserPreferences {
        &self.config.preferences
    }

    pub fn public_base_url(&self) -> &str {
        &self.config.server.public_base_url
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }
}
