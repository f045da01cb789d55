//! Mock metadata service for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::media::{
    parse_compound_id, EpisodeRef, MediaRequest, MediaType, MetadataError, MetadataService,
};

/// Mock implementation of the `MetadataService` trait.
///
/// Titles are keyed by external id; unknown ids resolve as "Unknown" so
/// most tests need no setup at all.
#[derive(Default)]
pub struct MockMetadataService {
    titles: Mutex<HashMap<String, (String, Option<u32>)>>,
    episodes: Mutex<HashMap<String, Vec<EpisodeRef>>>,
    fail: Mutex<Option<String>>,
}

impl MockMetadataService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_title(&self, external_id: &str, title: &str, year: Option<u32>) {
        self.titles
            .lock()
            .unwrap()
            .insert(external_id.to_string(), (title.to_string(), year));
    }

    pub fn set_episodes(&self, external_id: &str, episodes: Vec<EpisodeRef>) {
        self.episodes
            .lock()
            .unwrap()
            .insert(external_id.to_string(), episodes);
    }

    /// Make every resolution fail with the given message.
    pub fn fail_with(&self, message: &str) {
        *self.fail.lock().unwrap() = Some(message.to_string());
    }
}

#[async_trait]
impl MetadataService for MockMetadataService {
    async fn resolve(
        &self,
        media_type: MediaType,
        compound_id: &str,
        language: &str,
    ) -> Result<MediaRequest, MetadataError> {
        if let Some(message) = self.fail.lock().unwrap().clone() {
            return Err(MetadataError::ApiError(message));
        }

        let (external_id, season, episode) = parse_compound_id(compound_id)?;

        let (title, year) = self
            .titles
            .lock()
            .unwrap()
            .get(&external_id)
            .cloned()
            .unwrap_or_else(|| ("Unknown".to_string(), None));

        let episodes = self
            .episodes
            .lock()
            .unwrap()
            .get(&external_id)
            .cloned()
            .unwrap_or_default();

        Ok(MediaRequest {
            media_type,
            external_id,
            title,
            season,
            episode,
            year,
            language: language.to_string(),
            episodes,
        })
    }
}
