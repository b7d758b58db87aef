/*!
 * Subtitle provider clients.
 *
 * The merge pipeline only needs two operations from a provider: search a title
 * for candidate files in one language, and download one of them. This module
 * contains:
 * - `SubtitleProvider`: the trait the controller talks to
 * - `opensubtitles`: REST client with a rotating API key pool
 * - `credentials`: the key pool itself
 * - `mock`: in-memory provider and translator for tests
 */

use async_trait::async_trait;
use std::fmt::Debug;

use crate::errors::ProviderError;
use crate::scoring::{CandidateFile, EpisodeInfo};

/// What to look for
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SearchQuery {
    /// Provider-independent title id, e.g. an IMDb id (`tt0944947`)
    pub title_id: String,
    /// Language code (ISO 639-1 preferred)
    pub language: String,
    /// Set for series episodes
    pub episode: Option<EpisodeInfo>,
}

impl SearchQuery {
    pub fn new(title_id: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            title_id: title_id.into(),
            language: language.into(),
            episode: None,
        }
    }

    pub fn with_episode(mut self, episode: Option<EpisodeInfo>) -> Self {
        self.episode = episode;
        self
    }
}

/// Source of candidate subtitle files
///
/// "Not found" is never an error: `search` returns an empty list and `download`
/// an empty string. Errors are reserved for transport, auth and quota failures.
#[async_trait]
pub trait SubtitleProvider: Send + Sync + Debug {
    /// Candidate files for a title in one language
    async fn search(&self, query: &SearchQuery) -> Result<Vec<CandidateFile>, ProviderError>;

    /// Raw subtitle text of one candidate
    async fn download(&self, candidate: &CandidateFile) -> Result<String, ProviderError>;
}

pub mod credentials;
pub mod mock;
pub mod opensubtitles;
