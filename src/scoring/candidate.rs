use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::release::detect_episode;

/// Uploader trust tier reported by the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UploaderTier {
    #[default]
    Anonymous,
    Registered,
    Trusted,
    Verified,
}

impl UploaderTier {
    /// Map a provider rank label onto a tier
    pub fn from_rank(rank: &str) -> Self {
        let rank = rank.trim().to_lowercase();
        match rank.as_str() {
            "administrator" | "admin" | "app developer" | "verified" => Self::Verified,
            "trusted" | "gold member" | "platinum member" | "vip member" | "vip plus member" => Self::Trusted,
            "" | "anonymous" => Self::Anonymous,
            _ => Self::Registered,
        }
    }

    pub fn is_trusted(self) -> bool {
        self >= Self::Trusted
    }
}

/// Season and episode of a series release
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EpisodeInfo {
    pub season: u32,
    pub episode: u32,
}

/// Metadata about one retrievable subtitle file, not yet downloaded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateFile {
    /// Provider identifier used for download
    pub id: String,

    pub file_name: String,

    /// Language code as reported by the provider
    pub language: String,

    #[serde(default)]
    pub download_count: u64,

    /// Community rating, 0 to 10
    #[serde(default)]
    pub rating: f64,

    #[serde(default)]
    pub uploader_tier: UploaderTier,

    #[serde(default)]
    pub uploaded_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub episode: Option<EpisodeInfo>,

    #[serde(default)]
    pub hearing_impaired: bool,
}

impl CandidateFile {
    pub fn new(id: impl Into<String>, file_name: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            file_name: file_name.into(),
            language: language.into(),
            download_count: 0,
            rating: 0.0,
            uploader_tier: UploaderTier::default(),
            uploaded_at: None,
            episode: None,
            hearing_impaired: false,
        }
    }

    pub fn with_downloads(mut self, download_count: u64) -> Self {
        self.download_count = download_count;
        self
    }

    pub fn with_rating(mut self, rating: f64) -> Self {
        self.rating = rating;
        self
    }

    pub fn with_uploader(mut self, tier: UploaderTier) -> Self {
        self.uploader_tier = tier;
        self
    }

    pub fn uploaded(mut self, at: DateTime<Utc>) -> Self {
        self.uploaded_at = Some(at);
        self
    }

    pub fn for_episode(mut self, season: u32, episode: u32) -> Self {
        self.episode = Some(EpisodeInfo { season, episode });
        self
    }

    /// Provider-reported episode, else one detected from the filename
    pub fn detected_episode(&self) -> Option<EpisodeInfo> {
        self.episode.or_else(|| detect_episode(&self.file_name))
    }
}
