use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::merge::{Aligner, BackboneMode, FormatPolicy, Layout, MergeEngine, DEFAULT_GUARD_MS};
use crate::scoring::DEFAULT_TOP_N;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Language of the master track (ISO)
    pub primary_language: String,

    /// Language attached under the master track (ISO)
    pub secondary_language: String,

    /// Alignment settings
    #[serde(default)]
    pub merge: MergeConfig,

    /// Presentation of merged cues
    #[serde(default)]
    pub format: FormatPolicy,

    /// Subtitle provider settings
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Machine translation settings
    #[serde(default)]
    pub translation: TranslationConfig,

    /// Result cache settings
    #[serde(default)]
    pub cache: CacheConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Alignment configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct MergeConfig {
    // @field: Backbone algorithm
    #[serde(default)]
    pub mode: BackboneMode,

    // @field: Guard band in milliseconds
    #[serde(default = "default_guard_ms")]
    pub guard_ms: u64,

    // @field: Signed shift applied to the secondary track
    #[serde(default)]
    pub offset_ms: i64,

    // @field: Clamp overlapping output cues
    #[serde(default = "default_true")]
    pub clamp_overlaps: bool,

    // @field: Candidates per language considered for pairing
    #[serde(default = "default_top_n")]
    pub top_n: usize,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            mode: BackboneMode::default(),
            guard_ms: default_guard_ms(),
            offset_ms: 0,
            clamp_overlaps: true,
            top_n: default_top_n(),
        }
    }
}

/// Subtitle provider configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ProviderConfig {
    // @field: API base URL
    #[serde(default = "default_provider_endpoint")]
    pub endpoint: String,

    // @field: API keys, rotated on quota errors
    #[serde(default)]
    pub api_keys: Vec<String>,

    // @field: User agent sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    // @field: Timeout seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    // @field: Retry count for failed requests
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    // @field: Base backoff, doubled on each retry
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            endpoint: default_provider_endpoint(),
            api_keys: Vec::new(),
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
            retry_count: default_retry_count(),
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

/// Machine translation configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationConfig {
    /// Translate the primary track when no secondary subtitle exists
    #[serde(default)]
    pub enabled: bool,

    /// LibreTranslate-compatible service URL
    #[serde(default = "default_translation_endpoint")]
    pub endpoint: String,

    /// API key for the service, if it requires one
    #[serde(default)]
    pub api_key: Option<String>,

    /// Lines per request
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Delay in milliseconds between consecutive batches
    #[serde(default = "default_batch_delay_ms")]
    pub batch_delay_ms: u64,

    /// Retry count for throttled requests
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    /// Backoff base for retries (in milliseconds)
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Upper bound for a single backoff wait
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: default_translation_endpoint(),
            api_key: None,
            batch_size: default_batch_size(),
            batch_delay_ms: default_batch_delay_ms(),
            retry_count: default_retry_count(),
            retry_backoff_ms: default_retry_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Result cache configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CacheConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Time to live of a merged result
    #[serde(default = "default_cache_ttl_secs")]
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_secs: default_cache_ttl_secs(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            Self::Error => log::LevelFilter::Error,
            Self::Warn => log::LevelFilter::Warn,
            Self::Info => log::LevelFilter::Info,
            Self::Debug => log::LevelFilter::Debug,
            Self::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_guard_ms() -> u64 {
    DEFAULT_GUARD_MS
}

fn default_top_n() -> usize {
    DEFAULT_TOP_N
}

fn default_true() -> bool {
    true
}

fn default_provider_endpoint() -> String {
    "https://api.opensubtitles.com/api/v1".to_string()
}

fn default_user_agent() -> String {
    format!("dualsub v{}", env!("CARGO_PKG_VERSION"))
}

fn default_translation_endpoint() -> String {
    "http://localhost:5000".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_retry_count() -> u32 {
    3 // Default to 3 retries
}

fn default_retry_backoff_ms() -> u64 {
    1000 // 1 second base backoff time, doubled on each retry
}

fn default_max_backoff_ms() -> u64 {
    30_000
}

fn default_batch_size() -> usize {
    20
}

fn default_batch_delay_ms() -> u64 {
    500
}

fn default_cache_ttl_secs() -> u64 {
    6 * 60 * 60
}

impl Config {
    /// Load a configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open config file: {}", path.display()))?;
        let reader = BufReader::new(file);
        serde_json::from_reader(reader)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Write the configuration as pretty JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .context("Failed to serialize config to JSON")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write config to file: {}", path.display()))
    }

    /// Load `path`, or create it with defaults when it does not exist
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if path.exists() {
            return Self::from_file(path);
        }
        log::warn!("Config file not found at '{}', creating default config.", path.display());
        let config = Self::default();
        config.save(path)?;
        Ok(config)
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        // Validate languages
        let _primary_name = crate::language_utils::get_language_name(&self.primary_language)?;
        let _secondary_name = crate::language_utils::get_language_name(&self.secondary_language)?;

        if crate::language_utils::language_codes_match(&self.primary_language, &self.secondary_language) {
            return Err(anyhow!(
                "Primary and secondary language are the same: {}",
                self.primary_language
            ));
        }

        if self.format.max_line_width < 10 {
            return Err(anyhow!("format.max_line_width must be at least 10"));
        }
        if self.format.layout == Layout::SideBySide && self.format.column_width < 10 {
            return Err(anyhow!("format.column_width must be at least 10"));
        }
        if self.merge.guard_ms > 1000 {
            return Err(anyhow!("merge.guard_ms must not exceed 1000"));
        }
        if self.merge.top_n == 0 {
            return Err(anyhow!("merge.top_n must be at least 1"));
        }
        if self.translation.batch_size == 0 {
            return Err(anyhow!("translation.batch_size must be at least 1"));
        }
        if self.translation.enabled && self.translation.endpoint.trim().is_empty() {
            return Err(anyhow!("translation.endpoint is required when translation is enabled"));
        }

        Ok(())
    }

    /// Merge engine built from the merge and format sections
    pub fn merge_engine(&self) -> MergeEngine {
        MergeEngine::new(
            Aligner::new(self.merge.guard_ms, self.merge.mode),
            self.format.clone(),
            self.merge.clamp_overlaps,
        )
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            primary_language: "en".to_string(),
            secondary_language: "fr".to_string(),
            merge: MergeConfig::default(),
            format: FormatPolicy::default(),
            provider: ProviderConfig::default(),
            translation: TranslationConfig::default(),
            cache: CacheConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}
