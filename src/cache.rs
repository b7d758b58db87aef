/*!
 * Result caching.
 *
 * Merged subtitles are cached by request so a repeated fetch does not search,
 * download and align again. Entries expire lazily: an expired entry is treated
 * as missing on read and removed by `purge_expired`.
 */

use log::debug;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use crate::scoring::EpisodeInfo;

/// Key/value store for finished results
pub trait ResultCache: Send + Sync + fmt::Debug {
    fn get(&self, key: &str) -> Option<String>;

    /// Storing the same key again replaces the value and its expiry
    fn put(&self, key: &str, content: String, ttl: Duration);
}

/// Cache key for one dual-subtitle request
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub title_id: String,
    pub primary_language: String,
    pub secondary_language: String,
    pub episode: Option<EpisodeInfo>,
    pub offset_ms: i64,
}

impl CacheKey {
    pub fn new(title_id: &str, primary_language: &str, secondary_language: &str) -> Self {
        Self {
            title_id: title_id.to_string(),
            primary_language: primary_language.to_lowercase(),
            secondary_language: secondary_language.to_lowercase(),
            episode: None,
            offset_ms: 0,
        }
    }

    pub fn with_episode(mut self, episode: Option<EpisodeInfo>) -> Self {
        self.episode = episode;
        self
    }

    pub fn with_offset(mut self, offset_ms: i64) -> Self {
        self.offset_ms = offset_ms;
        self
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.title_id, self.primary_language, self.secondary_language)?;
        if let Some(episode) = self.episode {
            write!(f, ":s{:02}e{:02}", episode.season, episode.episode)?;
        }
        if self.offset_ms != 0 {
            write!(f, ":{:+}ms", self.offset_ms)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    content: String,
    expires_at: Instant,
}

/// In-memory TTL cache
#[derive(Debug, Clone)]
pub struct MemoryCache {
    /// Internal cache storage
    entries: Arc<RwLock<HashMap<String, CacheEntry>>>,

    /// Cache hit counter
    hits: Arc<AtomicUsize>,

    /// Cache miss counter
    misses: Arc<AtomicUsize>,

    /// Whether caching is enabled
    enabled: bool,
}

impl MemoryCache {
    /// Create a new result cache
    pub fn new(enabled: bool) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            hits: Arc::new(AtomicUsize::new(0)),
            misses: Arc::new(AtomicUsize::new(0)),
            enabled,
        }
    }

    /// Get cache statistics: hits, misses, hit rate
    pub fn stats(&self) -> (usize, usize, f64) {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;

        let hit_rate = if total > 0 {
            hits as f64 / total as f64
        } else {
            0.0
        };

        (hits, misses, hit_rate)
    }

    /// Drop expired entries, returns how many were removed
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, entry| entry.expires_at > now);
        before - entries.len()
    }

    /// Number of stored entries, expired ones included until purged
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new(true)
    }
}

impl ResultCache for MemoryCache {
    fn get(&self, key: &str) -> Option<String> {
        if !self.enabled {
            return None;
        }

        let entries = self.entries.read();
        match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                debug!("Cache hit for '{}'", key);
                Some(entry.content.clone())
            }
            _ => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                debug!("Cache miss for '{}'", key);
                None
            }
        }
    }

    fn put(&self, key: &str, content: String, ttl: Duration) {
        if !self.enabled {
            return;
        }

        let entry = CacheEntry {
            content,
            expires_at: Instant::now() + ttl,
        };
        self.entries.write().insert(key.to_string(), entry);
        debug!("Cached result for '{}' ({}s)", key, ttl.as_secs());
    }
}
