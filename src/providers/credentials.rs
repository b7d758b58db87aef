use std::sync::atomic::{AtomicUsize, Ordering};

use log::warn;

/// Round-robin pool of API keys.
///
/// The client rotates to the next key when the current one hits its quota. The
/// pool is shared by all in-flight requests; rotation is lock-free.
#[derive(Debug, Default)]
pub struct CredentialPool {
    keys: Vec<String>,
    current: AtomicUsize,
}

impl CredentialPool {
    pub fn new(keys: Vec<String>) -> Self {
        let keys = keys.into_iter().filter(|k| !k.trim().is_empty()).collect();
        Self {
            keys,
            current: AtomicUsize::new(0),
        }
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Key to use for the next request
    pub fn current(&self) -> Option<&str> {
        if self.keys.is_empty() {
            return None;
        }
        let idx = self.current.load(Ordering::Relaxed) % self.keys.len();
        Some(&self.keys[idx])
    }

    /// Move past `exhausted` if it is still the active key.
    ///
    /// Comparing against the key that failed keeps two concurrent failures from
    /// skipping a healthy key.
    pub fn rotate_from(&self, exhausted: &str) {
        if self.keys.len() < 2 {
            return;
        }
        let idx = self.current.load(Ordering::Relaxed);
        if self.keys[idx % self.keys.len()] == exhausted
            && self
                .current
                .compare_exchange(idx, (idx + 1) % self.keys.len(), Ordering::AcqRel, Ordering::Relaxed)
                .is_ok()
        {
            warn!("API key quota exhausted, rotating to key {}/{}", (idx + 1) % self.keys.len() + 1, self.keys.len());
        }
    }
}
