/*!
 * Mock collaborators for testing.
 *
 * This module provides in-memory stand-ins for the network collaborators:
 * - `MockSubtitleProvider`: a per-language catalog of candidates and file bodies
 * - `MockTranslator`: prefixes every line with the target language
 *
 * Both count their calls so tests can assert how the pipeline used them.
 */

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::errors::ProviderError;
use crate::scoring::CandidateFile;
use crate::translation::Translator;

use super::{SearchQuery, SubtitleProvider};

/// Behavior mode for the mock subtitle provider
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockProviderBehavior {
    /// Serves the catalog
    Working,
    /// Every call fails with a server error
    Failing,
    /// Every call is throttled
    RateLimited,
}

/// In-memory subtitle provider
#[derive(Debug, Clone)]
pub struct MockSubtitleProvider {
    behavior: MockProviderBehavior,
    /// Candidates by language code
    catalog: HashMap<String, Vec<CandidateFile>>,
    /// File bodies by candidate id
    files: HashMap<String, String>,
    search_count: Arc<AtomicUsize>,
    download_count: Arc<AtomicUsize>,
}

impl MockSubtitleProvider {
    /// Create a new mock provider with the specified behavior
    pub fn new(behavior: MockProviderBehavior) -> Self {
        Self {
            behavior,
            catalog: HashMap::new(),
            files: HashMap::new(),
            search_count: Arc::new(AtomicUsize::new(0)),
            download_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Create an empty working provider
    pub fn working() -> Self {
        Self::new(MockProviderBehavior::Working)
    }

    /// Create a provider whose calls always fail
    pub fn failing() -> Self {
        Self::new(MockProviderBehavior::Failing)
    }

    /// Create a provider whose calls are always throttled
    pub fn rate_limited() -> Self {
        Self::new(MockProviderBehavior::RateLimited)
    }

    /// Register a candidate and the body returned when it is downloaded
    pub fn with_file(mut self, candidate: CandidateFile, content: impl Into<String>) -> Self {
        self.files.insert(candidate.id.clone(), content.into());
        self.catalog
            .entry(candidate.language.clone())
            .or_default()
            .push(candidate);
        self
    }

    pub fn search_count(&self) -> usize {
        self.search_count.load(Ordering::SeqCst)
    }

    pub fn download_count(&self) -> usize {
        self.download_count.load(Ordering::SeqCst)
    }

    fn check_behavior(&self) -> Result<(), ProviderError> {
        match self.behavior {
            MockProviderBehavior::Working => Ok(()),
            MockProviderBehavior::Failing => Err(ProviderError::ApiError {
                message: "Simulated provider failure".to_string(),
                status_code: 500,
            }),
            MockProviderBehavior::RateLimited => Err(ProviderError::RateLimitExceeded(
                "Simulated quota exhaustion".to_string(),
            )),
        }
    }
}

#[async_trait]
impl SubtitleProvider for MockSubtitleProvider {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<CandidateFile>, ProviderError> {
        self.search_count.fetch_add(1, Ordering::SeqCst);
        self.check_behavior()?;
        Ok(self.catalog.get(&query.language).cloned().unwrap_or_default())
    }

    async fn download(&self, candidate: &CandidateFile) -> Result<String, ProviderError> {
        self.download_count.fetch_add(1, Ordering::SeqCst);
        self.check_behavior()?;
        Ok(self.files.get(&candidate.id).cloned().unwrap_or_default())
    }
}

/// Behavior mode for the mock translator
#[derive(Debug, Clone, PartialEq)]
pub enum MockTranslatorBehavior {
    /// Always succeeds
    Working,
    /// Any request containing this exact line fails
    FailOn(String),
    /// The first `times` requests are throttled, later ones succeed
    RateLimited { times: usize },
    /// Returns one line fewer than requested
    Short,
    /// Always fails with an error
    Failing,
}

/// Mock translator producing `[<to>] <line>`
#[derive(Debug, Clone)]
pub struct MockTranslator {
    behavior: MockTranslatorBehavior,
    request_count: Arc<AtomicUsize>,
}

impl MockTranslator {
    pub fn new(behavior: MockTranslatorBehavior) -> Self {
        Self {
            behavior,
            request_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn working() -> Self {
        Self::new(MockTranslatorBehavior::Working)
    }

    pub fn fail_on(line: impl Into<String>) -> Self {
        Self::new(MockTranslatorBehavior::FailOn(line.into()))
    }

    pub fn rate_limited(times: usize) -> Self {
        Self::new(MockTranslatorBehavior::RateLimited { times })
    }

    pub fn failing() -> Self {
        Self::new(MockTranslatorBehavior::Failing)
    }

    /// Number of `translate_batch` calls so far, shared between clones
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    fn render(lines: &[String], to: &str) -> Vec<String> {
        lines.iter().map(|line| format!("[{}] {}", to, line)).collect()
    }
}

#[async_trait]
impl Translator for MockTranslator {
    async fn translate_batch(&self, lines: &[String], _from: &str, to: &str) -> Result<Vec<String>, ProviderError> {
        let count = self.request_count.fetch_add(1, Ordering::SeqCst);

        match &self.behavior {
            MockTranslatorBehavior::Working => Ok(Self::render(lines, to)),

            MockTranslatorBehavior::FailOn(poison) => {
                if lines.iter().any(|line| line == poison) {
                    Err(ProviderError::ApiError {
                        message: format!("Simulated failure on '{}'", poison),
                        status_code: 500,
                    })
                } else {
                    Ok(Self::render(lines, to))
                }
            }

            MockTranslatorBehavior::RateLimited { times } => {
                if count < *times {
                    Err(ProviderError::RateLimitExceeded(format!(
                        "Simulated throttling (request #{})",
                        count + 1
                    )))
                } else {
                    Ok(Self::render(lines, to))
                }
            }

            MockTranslatorBehavior::Short => {
                let mut out = Self::render(lines, to);
                out.pop();
                Ok(out)
            }

            MockTranslatorBehavior::Failing => Err(ProviderError::ApiError {
                message: "Simulated translator failure".to_string(),
                status_code: 503,
            }),
        }
    }
}
