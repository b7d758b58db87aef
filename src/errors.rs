/*!
 * Error types for the dualsub library.
 *
 * Each layer gets its own enum, built with thiserror. Malformed subtitle blocks are
 * not errors at all (the codec skips them), so `SubtitleError` only covers the
 * explicit timestamp helpers.
 */

use std::fmt;
use thiserror::Error;

/// Errors raised by the subtitle provider and translation HTTP clients
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Upstream throttling or quota exhaustion
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),
}

impl ProviderError {
    /// Whether the failure is throttling, the only kind worth backing off for
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimitExceeded(_))
    }
}

/// Errors from the explicit timestamp helpers
#[derive(Error, Debug, PartialEq, Eq)]
pub enum SubtitleError {
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),
}

/// Errors that can occur during translation
#[derive(Error, Debug)]
pub enum TranslationError {
    /// Error from the provider API
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// The translator broke the positional contract
    #[error("Translator returned {actual} lines for {expected} inputs")]
    LengthMismatch { expected: usize, actual: usize },
}

/// Which of the two tracks a merge failure refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Track {
    Primary,
    Secondary,
}

impl fmt::Display for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primary => write!(f, "primary"),
            Self::Secondary => write!(f, "secondary"),
        }
    }
}

/// Reasons a dual subtitle could not be produced
#[derive(Error, Debug)]
pub enum MergeError {
    /// The provider found nothing for a language
    #[error("No subtitle candidates found for language '{language}'")]
    NoCandidates { language: String },

    /// The chosen file downloaded as empty
    #[error("Downloaded subtitle '{file_name}' is empty")]
    EmptyDownload { file_name: String },

    /// A track parsed to zero cues
    #[error("Subtitle for language '{language}' contains no usable cues")]
    NoCues { language: String },

    /// One side of the alignment is empty
    #[error("Cannot merge: the {side} track is empty")]
    Degenerate { side: Track },

    /// Transport, auth or quota failure while fetching
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error from a provider
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error from subtitle processing
    #[error("Subtitle error: {0}")]
    Subtitle(#[from] SubtitleError),

    /// Error from translation
    #[error("Translation error: {0}")]
    Translation(#[from] TranslationError),

    /// No dual subtitle could be produced
    #[error("Merge error: {0}")]
    Merge(#[from] MergeError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
