/*!
 * Machine translation of subtitle text.
 *
 * Used when a secondary-language subtitle is missing: the primary track is
 * translated line by line and the result stands in as the secondary track.
 *
 * - `Translator`: the collaborator trait (one request, many lines)
 * - `batch`: bounded batches with throttling backoff and per-line fallback
 * - `libretranslate`: HTTP client for LibreTranslate-compatible services
 */

use async_trait::async_trait;
use std::fmt::Debug;

use crate::errors::ProviderError;

pub use self::batch::BatchTranslator;
pub use self::libretranslate::LibreTranslate;

pub mod batch;
pub mod libretranslate;

/// Translates a batch of lines in one request
#[async_trait]
pub trait Translator: Send + Sync + Debug {
    /// Output is expected to be positional; callers verify the length
    async fn translate_batch(&self, lines: &[String], from: &str, to: &str) -> Result<Vec<String>, ProviderError>;
}
