/*!
 * Batch translation processing.
 *
 * Lines are sent in fixed-size batches, one batch at a time with a pause in
 * between. Throttled batches are retried with exponential backoff and fall back
 * to the untranslated text once retries run out. Any other failure (including a
 * response of the wrong length) falls back to translating the batch line by
 * line, where a failing line keeps its original text.
 */

use log::{debug, warn};
use std::sync::Arc;
use std::time::Duration;

use crate::app_config::TranslationConfig;
use crate::errors::TranslationError;

use super::Translator;

/// Batch translator with rate limiting and positional fallback
#[derive(Debug, Clone)]
pub struct BatchTranslator {
    /// The translation backend
    translator: Arc<dyn Translator>,

    /// Lines per request
    batch_size: usize,

    /// Pause between batches
    batch_delay_ms: u64,

    /// Retries for throttled requests
    retry_count: u32,

    /// Backoff base, doubled per attempt
    retry_backoff_ms: u64,

    /// Cap for a single backoff wait
    max_backoff_ms: u64,
}

impl BatchTranslator {
    /// Create a new batch translator
    pub fn new(translator: Arc<dyn Translator>, config: &TranslationConfig) -> Self {
        Self {
            translator,
            batch_size: config.batch_size.max(1),
            batch_delay_ms: config.batch_delay_ms,
            retry_count: config.retry_count,
            retry_backoff_ms: config.retry_backoff_ms,
            max_backoff_ms: config.max_backoff_ms,
        }
    }

    /// Translate `lines`; output has the same length and order as the input
    pub async fn translate_lines(&self, lines: &[String], from: &str, to: &str) -> Vec<String> {
        self.translate_lines_with_progress(lines, from, to, |_, _| {}).await
    }

    /// Same as `translate_lines`, reporting `(done_batches, total_batches)` after each batch
    pub async fn translate_lines_with_progress(
        &self,
        lines: &[String],
        from: &str,
        to: &str,
        progress_callback: impl Fn(usize, usize),
    ) -> Vec<String> {
        let mut output: Vec<String> = lines.to_vec();

        // Blank lines pass through untouched
        let positions: Vec<usize> = lines
            .iter()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(idx, _)| idx)
            .collect();

        let total_batches = positions.len().div_ceil(self.batch_size);

        for (batch_index, chunk) in positions.chunks(self.batch_size).enumerate() {
            if batch_index > 0 && self.batch_delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(self.batch_delay_ms)).await;
            }

            let texts: Vec<String> = chunk.iter().map(|&idx| lines[idx].clone()).collect();
            let translated = self.translate_chunk(&texts, from, to).await;

            for (&idx, text) in chunk.iter().zip(translated) {
                output[idx] = text;
            }

            progress_callback(batch_index + 1, total_batches);
        }

        output
    }

    /// One batch, never fails; positions that cannot be translated keep their text
    async fn translate_chunk(&self, texts: &[String], from: &str, to: &str) -> Vec<String> {
        match self.call_with_backoff(texts, from, to).await {
            Ok(translated) => translated,
            Err(TranslationError::Provider(e)) if e.is_rate_limited() => {
                warn!("Translation still throttled after {} retries, keeping {} original line(s)", self.retry_count, texts.len());
                texts.to_vec()
            }
            Err(e) => {
                warn!("Batch translation failed ({}), retrying individual lines", e);
                self.translate_each(texts, from, to).await
            }
        }
    }

    async fn translate_each(&self, texts: &[String], from: &str, to: &str) -> Vec<String> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            let single = std::slice::from_ref(text);
            match self.call_with_backoff(single, from, to).await {
                Ok(mut translated) => out.push(translated.pop().unwrap_or_else(|| text.clone())),
                Err(e) => {
                    debug!("Keeping original line after translation error: {}", e);
                    out.push(text.clone());
                }
            }
        }
        out
    }

    /// One request with retries on throttling, verifying the positional contract
    async fn call_with_backoff(&self, texts: &[String], from: &str, to: &str) -> Result<Vec<String>, TranslationError> {
        let mut attempt: u32 = 0;

        loop {
            match self.translator.translate_batch(texts, from, to).await {
                Ok(translated) if translated.len() == texts.len() => return Ok(translated),
                Ok(translated) => {
                    return Err(TranslationError::LengthMismatch {
                        expected: texts.len(),
                        actual: translated.len(),
                    });
                }
                Err(e) if e.is_rate_limited() && attempt < self.retry_count => {
                    let backoff_ms = self.backoff_ms(attempt);
                    warn!(
                        "Translation throttled, retrying in {}ms (attempt {}/{})",
                        backoff_ms,
                        attempt + 1,
                        self.retry_count
                    );
                    tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                    attempt += 1;
                }
                Err(e) => return Err(TranslationError::Provider(e)),
            }
        }
    }

    /// `retry_backoff_ms * 2^attempt`, capped
    fn backoff_ms(&self, attempt: u32) -> u64 {
        self.retry_backoff_ms
            .saturating_mul(1u64 << attempt.min(20))
            .min(self.max_backoff_ms)
    }
}
