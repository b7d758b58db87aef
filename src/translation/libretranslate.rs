/*!
 * LibreTranslate-compatible HTTP translator.
 *
 * `POST {endpoint}/translate` accepts an array in `q` and answers with an array
 * in `translatedText`, so one request covers a whole batch. Retrying is left to
 * `BatchTranslator`.
 */

use async_trait::async_trait;
use log::error;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::app_config::TranslationConfig;
use crate::errors::ProviderError;
use crate::language_utils;

use super::Translator;

/// LibreTranslate client
#[derive(Debug)]
pub struct LibreTranslate {
    /// HTTP client for API requests
    client: Client,
    /// Service URL, without trailing slash
    endpoint: String,
    /// Optional API key
    api_key: Option<String>,
}

/// Translation request body
#[derive(Debug, Serialize)]
struct TranslateRequest<'a> {
    q: &'a [String],
    source: String,
    target: String,
    format: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    api_key: Option<&'a str>,
}

/// Servers answer a single string when `q` has one element
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TranslatedText {
    Many(Vec<String>),
    One(String),
}

#[derive(Debug, Deserialize)]
struct TranslateResponse {
    #[serde(rename = "translatedText")]
    translated_text: TranslatedText,
}

impl LibreTranslate {
    /// Create a new client from translation configuration
    pub fn new(config: &TranslationConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ProviderError::ConnectionError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone().filter(|k| !k.trim().is_empty()),
        })
    }

    /// The service only understands ISO 639-1 codes
    fn service_code(code: &str) -> String {
        language_utils::normalize_to_part1_or_part2t(code).unwrap_or_else(|_| code.trim().to_lowercase())
    }
}

#[async_trait]
impl Translator for LibreTranslate {
    async fn translate_batch(&self, lines: &[String], from: &str, to: &str) -> Result<Vec<String>, ProviderError> {
        if lines.is_empty() {
            return Ok(Vec::new());
        }

        let request = TranslateRequest {
            q: lines,
            source: Self::service_code(from),
            target: Self::service_code(to),
            format: "text",
            api_key: self.api_key.as_deref(),
        };

        let response = self.client
            .post(format!("{}/translate", self.endpoint))
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::ConnectionError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            return Err(match status {
                StatusCode::TOO_MANY_REQUESTS => ProviderError::RateLimitExceeded(message),
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ProviderError::AuthenticationError(message),
                _ => {
                    error!("Translation API error ({}): {}", status, message);
                    ProviderError::ApiError { status_code: status.as_u16(), message }
                }
            });
        }

        let body: TranslateResponse = response.json().await
            .map_err(|e| ProviderError::ParseError(e.to_string()))?;

        Ok(match body.translated_text {
            TranslatedText::Many(texts) => texts,
            TranslatedText::One(text) => vec![text],
        })
    }
}
