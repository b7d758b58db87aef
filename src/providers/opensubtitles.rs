use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, error, warn};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::app_config::ProviderConfig;
use crate::errors::ProviderError;
use crate::language_utils;
use crate::scoring::{CandidateFile, EpisodeInfo, UploaderTier};

use super::credentials::CredentialPool;
use super::{SearchQuery, SubtitleProvider};

/// OpenSubtitles REST (v1) client
#[derive(Debug)]
pub struct OpenSubtitles {
    /// HTTP client for API requests
    client: Client,
    /// API base URL, without trailing slash
    endpoint: String,
    /// Sent with every request, the API rejects anonymous agents
    user_agent: String,
    /// API keys, rotated on quota errors
    credentials: CredentialPool,
    /// Maximum number of retry attempts
    max_retries: u32,
    /// Base backoff time in milliseconds for exponential backoff
    backoff_base_ms: u64,
}

/// Search response envelope
#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Vec<SubtitleItem>,
}

#[derive(Debug, Deserialize)]
struct SubtitleItem {
    attributes: SubtitleAttributes,
}

#[derive(Debug, Deserialize)]
struct SubtitleAttributes {
    #[serde(default)]
    language: Option<String>,
    #[serde(default)]
    download_count: u64,
    #[serde(default)]
    ratings: f64,
    #[serde(default)]
    hearing_impaired: bool,
    #[serde(default)]
    upload_date: Option<String>,
    #[serde(default)]
    release: Option<String>,
    #[serde(default)]
    uploader: Option<Uploader>,
    #[serde(default)]
    files: Vec<FileEntry>,
    #[serde(default)]
    feature_details: Option<FeatureDetails>,
}

#[derive(Debug, Deserialize)]
struct Uploader {
    #[serde(default)]
    rank: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FileEntry {
    file_id: u64,
    #[serde(default)]
    file_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FeatureDetails {
    #[serde(default)]
    season_number: Option<u32>,
    #[serde(default)]
    episode_number: Option<u32>,
}

#[derive(Debug, Serialize)]
struct DownloadRequest {
    file_id: u64,
}

#[derive(Debug, Deserialize)]
struct DownloadResponse {
    link: String,
}

impl SubtitleAttributes {
    /// One candidate per attached file
    fn into_candidates(self, fallback_language: &str) -> Vec<CandidateFile> {
        let language = self.language.unwrap_or_else(|| fallback_language.to_string());
        let uploader_tier = self
            .uploader
            .and_then(|u| u.rank)
            .map(|rank| UploaderTier::from_rank(&rank))
            .unwrap_or_default();
        let uploaded_at = self
            .upload_date
            .as_deref()
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
            .map(|dt| dt.with_timezone(&Utc));
        let episode = self.feature_details.and_then(|details| {
            Some(EpisodeInfo {
                season: details.season_number?,
                episode: details.episode_number?,
            })
        });
        let release = self.release.unwrap_or_default();

        self.files
            .into_iter()
            .map(|file| CandidateFile {
                id: file.file_id.to_string(),
                // The release name is richer than generated file names when both exist
                file_name: if release.is_empty() {
                    file.file_name.unwrap_or_default()
                } else {
                    release.clone()
                },
                language: language.clone(),
                download_count: self.download_count,
                rating: self.ratings,
                uploader_tier,
                uploaded_at,
                episode,
                hearing_impaired: self.hearing_impaired,
            })
            .collect()
    }
}

/// `tt0944947` -> `944947`; None when the id is not an IMDb id
fn imdb_number(title_id: &str) -> Option<String> {
    let digits = title_id.trim().strip_prefix("tt").unwrap_or(title_id.trim());
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let trimmed = digits.trim_start_matches('0');
    Some(if trimmed.is_empty() { "0".to_string() } else { trimmed.to_string() })
}

impl OpenSubtitles {
    /// Create a new client from provider configuration
    pub fn new(config: &ProviderConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ProviderError::ConnectionError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            user_agent: config.user_agent.clone(),
            credentials: CredentialPool::new(config.api_keys.clone()),
            max_retries: config.retry_count,
            backoff_base_ms: config.retry_backoff_ms,
        })
    }

    fn search_url(&self, query: &SearchQuery) -> Result<Url, ProviderError> {
        let language = language_utils::normalize_to_part1_or_part2t(&query.language)
            .unwrap_or_else(|_| query.language.trim().to_lowercase());

        let mut params: Vec<(&str, String)> = vec![("languages", language)];
        match (imdb_number(&query.title_id), query.episode) {
            (Some(id), Some(episode)) => {
                params.push(("parent_imdb_id", id));
                params.push(("season_number", episode.season.to_string()));
                params.push(("episode_number", episode.episode.to_string()));
            }
            (Some(id), None) => params.push(("imdb_id", id)),
            (None, episode) => {
                params.push(("query", query.title_id.clone()));
                if let Some(episode) = episode {
                    params.push(("season_number", episode.season.to_string()));
                    params.push(("episode_number", episode.episode.to_string()));
                }
            }
        }
        params.push(("order_by", "download_count".to_string()));

        Url::parse_with_params(&format!("{}/subtitles", self.endpoint), &params)
            .map_err(|e| ProviderError::RequestFailed(format!("Invalid search URL: {}", e)))
    }

    fn authorized(&self, builder: RequestBuilder, api_key: Option<&str>) -> RequestBuilder {
        let builder = builder
            .header("User-Agent", &self.user_agent)
            .header("Accept", "application/json");
        match api_key {
            Some(key) => builder.header("Api-Key", key),
            None => builder,
        }
    }

    /// Send with retries; `Ok(None)` means the resource does not exist
    async fn execute<F>(&self, build: F) -> Result<Option<Response>, ProviderError>
    where
        F: Fn(&Client) -> RequestBuilder,
    {
        let mut attempt = 0;
        let mut last_error = None;

        while attempt <= self.max_retries {
            let api_key = self.credentials.current().map(str::to_string);
            let request = self.authorized(build(&self.client), api_key.as_deref());

            match request.send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return Ok(Some(response));
                    }
                    if status == StatusCode::NOT_FOUND {
                        return Ok(None);
                    }

                    let message = response.text().await
                        .unwrap_or_else(|_| "Failed to get error response text".to_string());

                    if status == StatusCode::TOO_MANY_REQUESTS || status == StatusCode::NOT_ACCEPTABLE {
                        // 406 is the download quota, 429 the request rate
                        if let Some(key) = &api_key {
                            self.credentials.rotate_from(key);
                        }
                        warn!("OpenSubtitles throttled ({}) - attempt {}/{}", status, attempt + 1, self.max_retries + 1);
                        last_error = Some(ProviderError::RateLimitExceeded(message));
                    } else if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
                        if self.credentials.len() < 2 {
                            error!("OpenSubtitles rejected the API key ({})", status);
                            return Err(ProviderError::AuthenticationError(message));
                        }
                        if let Some(key) = &api_key {
                            self.credentials.rotate_from(key);
                        }
                        last_error = Some(ProviderError::AuthenticationError(message));
                    } else if status.is_server_error() {
                        error!("OpenSubtitles API error ({}): {} - attempt {}/{}", status, message, attempt + 1, self.max_retries + 1);
                        last_error = Some(ProviderError::ApiError { status_code: status.as_u16(), message });
                    } else {
                        error!("OpenSubtitles API error ({}): {}", status, message);
                        return Err(ProviderError::ApiError { status_code: status.as_u16(), message });
                    }
                }
                Err(e) => {
                    error!("OpenSubtitles network error: {} - attempt {}/{}", e, attempt + 1, self.max_retries + 1);
                    last_error = Some(ProviderError::ConnectionError(e.to_string()));
                }
            }

            attempt += 1;

            if attempt <= self.max_retries {
                let backoff_ms = self.backoff_base_ms * (1u64 << (attempt - 1).min(16));
                tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
            }
        }

        Err(last_error.unwrap_or_else(|| {
            ProviderError::RequestFailed(format!("OpenSubtitles request failed after {} attempts", self.max_retries + 1))
        }))
    }
}

#[async_trait]
impl SubtitleProvider for OpenSubtitles {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<CandidateFile>, ProviderError> {
        let url = self.search_url(query)?;
        debug!("Searching OpenSubtitles: {}", url);

        let Some(response) = self.execute(|client| client.get(url.clone())).await? else {
            return Ok(Vec::new());
        };

        let body: SearchResponse = response.json().await
            .map_err(|e| ProviderError::ParseError(e.to_string()))?;

        let candidates: Vec<CandidateFile> = body
            .data
            .into_iter()
            .flat_map(|item| item.attributes.into_candidates(&query.language))
            .collect();

        debug!("OpenSubtitles returned {} candidate(s) for '{}' [{}]", candidates.len(), query.title_id, query.language);
        Ok(candidates)
    }

    async fn download(&self, candidate: &CandidateFile) -> Result<String, ProviderError> {
        let file_id: u64 = candidate.id.parse()
            .map_err(|_| ProviderError::ParseError(format!("Invalid file id: {}", candidate.id)))?;
        let url = format!("{}/download", self.endpoint);

        let Some(response) = self
            .execute(|client| client.post(&url).json(&DownloadRequest { file_id }))
            .await?
        else {
            return Ok(String::new());
        };

        let link: DownloadResponse = response.json().await
            .map_err(|e| ProviderError::ParseError(e.to_string()))?;

        let file = self.client.get(&link.link)
            .header("User-Agent", &self.user_agent)
            .send()
            .await
            .map_err(|e| ProviderError::ConnectionError(e.to_string()))?;

        if file.status() == StatusCode::NOT_FOUND {
            return Ok(String::new());
        }
        if !file.status().is_success() {
            let status = file.status();
            return Err(ProviderError::ApiError {
                status_code: status.as_u16(),
                message: format!("Subtitle file download failed for '{}'", candidate.file_name),
            });
        }

        let bytes = file.bytes().await
            .map_err(|e| ProviderError::RequestFailed(e.to_string()))?;

        // Older uploads are often not UTF-8
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}
