use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::app_config::Config;
use crate::cache::{CacheKey, MemoryCache, ResultCache};
use crate::errors::{MergeError, Track};
use crate::file_utils::FileManager;
use crate::language_utils;
use crate::merge::{clamp_overlaps, clean_lines, render, CueOrigin, Layout, MergeEngine, MergedCue};
use crate::providers::opensubtitles::OpenSubtitles;
use crate::providers::{SearchQuery, SubtitleProvider};
use crate::scoring::{self, CandidateFile, EpisodeInfo};
use crate::subtitle_codec::CueSequence;
use crate::translation::{BatchTranslator, LibreTranslate, Translator};

// @module: Application controller for dual subtitle production

/// Where a dual subtitle came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DualOrigin {
    /// Two provider files, aligned
    Fetched,
    /// Served from the result cache
    Cached,
    /// Primary file plus its machine translation
    Translated,
}

/// A finished dual subtitle
#[derive(Debug, Clone)]
pub struct DualSubtitle {
    /// Serialized cue blocks
    pub content: String,
    pub origin: DualOrigin,
    /// Provider file names, when known
    pub primary_file: Option<String>,
    pub secondary_file: Option<String>,
}

/// Main application controller
#[derive(Debug)]
pub struct Controller {
    // @field: App configuration
    config: Config,
    // @field: Aligner, clamp and formatter built from the config
    engine: MergeEngine,
    // @field: Subtitle search and download
    provider: Arc<dyn SubtitleProvider>,
    // @field: Machine translation backend
    translator: Arc<dyn Translator>,
    // @field: Finished results
    cache: Arc<dyn ResultCache>,
}

impl Controller {
    // @method: Create a new controller with the given configuration and the default collaborators
    pub fn with_config(config: Config) -> Result<Self> {
        let provider: Arc<dyn SubtitleProvider> = Arc::new(OpenSubtitles::new(&config.provider)?);
        let translator: Arc<dyn Translator> = Arc::new(LibreTranslate::new(&config.translation)?);
        let cache: Arc<dyn ResultCache> = Arc::new(MemoryCache::new(config.cache.enabled));
        Ok(Self::with_services(config, provider, translator, cache))
    }

    // @method: Create a controller with injected collaborators
    pub fn with_services(
        config: Config,
        provider: Arc<dyn SubtitleProvider>,
        translator: Arc<dyn Translator>,
        cache: Arc<dyn ResultCache>,
    ) -> Self {
        let engine = config.merge_engine();
        Self {
            config,
            engine,
            provider,
            translator,
            cache,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Merge two subtitle texts with the configured offset
    pub fn merge_texts(&self, primary: &str, secondary: &str) -> Result<String, MergeError> {
        let primary_seq = self.parse_track(primary, &self.config.primary_language)?;
        let secondary_seq = self.parse_track(secondary, &self.config.secondary_language)?;
        let merged = self.engine.merge(&primary_seq, &secondary_seq, self.config.merge.offset_ms)?;
        Ok(merged.serialize())
    }

    /// Merge two local files into one output file next to the primary or in `output_dir`
    pub fn merge_files(&self, primary: &Path, secondary: &Path, output_dir: Option<&Path>, force_overwrite: bool) -> Result<PathBuf> {
        let output_path = self.output_path_for(primary, output_dir);
        if FileManager::file_exists(&output_path) && !force_overwrite {
            return Err(anyhow!("Output file already exists: {:?}. Use -f to force overwrite.", output_path));
        }

        let primary_text = FileManager::read_subtitle_file(primary)?;
        let secondary_text = FileManager::read_subtitle_file(secondary)?;

        // Merge fully before touching the output so a failure never leaves a partial file
        let merged = self.merge_texts(&primary_text, &secondary_text)
            .with_context(|| format!("Failed to merge {:?} and {:?}", primary, secondary))?;

        FileManager::write_to_file(&output_path, &merged)?;
        info!("Success: {:?}", output_path);
        Ok(output_path)
    }

    /// Search both languages, pick the most compatible pair, download, align and cache
    pub async fn fetch_dual(&self, title_id: &str, episode: Option<EpisodeInfo>) -> Result<DualSubtitle, MergeError> {
        let key = CacheKey::new(title_id, &self.config.primary_language, &self.config.secondary_language)
            .with_episode(episode)
            .with_offset(self.config.merge.offset_ms)
            .to_string();

        if let Some(content) = self.cache.get(&key) {
            debug!("Serving '{}' from cache", key);
            return Ok(DualSubtitle {
                content,
                origin: DualOrigin::Cached,
                primary_file: None,
                secondary_file: None,
            });
        }

        let primary_query = SearchQuery::new(title_id, &self.config.primary_language).with_episode(episode);
        let secondary_query = SearchQuery::new(title_id, &self.config.secondary_language).with_episode(episode);

        let (primary_found, secondary_found) = futures::future::join(
            self.provider.search(&primary_query),
            self.provider.search(&secondary_query),
        )
        .await;

        let primary_found = scoring::filter_for_episode(primary_found?, episode);
        let secondary_found = scoring::filter_for_episode(secondary_found?, episode);
        info!(
            "Found {} {} and {} {} candidate(s) for {}",
            primary_found.len(),
            self.config.primary_language,
            secondary_found.len(),
            self.config.secondary_language,
            title_id
        );

        if primary_found.is_empty() {
            return Err(MergeError::NoCandidates { language: self.config.primary_language.clone() });
        }

        let result = if secondary_found.is_empty() {
            if !self.config.translation.enabled {
                return Err(MergeError::NoCandidates { language: self.config.secondary_language.clone() });
            }
            warn!("No {} subtitle available, falling back to machine translation", self.config.secondary_language);
            self.translate_best(primary_found).await?
        } else {
            self.merge_best_pair(primary_found, secondary_found).await?
        };

        self.cache.put(&key, result.content.clone(), Duration::from_secs(self.config.cache.ttl_secs));
        Ok(result)
    }

    /// Best single file for one language, downloaded
    pub async fn fetch_best_single(&self, title_id: &str, language: &str, episode: Option<EpisodeInfo>) -> Result<String, MergeError> {
        let query = SearchQuery::new(title_id, language).with_episode(episode);
        let found = scoring::filter_for_episode(self.provider.search(&query).await?, episode);

        let best = scoring::best_single(found, Utc::now())
            .ok_or_else(|| MergeError::NoCandidates { language: language.to_string() })?;
        debug!("Best single {} file: '{}'", language, best.file_name);

        self.download_nonempty(&best).await
    }

    /// Translate a primary-language subtitle text and stack the translation under it
    pub async fn translate_text(&self, primary: &str, progress_callback: impl Fn(usize, usize)) -> Result<String, MergeError> {
        let primary_seq = self.parse_track(primary, &self.config.primary_language)?;
        let merged = self.translate_and_merge(&primary_seq, progress_callback).await?;
        Ok(merged.serialize())
    }

    /// Translate a local file, writing `<stem>.<primary>-<secondary>.srt`
    pub async fn translate_file(&self, input: &Path, output_dir: Option<&Path>, force_overwrite: bool) -> Result<PathBuf> {
        let output_path = self.output_path_for(input, output_dir);
        if FileManager::file_exists(&output_path) && !force_overwrite {
            return Err(anyhow!("Output file already exists: {:?}. Use -f to force overwrite.", output_path));
        }

        let content = FileManager::read_subtitle_file(input)?;

        let progress_bar = ProgressBar::new(0);
        let template_result = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} batches ({percent}%) {msg} {eta}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(template_result.progress_chars("█▓▒░"));
        progress_bar.set_message("Translating");

        let result = self
            .translate_text(&content, |done, total| {
                progress_bar.set_length(total as u64);
                progress_bar.set_position(done as u64);
            })
            .await;

        progress_bar.finish_and_clear();

        let merged = result.with_context(|| format!("Failed to translate {:?}", input))?;
        FileManager::write_to_file(&output_path, &merged)?;
        info!("Success: {:?}", output_path);
        Ok(output_path)
    }

    /// Fetch a dual subtitle for a title and write it to `output_dir`
    pub async fn fetch_to_file(&self, title_id: &str, episode: Option<EpisodeInfo>, output_dir: &Path, force_overwrite: bool) -> Result<PathBuf> {
        let mut name = title_id.to_string();
        if let Some(episode) = episode {
            name.push_str(&format!(".S{:02}E{:02}", episode.season, episode.episode));
        }
        let output_path = output_dir.join(format!(
            "{}.{}.srt",
            name,
            language_utils::pair_tag(&self.config.primary_language, &self.config.secondary_language)
        ));
        if FileManager::file_exists(&output_path) && !force_overwrite {
            return Err(anyhow!("Output file already exists: {:?}. Use -f to force overwrite.", output_path));
        }

        let dual = self.fetch_dual(title_id, episode).await?;
        if let (Some(primary), Some(secondary)) = (&dual.primary_file, &dual.secondary_file) {
            info!("Merged '{}' with '{}'", primary, secondary);
        }

        FileManager::write_to_file(&output_path, &dual.content)?;
        info!("Success: {:?}", output_path);
        Ok(output_path)
    }

    async fn merge_best_pair(&self, primary_found: Vec<CandidateFile>, secondary_found: Vec<CandidateFile>) -> Result<DualSubtitle, MergeError> {
        let now = Utc::now();
        let primary_ranked: Vec<CandidateFile> = scoring::rank_candidates(primary_found, now)
            .into_iter()
            .map(|(file, _)| file)
            .collect();
        let secondary_ranked: Vec<CandidateFile> = scoring::rank_candidates(secondary_found, now)
            .into_iter()
            .map(|(file, _)| file)
            .collect();

        let selection = scoring::select_best_pair(&primary_ranked, &secondary_ranked, self.config.merge.top_n)
            .ok_or_else(|| MergeError::NoCandidates { language: self.config.primary_language.clone() })?;

        let (primary_text, secondary_text) = futures::future::try_join(
            self.download_nonempty(selection.first),
            self.download_nonempty(selection.second),
        )
        .await?;

        let content = self.merge_texts(&primary_text, &secondary_text)?;
        Ok(DualSubtitle {
            content,
            origin: DualOrigin::Fetched,
            primary_file: Some(selection.first.file_name.clone()),
            secondary_file: Some(selection.second.file_name.clone()),
        })
    }

    async fn translate_best(&self, primary_found: Vec<CandidateFile>) -> Result<DualSubtitle, MergeError> {
        let best = scoring::best_single(primary_found, Utc::now())
            .ok_or_else(|| MergeError::NoCandidates { language: self.config.primary_language.clone() })?;
        let text = self.download_nonempty(&best).await?;
        let primary_seq = self.parse_track(&text, &self.config.primary_language)?;
        let merged = self.translate_and_merge(&primary_seq, |_, _| {}).await?;

        Ok(DualSubtitle {
            content: merged.serialize(),
            origin: DualOrigin::Translated,
            primary_file: Some(best.file_name),
            secondary_file: None,
        })
    }

    /// Translated copy of `primary` on the same timing, rendered with the translation layout
    async fn translate_and_merge(&self, primary: &CueSequence, progress_callback: impl Fn(usize, usize)) -> Result<CueSequence, MergeError> {
        let batch = BatchTranslator::new(Arc::clone(&self.translator), &self.config.translation);

        let lines: Vec<String> = primary.iter().map(|cue| clean_lines(&cue.text()).join(" ")).collect();
        let translated = batch
            .translate_lines_with_progress(&lines, &self.config.primary_language, &self.config.secondary_language, progress_callback)
            .await;

        // Pair by position: each translation belongs to the cue it was made from
        let mut merged: Vec<MergedCue> = primary
            .iter()
            .zip(translated)
            .filter(|(cue, _)| !clean_lines(&cue.text()).is_empty())
            .map(|(cue, text)| MergedCue::new(cue.start_ms, cue.end_ms, cue.text(), text, CueOrigin::Anchored))
            .collect();
        if merged.is_empty() {
            return Err(MergeError::Degenerate { side: Track::Primary });
        }

        merged.sort_by_key(|cue| (cue.start_ms, cue.end_ms));
        for (idx, cue) in merged.iter_mut().enumerate() {
            cue.ordinal = idx + 1;
        }
        if self.config.merge.clamp_overlaps {
            clamp_overlaps(&mut merged);
        }

        Ok(render(&merged, self.engine.with_layout(Layout::TranslationDerived).formatter()))
    }

    async fn download_nonempty(&self, candidate: &CandidateFile) -> Result<String, MergeError> {
        let text = self.provider.download(candidate).await?;
        if text.trim().is_empty() {
            return Err(MergeError::EmptyDownload { file_name: candidate.file_name.clone() });
        }
        Ok(text)
    }

    fn parse_track(&self, text: &str, language: &str) -> Result<CueSequence, MergeError> {
        let seq = CueSequence::parse(text);
        if seq.is_empty() {
            return Err(MergeError::NoCues { language: language.to_string() });
        }
        Ok(seq)
    }

    fn output_path_for(&self, input: &Path, output_dir: Option<&Path>) -> PathBuf {
        let dir = output_dir
            .map(Path::to_path_buf)
            .unwrap_or_else(|| input.parent().unwrap_or(Path::new(".")).to_path_buf());
        FileManager::generate_output_path(
            input,
            dir,
            &language_utils::pair_tag(&self.config.primary_language, &self.config.secondary_language),
        )
    }
}
