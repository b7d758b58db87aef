/*!
 * End-to-end tests for search, pairing, download and translation fallback
 */

use anyhow::Result;
use std::sync::Arc;

use dualsub::app_config::Config;
use dualsub::app_controller::{Controller, DualOrigin};
use dualsub::cache::MemoryCache;
use dualsub::errors::{MergeError, ProviderError};
use dualsub::providers::mock::{MockSubtitleProvider, MockTranslator};
use dualsub::scoring::{CandidateFile, EpisodeInfo, UploaderTier};
use dualsub::subtitle_codec::CueSequence;
use crate::common;

const ENGLISH_TV: &str = "Movie.2019.720p.HDTV.x264-LOL.srt";
const ENGLISH_DISC: &str = "Movie.2019.1080p.BluRay.x264-SPARKS.srt";
const FRENCH_DISC: &str = "Movie.2019.1080p.BluRay.x264-SPARKS.srt";

/// Shifted English track, only ever chosen if pairing goes wrong
const ENGLISH_TV_SRT: &str = "1\n00:00:03,000 --> 00:00:06,000\nHello there (TV).\n";

fn controller_with(config: Config, provider: &MockSubtitleProvider, translator: &MockTranslator) -> Controller {
    Controller::with_services(
        config,
        Arc::new(provider.clone()),
        Arc::new(translator.clone()),
        Arc::new(MemoryCache::new(true)),
    )
}

fn movie_catalog() -> MockSubtitleProvider {
    MockSubtitleProvider::working()
        .with_file(
            CandidateFile::new("en-tv", ENGLISH_TV, "en").with_downloads(50_000),
            ENGLISH_TV_SRT,
        )
        .with_file(CandidateFile::new("en-bd", ENGLISH_DISC, "en").with_downloads(800), common::ENGLISH_SRT)
        .with_file(CandidateFile::new("fr-bd", FRENCH_DISC, "fr").with_downloads(300), common::FRENCH_SRT)
}

#[tokio::test]
async fn test_fetch_dual_shouldPairFilesFromTheSameRelease() -> Result<()> {
    common::init_logger();
    let provider = movie_catalog();
    let controller = controller_with(common::test_config(), &provider, &MockTranslator::working());

    let dual = controller.fetch_dual("tt0133093", None).await?;

    assert_eq!(dual.origin, DualOrigin::Fetched);
    assert_eq!(dual.primary_file.as_deref(), Some(ENGLISH_DISC));
    assert_eq!(dual.secondary_file.as_deref(), Some(FRENCH_DISC));
    assert!(dual.content.contains("Hello there.\n<i>Bonjour.</i>"));
    assert!(!dual.content.contains("(TV)"));
    assert_eq!(provider.search_count(), 2);
    assert_eq!(provider.download_count(), 2);
    Ok(())
}

#[tokio::test]
async fn test_fetch_dual_calledTwice_shouldServeSecondFromCache() -> Result<()> {
    let provider = movie_catalog();
    let controller = controller_with(common::test_config(), &provider, &MockTranslator::working());

    let first = controller.fetch_dual("tt0133093", None).await?;
    let second = controller.fetch_dual("tt0133093", None).await?;

    assert_eq!(second.origin, DualOrigin::Cached);
    assert_eq!(second.content, first.content);
    assert_eq!(provider.search_count(), 2);
    assert_eq!(provider.download_count(), 2);
    Ok(())
}

#[tokio::test]
async fn test_fetch_dual_withDifferentOffset_shouldMissCache() -> Result<()> {
    let provider = movie_catalog();
    let cache = Arc::new(MemoryCache::new(true));
    let translator = Arc::new(MockTranslator::working());

    let plain = Controller::with_services(common::test_config(), Arc::new(provider.clone()), translator.clone(), cache.clone());
    plain.fetch_dual("tt0133093", None).await?;

    let mut shifted_config = common::test_config();
    shifted_config.merge.offset_ms = 300;
    let shifted = Controller::with_services(shifted_config, Arc::new(provider.clone()), translator, cache.clone());
    let dual = shifted.fetch_dual("tt0133093", None).await?;

    assert_eq!(dual.origin, DualOrigin::Fetched);
    assert_eq!(cache.len(), 2);
    Ok(())
}

#[tokio::test]
async fn test_fetch_dual_withNoPrimaryCandidates_shouldFail() {
    let provider = MockSubtitleProvider::working()
        .with_file(CandidateFile::new("fr-bd", FRENCH_DISC, "fr"), common::FRENCH_SRT);
    let controller = controller_with(common::test_config(), &provider, &MockTranslator::working());

    let result = controller.fetch_dual("tt0133093", None).await;

    assert!(matches!(result, Err(MergeError::NoCandidates { language }) if language == "en"));
    assert_eq!(provider.download_count(), 0);
}

#[tokio::test]
async fn test_fetch_dual_withNoSecondaryAndNoTranslation_shouldFail() {
    let provider = MockSubtitleProvider::working()
        .with_file(CandidateFile::new("en-bd", ENGLISH_DISC, "en"), common::ENGLISH_SRT);
    let translator = MockTranslator::working();
    let controller = controller_with(common::test_config(), &provider, &translator);

    let result = controller.fetch_dual("tt0133093", None).await;

    assert!(matches!(result, Err(MergeError::NoCandidates { language }) if language == "fr"));
    assert_eq!(translator.request_count(), 0);
}

#[tokio::test]
async fn test_fetch_dual_withNoSecondary_shouldFallBackToTranslation() -> Result<()> {
    let provider = MockSubtitleProvider::working()
        .with_file(CandidateFile::new("en-bd", ENGLISH_DISC, "en"), common::ENGLISH_SRT);
    let translator = MockTranslator::working();
    let mut config = common::test_config();
    config.translation.enabled = true;
    let controller = controller_with(config, &provider, &translator);

    let dual = controller.fetch_dual("tt0133093", None).await?;

    assert_eq!(dual.origin, DualOrigin::Translated);
    assert_eq!(dual.primary_file.as_deref(), Some(ENGLISH_DISC));
    assert_eq!(dual.secondary_file, None);
    assert!(dual.content.starts_with("1\n00:00:01,000 --> 00:00:04,000\nHello there.\n<i>[fr] Hello there.</i>\n\n"));
    assert!(dual.content.contains("How are you?\n<i>[fr] How are you?</i>"));
    assert_eq!(translator.request_count(), 1);
    Ok(())
}

#[tokio::test]
async fn test_fetch_dual_withEmptyDownload_shouldFail() {
    let provider = MockSubtitleProvider::working()
        .with_file(CandidateFile::new("en-bd", ENGLISH_DISC, "en"), "   \n")
        .with_file(CandidateFile::new("fr-bd", FRENCH_DISC, "fr"), common::FRENCH_SRT);
    let controller = controller_with(common::test_config(), &provider, &MockTranslator::working());

    let result = controller.fetch_dual("tt0133093", None).await;

    assert!(matches!(result, Err(MergeError::EmptyDownload { file_name }) if file_name == ENGLISH_DISC));
}

#[tokio::test]
async fn test_fetch_dual_withGarbageDownload_shouldReportNoCues() {
    let provider = MockSubtitleProvider::working()
        .with_file(CandidateFile::new("en-bd", ENGLISH_DISC, "en"), common::ENGLISH_SRT)
        .with_file(CandidateFile::new("fr-bd", FRENCH_DISC, "fr"), "<html>quota page</html>");
    let controller = controller_with(common::test_config(), &provider, &MockTranslator::working());

    let result = controller.fetch_dual("tt0133093", None).await;

    assert!(matches!(result, Err(MergeError::NoCues { language }) if language == "fr"));
}

#[tokio::test]
async fn test_fetch_dual_withFailingProvider_shouldPropagateProviderError() {
    let controller = controller_with(common::test_config(), &MockSubtitleProvider::failing(), &MockTranslator::working());
    let result = controller.fetch_dual("tt0133093", None).await;
    assert!(matches!(result, Err(MergeError::Provider(ProviderError::ApiError { status_code: 500, .. }))));

    let throttled = controller_with(common::test_config(), &MockSubtitleProvider::rate_limited(), &MockTranslator::working());
    let result = throttled.fetch_dual("tt0133093", None).await;
    assert!(matches!(result, Err(MergeError::Provider(e)) if e.is_rate_limited()));
}

#[tokio::test]
async fn test_fetch_dual_failure_shouldNotBeCached() {
    let provider = MockSubtitleProvider::working();
    let controller = controller_with(common::test_config(), &provider, &MockTranslator::working());

    assert!(controller.fetch_dual("tt0133093", None).await.is_err());
    assert!(controller.fetch_dual("tt0133093", None).await.is_err());

    assert_eq!(provider.search_count(), 4);
}

#[tokio::test]
async fn test_fetch_dual_forEpisode_shouldIgnoreOtherEpisodes() -> Result<()> {
    let provider = MockSubtitleProvider::working()
        .with_file(
            CandidateFile::new("en-e3", "Show.S01E03.720p.WEB-DL.srt", "en").with_downloads(90_000),
            ENGLISH_TV_SRT,
        )
        .with_file(CandidateFile::new("en-e2", "Show.S01E02.720p.WEB-DL.srt", "en"), common::ENGLISH_SRT)
        .with_file(CandidateFile::new("fr-e2", "Show.S01E02.720p.WEB-DL.srt", "fr"), common::FRENCH_SRT);
    let controller = controller_with(common::test_config(), &provider, &MockTranslator::working());

    let dual = controller
        .fetch_dual("tt0944947", Some(EpisodeInfo { season: 1, episode: 2 }))
        .await?;

    assert_eq!(dual.primary_file.as_deref(), Some("Show.S01E02.720p.WEB-DL.srt"));
    assert!(!dual.content.contains("(TV)"));
    Ok(())
}

#[tokio::test]
async fn test_fetch_best_single_shouldPreferTrustedUploader() -> Result<()> {
    let provider = MockSubtitleProvider::working()
        .with_file(CandidateFile::new("pop", "Movie.srt", "en").with_downloads(100_000), ENGLISH_TV_SRT)
        .with_file(
            CandidateFile::new("trusted", "Movie.srt", "en").with_uploader(UploaderTier::Trusted),
            common::ENGLISH_SRT,
        );
    let controller = controller_with(common::test_config(), &provider, &MockTranslator::working());

    let text = controller.fetch_best_single("tt0133093", "en", None).await?;
    assert_eq!(text, common::ENGLISH_SRT);

    let missing = controller.fetch_best_single("tt0133093", "de", None).await;
    assert!(matches!(missing, Err(MergeError::NoCandidates { language }) if language == "de"));
    Ok(())
}

#[tokio::test]
async fn test_translate_text_shouldStackTranslationAndReportProgress() -> Result<()> {
    let translator = MockTranslator::working();
    let mut config = common::test_config();
    config.translation.batch_size = 2;
    let controller = controller_with(config, &MockSubtitleProvider::working(), &translator);
    let seen = std::sync::Mutex::new(Vec::new());

    let merged = controller
        .translate_text(common::ENGLISH_SRT, |done, total| seen.lock().unwrap().push((done, total)))
        .await?;

    assert!(merged.contains("Fine, thanks.\n<i>[fr] Fine, thanks.</i>"));
    assert_eq!(seen.into_inner().unwrap(), vec![(1, 2), (2, 2)]);
    assert_eq!(translator.request_count(), 2);
    Ok(())
}

#[tokio::test]
async fn test_translate_text_withOverlappingAndShortCues_shouldPairByPosition() -> Result<()> {
    let controller = controller_with(common::test_config(), &MockSubtitleProvider::working(), &MockTranslator::working());
    let primary = "1\n00:00:00,000 --> 00:00:05,000\nAlpha\n\n\
                   2\n00:00:01,000 --> 00:00:02,000\nBravo\n\n\
                   3\n00:00:06,000 --> 00:00:06,040\nCharlie\n";

    let merged = CueSequence::parse(&controller.translate_text(primary, |_, _| {}).await?);

    let spans: Vec<(u64, u64, String)> = merged.iter().map(|c| (c.start_ms, c.end_ms, c.text())).collect();
    assert_eq!(
        spans,
        vec![
            (0, 1000, "Alpha\n<i>[fr] Alpha</i>".to_string()),
            (1000, 2000, "Bravo\n<i>[fr] Bravo</i>".to_string()),
            (6000, 6040, "Charlie\n<i>[fr] Charlie</i>".to_string()),
        ]
    );
    for pair in merged.cues.windows(2) {
        assert!(pair[0].end_ms <= pair[1].start_ms);
    }
    Ok(())
}

#[tokio::test]
async fn test_fetch_to_file_shouldNameOutputAfterTitleAndEpisode() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let provider = MockSubtitleProvider::working()
        .with_file(CandidateFile::new("en", "Show.S01E02.srt", "en"), common::ENGLISH_SRT)
        .with_file(CandidateFile::new("fr", "Show.S01E02.srt", "fr"), common::FRENCH_SRT);
    let controller = controller_with(common::test_config(), &provider, &MockTranslator::working());

    let path = controller
        .fetch_to_file("tt0944947", Some(EpisodeInfo { season: 1, episode: 2 }), temp_dir.path(), false)
        .await?;

    assert_eq!(path, temp_dir.path().join("tt0944947.S01E02.en-fr.srt"));
    assert!(std::fs::read_to_string(&path)?.contains("<i>Bien, merci.</i>"));

    // Existing output is kept unless forced
    assert!(controller
        .fetch_to_file("tt0944947", Some(EpisodeInfo { season: 1, episode: 2 }), temp_dir.path(), false)
        .await
        .is_err());
    Ok(())
}
