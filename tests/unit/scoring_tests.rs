/*!
 * Tests for candidate ranking and pair selection
 */

use chrono::{Duration, Utc};
use dualsub::scoring::release::detect_episode;
use dualsub::scoring::{
    best_single, filter_for_episode, pair_score, rank_candidates, select_best_pair, CandidateFile, EpisodeInfo,
    ReleaseInfo, SourceFamily, SourceType, UploaderTier,
};

fn candidate(id: &str, file_name: &str, language: &str) -> CandidateFile {
    CandidateFile::new(id, file_name, language)
}

#[test]
fn test_select_best_pair_withMixedReleases_shouldPreferSameCut() {
    let english = vec![
        candidate("en-tv", "Movie.2019.720p.HDTV.x264-LOL.srt", "en"),
        candidate("en-bd", "Movie.2019.1080p.BluRay.x264-SPARKS.srt", "en"),
    ];
    let french = vec![
        candidate("fr-bd", "Movie.2019.1080p.BluRay.x264-SPARKS.FRENCH.srt", "fr"),
        candidate("fr-web", "Movie.2019.720p.WEB-DL.DD5.1.srt", "fr"),
    ];

    let selection = select_best_pair(&english, &french, 10).unwrap();

    assert_eq!(selection.first.id, "en-bd");
    assert_eq!(selection.second.id, "fr-bd");
    assert!(selection.score > 1.0);
    assert_eq!(selection.runners_up.len(), 3);
    assert!(selection.runners_up.iter().all(|r| r.score <= selection.score));
}

#[test]
fn test_pair_score_withFamilyClash_shouldBeNegative() {
    let disc = candidate("a", "Movie.2019.1080p.BluRay.x264.srt", "en");
    let broadcast = candidate("b", "Movie.2019.1080p.HDTV.x264.srt", "fr");

    let score = pair_score(&disc, &broadcast);

    assert!(score < 0.0, "family clash should outweigh shared tokens, got {}", score);
    assert_eq!(score, pair_score(&broadcast, &disc));
}

#[test]
fn test_pair_score_withSameFamilyDifferentSource_shouldGetSmallerBonus() {
    let bluray = candidate("a", "Movie.BluRay.srt", "en");
    let bluray_too = candidate("b", "Movie.BluRay.srt", "fr");
    let dvd = candidate("c", "Movie.DVDRip.srt", "fr");

    assert!(pair_score(&bluray, &bluray_too) > pair_score(&bluray, &dvd));
    assert!(pair_score(&bluray, &dvd) > 0.0);
}

#[test]
fn test_select_best_pair_withEqualScores_shouldPreferHigherRanks() {
    let english = vec![candidate("en1", "Title.srt", "en"), candidate("en2", "Title.srt", "en")];
    let french = vec![candidate("fr1", "Title.srt", "fr"), candidate("fr2", "Title.srt", "fr")];

    let selection = select_best_pair(&english, &french, 10).unwrap();

    assert_eq!(selection.first.id, "en1");
    assert_eq!(selection.second.id, "fr1");
    // Next come the pairs one rank away, first-list rank breaking the remaining tie
    assert_eq!(
        (selection.runners_up[0].first_rank, selection.runners_up[0].second_rank),
        (0, 1)
    );
    assert_eq!(
        (selection.runners_up[1].first_rank, selection.runners_up[1].second_rank),
        (1, 0)
    );
}

#[test]
fn test_select_best_pair_withTopN_shouldIgnoreLowerRanked() {
    let english = vec![candidate("en1", "Show.HDTV.srt", "en")];
    let french = vec![
        candidate("fr1", "Show.BluRay.srt", "fr"),
        candidate("fr2", "Show.HDTV.srt", "fr"),
    ];

    let narrow = select_best_pair(&english, &french, 1).unwrap();
    assert_eq!(narrow.second.id, "fr1");
    assert!(narrow.runners_up.is_empty());

    let wide = select_best_pair(&english, &french, 10).unwrap();
    assert_eq!(wide.second.id, "fr2");
}

#[test]
fn test_select_best_pair_withEmptySide_shouldReturnNone() {
    let english = vec![candidate("en1", "Title.srt", "en")];
    assert!(select_best_pair(&english, &[], 10).is_none());
    assert!(select_best_pair(&[], &english, 10).is_none());
}

#[test]
fn test_rank_candidates_shouldPutTrustAheadOfPopularity() {
    let now = Utc::now();
    let files = vec![
        candidate("popular", "Movie.srt", "en").with_downloads(100_000),
        candidate("trusted", "Movie.srt", "en")
            .with_downloads(10)
            .with_uploader(UploaderTier::Trusted),
    ];

    let ranked = rank_candidates(files, now);

    assert_eq!(ranked[0].0.id, "trusted");
    assert!(ranked[0].1 > ranked[1].1);
}

#[test]
fn test_rank_candidates_shouldRewardRecentUploads() {
    let now = Utc::now();
    let files = vec![
        candidate("old", "Movie.srt", "en").uploaded(now - Duration::days(400)),
        candidate("new", "Movie.srt", "en").uploaded(now - Duration::days(2)),
    ];

    let ranked = rank_candidates(files, now);

    assert_eq!(ranked[0].0.id, "new");
}

#[test]
fn test_rank_candidates_withEqualScores_shouldKeepProviderOrder() {
    let now = Utc::now();
    let files = vec![
        candidate("first", "Movie.srt", "en"),
        candidate("second", "Movie.srt", "en"),
        candidate("third", "Movie.srt", "en"),
    ];

    let ids: Vec<String> = rank_candidates(files, now).into_iter().map(|(f, _)| f.id).collect();

    assert_eq!(ids, vec!["first", "second", "third"]);
}

#[test]
fn test_best_single_shouldReturnTopRanked() {
    let now = Utc::now();
    let files = vec![
        candidate("meh", "Movie.srt", "en").with_rating(2.0),
        candidate("good", "Movie.1080p.x264.srt", "en").with_rating(9.0),
    ];

    assert_eq!(best_single(files, now).map(|f| f.id), Some("good".to_string()));
    assert!(best_single(Vec::new(), now).is_none());
}

#[test]
fn test_filter_for_episode_shouldDropContradictingFiles() {
    let files = vec![
        candidate("right", "Show.S01E02.720p.srt", "en"),
        candidate("wrong", "Show.S01E03.720p.srt", "en"),
        candidate("unknown", "Show.Complete.srt", "en"),
        candidate("reported", "whatever.srt", "en").for_episode(1, 2),
    ];

    let kept: Vec<String> = filter_for_episode(files.clone(), Some(EpisodeInfo { season: 1, episode: 2 }))
        .into_iter()
        .map(|f| f.id)
        .collect();

    assert_eq!(kept, vec!["right", "unknown", "reported"]);
    assert_eq!(filter_for_episode(files, None).len(), 4);
}

#[test]
fn test_detect_episode_shouldReadCommonPatterns() {
    assert_eq!(detect_episode("Show.S01E02.srt"), Some(EpisodeInfo { season: 1, episode: 2 }));
    assert_eq!(detect_episode("show s10e100.srt"), Some(EpisodeInfo { season: 10, episode: 100 }));
    assert_eq!(detect_episode("Show.2x05.srt"), Some(EpisodeInfo { season: 2, episode: 5 }));
    assert_eq!(detect_episode("Movie.1080p.srt"), None);
}

#[test]
fn test_uploader_tier_from_rank_shouldMapLabels() {
    assert_eq!(UploaderTier::from_rank("Administrator"), UploaderTier::Verified);
    assert_eq!(UploaderTier::from_rank("trusted"), UploaderTier::Trusted);
    assert_eq!(UploaderTier::from_rank("bronze member"), UploaderTier::Registered);
    assert_eq!(UploaderTier::from_rank(""), UploaderTier::Anonymous);
    assert!(UploaderTier::Verified.is_trusted());
    assert!(!UploaderTier::Registered.is_trusted());
}

#[test]
fn test_release_info_shouldClassifySourceFamilies() {
    let web = ReleaseInfo::parse("Show.S01E01.WEBRip.x265-GRP.srt");
    let remux = ReleaseInfo::parse("Movie.2160p.REMUX.srt");

    assert_eq!(web.source, Some(SourceType::WebRip));
    assert_eq!(web.source.map(SourceType::family), Some(SourceFamily::Web));
    assert_eq!(remux.source.map(SourceType::family), Some(SourceFamily::Disc));
    assert!(web.hard_mismatch(&remux));
    assert!(!web.hard_mismatch(&ReleaseInfo::default()));
}
