/*!
 * Per-file quality ranking.
 *
 * Trust and recency dominate: a recent upload from a trusted uploader is more
 * likely to be a corrected, well-timed release than an old popular one.
 */

use chrono::{DateTime, Utc};

use super::candidate::{CandidateFile, EpisodeInfo, UploaderTier};
use super::release::ReleaseInfo;

const VERIFIED_BONUS: f64 = 50.0;
const TRUSTED_BONUS: f64 = 40.0;
const REGISTERED_BONUS: f64 = 5.0;

/// Recent window: linearly decaying bonus from FRESH_MAX down to STALE_BONUS
const FRESH_WINDOW_DAYS: f64 = 30.0;
const FRESH_MAX_BONUS: f64 = 30.0;
/// Older window: flat bonus
const STALE_WINDOW_DAYS: f64 = 90.0;
const STALE_BONUS: f64 = 10.0;

const RATING_WEIGHT: f64 = 10.0;
const TAG_POINTS: f64 = 2.0;
const TAG_CAP: f64 = 6.0;
const POPULARITY_WEIGHT: f64 = 10.0;

fn trust_bonus(tier: UploaderTier) -> f64 {
    match tier {
        UploaderTier::Verified => VERIFIED_BONUS,
        UploaderTier::Trusted => TRUSTED_BONUS,
        UploaderTier::Registered => REGISTERED_BONUS,
        UploaderTier::Anonymous => 0.0,
    }
}

fn recency_bonus(uploaded_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> f64 {
    let Some(uploaded_at) = uploaded_at else {
        return 0.0;
    };
    // Future timestamps (clock skew) count as brand new
    let age_days = (now - uploaded_at).num_seconds().max(0) as f64 / 86_400.0;
    if age_days <= FRESH_WINDOW_DAYS {
        STALE_BONUS + (FRESH_MAX_BONUS - STALE_BONUS) * (1.0 - age_days / FRESH_WINDOW_DAYS)
    } else if age_days <= STALE_WINDOW_DAYS {
        STALE_BONUS
    } else {
        0.0
    }
}

/// Quality score of one file within its candidate set
pub fn quality_score(file: &CandidateFile, max_downloads: u64, now: DateTime<Utc>) -> f64 {
    let rating = file.rating.clamp(0.0, 10.0) / 10.0 * RATING_WEIGHT;
    let tags = (ReleaseInfo::parse(&file.file_name).hint_count() as f64 * TAG_POINTS).min(TAG_CAP);
    let popularity = if max_downloads == 0 {
        0.0
    } else {
        file.download_count as f64 / max_downloads as f64 * POPULARITY_WEIGHT
    };

    trust_bonus(file.uploader_tier) + recency_bonus(file.uploaded_at, now) + rating + tags + popularity
}

/// Candidates paired with their quality score, best first.
///
/// The sort is stable, so equally scored files keep provider order.
pub fn rank_candidates(files: Vec<CandidateFile>, now: DateTime<Utc>) -> Vec<(CandidateFile, f64)> {
    let max_downloads = files.iter().map(|f| f.download_count).max().unwrap_or(0);
    let mut scored: Vec<(CandidateFile, f64)> = files
        .into_iter()
        .map(|file| {
            let score = quality_score(&file, max_downloads, now);
            (file, score)
        })
        .collect();
    scored.sort_by(|a, b| b.1.total_cmp(&a.1));
    scored
}

/// Best single file, for when dual pairing does not apply
pub fn best_single(files: Vec<CandidateFile>, now: DateTime<Utc>) -> Option<CandidateFile> {
    rank_candidates(files, now).into_iter().next().map(|(file, _)| file)
}

/// Drop candidates whose season/episode contradicts the request.
///
/// Files with no detectable episode are kept; the provider already filtered them by title.
pub fn filter_for_episode(files: Vec<CandidateFile>, wanted: Option<EpisodeInfo>) -> Vec<CandidateFile> {
    let Some(wanted) = wanted else {
        return files;
    };
    files
        .into_iter()
        .filter(|file| file.detected_episode().is_none_or(|found| found == wanted))
        .collect()
}
