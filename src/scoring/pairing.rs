/*!
 * Pairwise compatibility between two candidate files.
 *
 * Two subtitles line up well only when they were timed against the same cut, so
 * the score rewards filenames that describe the same release and punishes a
 * source-family clash (e.g. HDTV capture against a Blu-ray rip).
 */

use std::cmp::Ordering;

use log::debug;

use super::candidate::CandidateFile;
use super::release::{token_similarity, ReleaseInfo};

/// Only this many top-ranked candidates per side are paired
pub const DEFAULT_TOP_N: usize = 10;

const SAME_SOURCE_BONUS: f64 = 0.25;
const SAME_FAMILY_BONUS: f64 = 0.10;
const SAME_RESOLUTION_BONUS: f64 = 0.15;
const SAME_GROUP_BONUS: f64 = 0.15;
const HARD_MISMATCH_PENALTY: f64 = 1.0;

/// Symmetric compatibility score of two filenames
pub fn filename_score(a: &str, b: &str) -> f64 {
    let left = ReleaseInfo::parse(a);
    let right = ReleaseInfo::parse(b);
    let mut score = token_similarity(a, b);

    if left.hard_mismatch(&right) {
        score -= HARD_MISMATCH_PENALTY;
    } else if let (Some(x), Some(y)) = (left.source, right.source) {
        score += if x == y { SAME_SOURCE_BONUS } else { SAME_FAMILY_BONUS };
    }

    if left.resolution.is_some() && left.resolution == right.resolution {
        score += SAME_RESOLUTION_BONUS;
    }

    if left.release_group.is_some() && left.release_group == right.release_group {
        score += SAME_GROUP_BONUS;
    }

    score
}

/// Symmetric compatibility score of two candidates
pub fn pair_score(a: &CandidateFile, b: &CandidateFile) -> f64 {
    filename_score(&a.file_name, &b.file_name)
}

/// One evaluated pair, by rank position in each list
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredPair {
    pub first_rank: usize,
    pub second_rank: usize,
    pub score: f64,
}

impl ScoredPair {
    /// Best first: higher score, then the pair ranked higher in its own lists
    fn precedence(&self, other: &ScoredPair) -> Ordering {
        other
            .score
            .total_cmp(&self.score)
            .then_with(|| (self.first_rank + self.second_rank).cmp(&(other.first_rank + other.second_rank)))
            .then_with(|| self.first_rank.cmp(&other.first_rank))
    }
}

/// Winning pair plus diagnostics
#[derive(Debug, Clone)]
pub struct PairSelection<'a> {
    pub first: &'a CandidateFile,
    pub second: &'a CandidateFile,
    pub score: f64,
    /// Next best pairs, best first
    pub runners_up: Vec<ScoredPair>,
}

/// Pick the most compatible pair from two ranked lists, looking at the top `top_n` of each
pub fn select_best_pair<'a>(
    first: &'a [CandidateFile],
    second: &'a [CandidateFile],
    top_n: usize,
) -> Option<PairSelection<'a>> {
    let top_n = top_n.max(1);
    let mut pairs: Vec<ScoredPair> = Vec::new();

    for (i, a) in first.iter().take(top_n).enumerate() {
        for (j, b) in second.iter().take(top_n).enumerate() {
            pairs.push(ScoredPair {
                first_rank: i,
                second_rank: j,
                score: pair_score(a, b),
            });
        }
    }

    pairs.sort_by(ScoredPair::precedence);

    let mut iter = pairs.into_iter();
    let best = iter.next()?;
    let runners_up: Vec<ScoredPair> = iter.take(3).collect();

    let selection = PairSelection {
        first: &first[best.first_rank],
        second: &second[best.second_rank],
        score: best.score,
        runners_up,
    };

    debug!(
        "Best pair '{}' + '{}' scored {:.3}",
        selection.first.file_name, selection.second.file_name, selection.score
    );
    for runner in &selection.runners_up {
        debug!(
            "  runner-up '{}' + '{}' scored {:.3}",
            first[runner.first_rank].file_name, second[runner.second_rank].file_name, runner.score
        );
    }

    Some(selection)
}
