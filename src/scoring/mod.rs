/*!
 * Candidate scoring.
 *
 * - `candidate`: the file metadata returned by a provider search
 * - `release`: tags parsed from scene-style filenames
 * - `quality`: per-file ranking (trust, recency, rating, tags, popularity)
 * - `pairing`: pairwise compatibility and best-pair selection
 */

pub mod candidate;
pub mod pairing;
pub mod quality;
pub mod release;

pub use self::candidate::{CandidateFile, EpisodeInfo, UploaderTier};
pub use self::pairing::{pair_score, select_best_pair, PairSelection, ScoredPair, DEFAULT_TOP_N};
pub use self::quality::{best_single, filter_for_episode, quality_score, rank_candidates};
pub use self::release::{ReleaseInfo, Resolution, SourceFamily, SourceType};
