/*!
 * Cue alignment between two independently timed tracks.
 *
 * The master track is the timing backbone. Each master cue collects the
 * secondary cues that overlap it by more than the guard band; a collected cue is
 * consumed and never offered again. Whatever is left afterwards is emitted as
 * orphan cues with its own timing.
 */

use log::debug;
use serde::{Deserialize, Serialize};

use crate::errors::{MergeError, Track};
use crate::subtitle_codec::{Cue, CueSequence};

use super::formatter::has_content;
use super::union::align_interval_union;

/// Guard band in milliseconds.
///
/// Two cues must overlap by more than this on both edges to pair up, so
/// back-to-back lines that merely touch never match.
pub const DEFAULT_GUARD_MS: u64 = 50;

/// Which backbone the aligner runs; one mode per call, never mixed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BackboneMode {
    /// Master cue timing, secondary text attached, orphans kept
    #[default]
    MasterAnchored,
    /// Sub-intervals between every boundary of both tracks
    IntervalUnion,
}

/// Where a merged cue's timing came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CueOrigin {
    /// Master cue timing
    Anchored,
    /// Unmatched secondary cue timing
    Orphan,
    /// Interval-union sub-interval
    Segment,
}

/// One row of the merged stream, before presentation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedCue {
    pub ordinal: usize,
    pub start_ms: u64,
    pub end_ms: u64,
    pub primary_text: String,
    pub secondary_text: String,
    pub origin: CueOrigin,
}

impl MergedCue {
    pub fn new(start_ms: u64, end_ms: u64, primary_text: String, secondary_text: String, origin: CueOrigin) -> Self {
        Self {
            ordinal: 0,
            start_ms,
            end_ms,
            primary_text,
            secondary_text,
            origin,
        }
    }

    pub fn is_orphan(&self) -> bool {
        self.origin == CueOrigin::Orphan
    }
}

/// Overlap rule with the guard band, written without subtraction so it cannot underflow
pub fn overlaps(master: &Cue, secondary: &Cue, guard_ms: u64) -> bool {
    master.start_ms + guard_ms < secondary.end_ms && master.end_ms > secondary.start_ms + guard_ms
}

/// Stateless aligner; configuration only
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Aligner {
    pub guard_ms: u64,
    pub mode: BackboneMode,
}

impl Default for Aligner {
    fn default() -> Self {
        Self {
            guard_ms: DEFAULT_GUARD_MS,
            mode: BackboneMode::default(),
        }
    }
}

impl Aligner {
    pub fn new(guard_ms: u64, mode: BackboneMode) -> Self {
        Self { guard_ms, mode }
    }

    /// Merge two tracks; an empty side gives an empty result
    pub fn align(&self, master: &CueSequence, secondary: &CueSequence, offset_ms: i64) -> Vec<MergedCue> {
        self.try_align(master, secondary, offset_ms).unwrap_or_default()
    }

    /// Merge two tracks, reporting which side made the merge impossible
    pub fn try_align(
        &self,
        master: &CueSequence,
        secondary: &CueSequence,
        offset_ms: i64,
    ) -> Result<Vec<MergedCue>, MergeError> {
        if master.is_empty() {
            return Err(MergeError::Degenerate { side: Track::Primary });
        }

        let mut shifted = secondary.shifted(offset_ms).cues;
        if shifted.is_empty() {
            return Err(MergeError::Degenerate { side: Track::Secondary });
        }
        shifted.sort_by_key(|cue| (cue.start_ms, cue.end_ms));

        let mut master_cues: Vec<&Cue> = master.iter().collect();
        master_cues.sort_by_key(|cue| cue.start_ms);

        let mut merged = match self.mode {
            BackboneMode::MasterAnchored => self.anchor_on_master(&master_cues, &shifted),
            BackboneMode::IntervalUnion => align_interval_union(&master_cues, &shifted),
        };

        merged.sort_by_key(|cue| (cue.start_ms, cue.origin));
        for (idx, cue) in merged.iter_mut().enumerate() {
            cue.ordinal = idx + 1;
        }

        Ok(merged)
    }

    fn anchor_on_master(&self, master: &[&Cue], secondary: &[Cue]) -> Vec<MergedCue> {
        let mut consumed = vec![false; secondary.len()];
        let mut merged = Vec::with_capacity(master.len() + secondary.len() / 4);
        // Everything before this index is consumed
        let mut first_open = 0usize;
        let mut dropped_masters = 0usize;

        for master_cue in master {
            let primary_text = master_cue.text();
            if !has_content(&primary_text) {
                dropped_masters += 1;
                continue;
            }

            while first_open < secondary.len() && consumed[first_open] {
                first_open += 1;
            }

            let mut matched: Vec<String> = Vec::new();
            for (idx, candidate) in secondary.iter().enumerate().skip(first_open) {
                // Sorted by start: nothing further on can satisfy the end condition
                if candidate.start_ms + self.guard_ms >= master_cue.end_ms {
                    break;
                }
                if consumed[idx] || !overlaps(master_cue, candidate, self.guard_ms) {
                    continue;
                }
                consumed[idx] = true;
                matched.push(candidate.text());
            }

            merged.push(MergedCue::new(
                master_cue.start_ms,
                master_cue.end_ms,
                primary_text,
                matched.join("\n"),
                CueOrigin::Anchored,
            ));
        }

        let mut orphans = 0usize;
        for (cue, _) in secondary.iter().zip(&consumed).filter(|(_, used)| !**used) {
            let text = cue.text();
            if !has_content(&text) {
                continue;
            }
            orphans += 1;
            merged.push(MergedCue::new(cue.start_ms, cue.end_ms, String::new(), text, CueOrigin::Orphan));
        }

        debug!(
            "Aligned {} master cue(s) against {} secondary cue(s): {} orphan(s), {} empty master cue(s) dropped",
            master.len(),
            secondary.len(),
            orphans,
            dropped_masters
        );

        merged
    }
}

/// Make a start-sorted stream non-overlapping by clamping earlier ends.
///
/// A cue sharing its start with the previous one is folded into it, since clamping
/// would leave a zero-length cue. Ordinals are renumbered afterwards.
pub fn clamp_overlaps(cues: &mut Vec<MergedCue>) {
    let mut folded: Vec<MergedCue> = Vec::with_capacity(cues.len());
    for cue in cues.drain(..) {
        match folded.last_mut() {
            Some(previous) if cue.start_ms == previous.start_ms => {
                previous.end_ms = previous.end_ms.max(cue.end_ms);
                join_text(&mut previous.primary_text, &cue.primary_text);
                join_text(&mut previous.secondary_text, &cue.secondary_text);
                if previous.origin == CueOrigin::Orphan {
                    previous.origin = cue.origin;
                }
            }
            Some(previous) => {
                if cue.start_ms < previous.end_ms {
                    previous.end_ms = cue.start_ms;
                }
                folded.push(cue);
            }
            None => folded.push(cue),
        }
    }

    for (idx, cue) in folded.iter_mut().enumerate() {
        cue.ordinal = idx + 1;
    }
    *cues = folded;
}

fn join_text(target: &mut String, extra: &str) {
    if extra.trim().is_empty() {
        return;
    }
    if !target.trim().is_empty() {
        target.push('\n');
    }
    target.push_str(extra);
}
