/*!
 * Interval-union backbone.
 *
 * Every start and end of both tracks is a boundary. Each span between two
 * consecutive boundaries becomes a candidate segment carrying the text of the cues
 * active at its midpoint. Adjacent segments with identical text are coalesced so
 * the output does not flicker.
 */

use crate::subtitle_codec::Cue;

use super::aligner::{CueOrigin, MergedCue};
use super::formatter::has_content;

fn active_text(cues: &[&Cue], instant: u64) -> String {
    cues.iter()
        .filter(|cue| cue.start_ms <= instant && instant < cue.end_ms)
        .map(|cue| cue.text())
        .filter(|text| has_content(text))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Segment both tracks on their combined boundaries; inputs are start-sorted
pub(crate) fn align_interval_union(master: &[&Cue], secondary: &[Cue]) -> Vec<MergedCue> {
    let secondary: Vec<&Cue> = secondary.iter().collect();

    let mut boundaries: Vec<u64> = master
        .iter()
        .chain(secondary.iter())
        .flat_map(|cue| [cue.start_ms, cue.end_ms])
        .collect();
    boundaries.sort_unstable();
    boundaries.dedup();

    let mut segments: Vec<MergedCue> = Vec::new();
    for window in boundaries.windows(2) {
        let (start, end) = (window[0], window[1]);
        let midpoint = start + (end - start) / 2;

        let primary_text = active_text(master, midpoint);
        let secondary_text = active_text(&secondary, midpoint);
        if primary_text.is_empty() && secondary_text.is_empty() {
            continue;
        }

        if let Some(last) = segments.last_mut() {
            if last.end_ms == start && last.primary_text == primary_text && last.secondary_text == secondary_text {
                last.end_ms = end;
                continue;
            }
        }

        segments.push(MergedCue::new(start, end, primary_text, secondary_text, CueOrigin::Segment));
    }

    segments
}
