/*!
 * Dual-track merge engine.
 *
 * Two stages joined by [`MergedCue`]:
 *
 * - `aligner`: pairs cues of the two tracks (master-anchored or interval-union)
 * - `formatter`: turns each pair into the final cue text under a [`FormatPolicy`]
 *
 * [`MergeEngine`] runs both stages plus the optional overlap clamp and returns a
 * cue sequence ready for serialization.
 */

pub mod aligner;
pub mod formatter;
mod union;

pub use self::aligner::{clamp_overlaps, Aligner, BackboneMode, CueOrigin, MergedCue, DEFAULT_GUARD_MS};
pub use self::formatter::{clean_lines, wrap_text, FormatPolicy, Layout, SecondaryStyle, TextFormatter};

use crate::errors::MergeError;
use crate::subtitle_codec::{Cue, CueSequence};

/// Render merged cues through the formatter, dropping any that end up empty
pub fn render(merged: &[MergedCue], formatter: &TextFormatter) -> CueSequence {
    let cues = merged
        .iter()
        .filter_map(|cue| {
            let lines = formatter.format_lines(&cue.primary_text, &cue.secondary_text);
            (!lines.is_empty()).then(|| Cue::new(0, cue.start_ms, cue.end_ms, lines))
        })
        .enumerate()
        .map(|(idx, mut cue)| {
            cue.ordinal = idx + 1;
            cue
        })
        .collect();

    CueSequence::new(cues)
}

/// Aligner, overlap clamp and formatter in one pipeline
#[derive(Debug, Clone)]
pub struct MergeEngine {
    aligner: Aligner,
    formatter: TextFormatter,
    clamp: bool,
}

impl MergeEngine {
    pub fn new(aligner: Aligner, policy: FormatPolicy, clamp: bool) -> Self {
        Self {
            aligner,
            formatter: TextFormatter::new(policy),
            clamp,
        }
    }

    pub fn aligner(&self) -> &Aligner {
        &self.aligner
    }

    pub fn formatter(&self) -> &TextFormatter {
        &self.formatter
    }

    /// Same engine with a different presentation layout
    pub fn with_layout(&self, layout: Layout) -> Self {
        let mut policy = self.formatter.policy().clone();
        policy.layout = layout;
        Self {
            aligner: self.aligner,
            formatter: TextFormatter::new(policy),
            clamp: self.clamp,
        }
    }

    /// Merge `secondary` onto `primary`, shifting `secondary` by `offset_ms` first
    pub fn merge(&self, primary: &CueSequence, secondary: &CueSequence, offset_ms: i64) -> Result<CueSequence, MergeError> {
        let mut merged = self.aligner.try_align(primary, secondary, offset_ms)?;
        if self.clamp {
            clamp_overlaps(&mut merged);
        }
        Ok(render(&merged, &self.formatter))
    }
}

impl Default for MergeEngine {
    fn default() -> Self {
        Self::new(Aligner::default(), FormatPolicy::default(), true)
    }
}
