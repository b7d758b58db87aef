use std::fmt;
use regex::Regex;
use once_cell::sync::Lazy;
use log::{debug, warn};

use crate::errors::SubtitleError;

// @module: SRT cue model and codec

// @const: SRT timing line, the trailing part (positional coordinates) is ignored
static TIMING_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{1,3}):(\d{2}):(\d{2})[,.](\d{3})\s*-->\s*(\d{1,3}):(\d{2}):(\d{2})[,.](\d{3})").unwrap()
});

// @struct: Single subtitle cue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cue {
    // @field: 1-based position in its sequence
    pub ordinal: usize,

    // @field: Start time in ms
    pub start_ms: u64,

    // @field: End time in ms
    pub end_ms: u64,

    // @field: Text lines, markup untouched
    pub lines: Vec<String>,
}

impl Cue {
    /// Creates a cue from already split lines
    pub fn new(ordinal: usize, start_ms: u64, end_ms: u64, lines: Vec<String>) -> Self {
        Cue {
            ordinal,
            start_ms,
            end_ms,
            lines,
        }
    }

    /// Creates a cue from a newline-delimited text body
    pub fn from_text(ordinal: usize, start_ms: u64, end_ms: u64, text: &str) -> Self {
        Self::new(ordinal, start_ms, end_ms, text.lines().map(str::to_string).collect())
    }

    /// Text body with lines joined by newlines
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    /// Parse an SRT timestamp (`HH:MM:SS,mmm`, `.` accepted for the millisecond separator)
    pub fn parse_timestamp(timestamp: &str) -> Result<u64, SubtitleError> {
        let parts: Vec<&str> = timestamp.trim().split(&[':', ',', '.'][..]).collect();
        if parts.len() != 4 {
            return Err(SubtitleError::InvalidTimestamp(timestamp.to_string()));
        }

        let mut values = [0u64; 4];
        for (slot, part) in values.iter_mut().zip(&parts) {
            *slot = part.parse()
                .map_err(|_| SubtitleError::InvalidTimestamp(timestamp.to_string()))?;
        }

        to_millis(values[0], values[1], values[2], values[3])
            .ok_or_else(|| SubtitleError::InvalidTimestamp(timestamp.to_string()))
    }

    /// Format milliseconds as an SRT timestamp (HH:MM:SS,mmm)
    pub fn format_timestamp(ms: u64) -> String {
        let hours = ms / 3_600_000;
        let minutes = (ms % 3_600_000) / 60_000;
        let seconds = (ms % 60_000) / 1_000;
        let millis = ms % 1_000;

        format!("{:02}:{:02}:{:02},{:03}", hours, minutes, seconds, millis)
    }
}

impl fmt::Display for Cue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{}", self.ordinal)?;
        writeln!(
            f,
            "{} --> {}",
            Self::format_timestamp(self.start_ms),
            Self::format_timestamp(self.end_ms)
        )?;
        for line in &self.lines {
            writeln!(f, "{}", line)?;
        }
        writeln!(f)
    }
}

/// Exact integer conversion; minutes, seconds and millis must be in range
fn to_millis(hours: u64, minutes: u64, seconds: u64, millis: u64) -> Option<u64> {
    if minutes >= 60 || seconds >= 60 || millis >= 1000 {
        return None;
    }
    Some(hours * 3_600_000 + minutes * 60_000 + seconds * 1_000 + millis)
}

/// Ordered, time-sorted cues of one language track
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CueSequence {
    pub cues: Vec<Cue>,
}

impl CueSequence {
    pub fn new(cues: Vec<Cue>) -> Self {
        Self { cues }
    }

    pub fn len(&self) -> usize {
        self.cues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cues.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Cue> {
        self.cues.iter()
    }

    /// Parse SRT text into a cue sequence.
    ///
    /// Blocks are separated by blank lines. A block is kept only when it has an integer
    /// ordinal line, a timing line and at least one text line, and a positive duration.
    /// Anything else is skipped, so empty or garbage input gives an empty sequence.
    pub fn parse(content: &str) -> Self {
        let content = content.strip_prefix('\u{feff}').unwrap_or(content);

        let mut cues = Vec::new();
        let mut block: Vec<&str> = Vec::new();
        let mut skipped = 0usize;

        // `lines()` already drops the `\r` of CRLF endings
        for line in content.lines().chain(std::iter::once("")) {
            if line.trim().is_empty() {
                if !block.is_empty() {
                    match Self::parse_block(&block) {
                        Some(cue) => cues.push(cue),
                        None => skipped += 1,
                    }
                    block.clear();
                }
                continue;
            }
            block.push(line);
        }

        if skipped > 0 {
            debug!("Skipped {} malformed subtitle block(s)", skipped);
        }
        if cues.is_empty() && !content.trim().is_empty() {
            warn!("No valid subtitle cues found in content");
        }

        // Stable, so cues sharing a start keep their file order
        cues.sort_by_key(|cue: &Cue| cue.start_ms);

        Self { cues }
    }

    fn parse_block(block: &[&str]) -> Option<Cue> {
        if block.len() < 3 {
            return None;
        }

        let ordinal: usize = block[0].trim().parse().ok()?;

        let caps = TIMING_REGEX.captures(block[1].trim())?;
        let field = |idx: usize| -> Option<u64> { caps.get(idx)?.as_str().parse().ok() };
        let start_ms = to_millis(field(1)?, field(2)?, field(3)?, field(4)?)?;
        let end_ms = to_millis(field(5)?, field(6)?, field(7)?, field(8)?)?;

        if end_ms <= start_ms {
            debug!("Dropping cue {} with non-positive duration", ordinal);
            return None;
        }

        let lines = block[2..]
            .iter()
            .map(|line| line.trim_end().to_string())
            .collect();

        Some(Cue::new(ordinal, start_ms, end_ms, lines))
    }

    /// Serialize to SRT text, renumbering ordinals from 1
    pub fn serialize(&self) -> String {
        let mut out = String::new();
        for (idx, cue) in self.cues.iter().enumerate() {
            let numbered = Cue {
                ordinal: idx + 1,
                ..cue.clone()
            };
            out.push_str(&numbered.to_string());
        }
        out
    }

    /// Shift every cue by a signed offset.
    ///
    /// Starts clamp at zero; cues that end at or before zero after shifting are dropped.
    pub fn shifted(&self, offset_ms: i64) -> Self {
        if offset_ms == 0 {
            return self.clone();
        }

        let cues = self.cues.iter().filter_map(|cue| {
            let start = i64::try_from(cue.start_ms).unwrap_or(i64::MAX).saturating_add(offset_ms);
            let end = i64::try_from(cue.end_ms).unwrap_or(i64::MAX).saturating_add(offset_ms);
            if end <= 0 {
                return None;
            }
            Some(Cue {
                start_ms: start.max(0) as u64,
                end_ms: end as u64,
                ..cue.clone()
            })
        })
        .collect();

        Self { cues }
    }
}

impl fmt::Display for CueSequence {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.serialize())
    }
}

impl From<Vec<Cue>> for CueSequence {
    fn from(cues: Vec<Cue>) -> Self {
        Self::new(cues)
    }
}
