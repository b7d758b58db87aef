/*!
 * Text cleaning, wrapping and layout of merged cue bodies.
 *
 * The formatter is the only place where the final cue text is built. It is pure:
 * the same texts and policy always give the same string.
 *
 * Side-by-side layout pads by character count. That lines up on monospaced
 * renderers only; proportional fonts will drift, and nothing here tries to
 * compensate for it.
 */

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// HTML-like tags (`<i>`, `</font>`, `<font color="..">`)
static MARKUP_TAG_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"</?[A-Za-z][^<>]*>").unwrap());

/// ASS/SSA override blocks such as `{\an8}` or `{\i1}`
static OVERRIDE_TAG_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{\\[^}]*\}").unwrap());

static WHITESPACE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// How the two tracks share one cue body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Layout {
    /// Primary lines above secondary lines
    #[default]
    Stacked,
    /// Primary in a fixed-width left column, secondary on the right
    SideBySide,
    /// Stacked, secondary is machine-translated and always styled
    TranslationDerived,
}

/// Styling applied to secondary-track lines
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SecondaryStyle {
    Plain,
    #[default]
    Italic,
    /// `<font color="...">`, value used verbatim (e.g. `#ffff54`)
    Color(String),
}

impl SecondaryStyle {
    fn apply(&self, line: &str) -> String {
        match self {
            Self::Plain => line.to_string(),
            Self::Italic => format!("<i>{}</i>", line),
            Self::Color(color) => format!("<font color=\"{}\">{}</font>", color, line),
        }
    }
}

/// Presentation policy for merged cues
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatPolicy {
    #[serde(default)]
    pub layout: Layout,

    /// Wrap width in characters for stacked layouts
    #[serde(default = "default_max_line_width")]
    pub max_line_width: usize,

    /// Column width in characters for side-by-side
    #[serde(default = "default_column_width")]
    pub column_width: usize,

    /// Separator between side-by-side columns
    #[serde(default = "default_separator")]
    pub separator: String,

    #[serde(default)]
    pub secondary_style: SecondaryStyle,
}

fn default_max_line_width() -> usize {
    45
}

fn default_column_width() -> usize {
    32
}

fn default_separator() -> String {
    "  |  ".to_string()
}

impl Default for FormatPolicy {
    fn default() -> Self {
        Self {
            layout: Layout::default(),
            max_line_width: default_max_line_width(),
            column_width: default_column_width(),
            separator: default_separator(),
            secondary_style: SecondaryStyle::default(),
        }
    }
}

/// Strip markup, collapse whitespace and drop blank lines
pub fn clean_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(|line| {
            let line = OVERRIDE_TAG_REGEX.replace_all(line, "");
            let line = MARKUP_TAG_REGEX.replace_all(&line, "");
            WHITESPACE_REGEX.replace_all(&line, " ").trim().to_string()
        })
        .filter(|line| !line.is_empty())
        .collect()
}

/// Whether a text body has anything left once cleaned
pub fn has_content(text: &str) -> bool {
    !clean_lines(text).is_empty()
}

/// Greedy word wrap at whitespace, never splitting a word.
///
/// A word longer than `width` sits alone on its own line.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();
        if current_len == 0 {
            current.push_str(word);
            current_len = word_len;
        } else if current_len + 1 + word_len <= width {
            current.push(' ');
            current.push_str(word);
            current_len += 1 + word_len;
        } else {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
            current_len = word_len;
        }
    }

    if current_len > 0 {
        lines.push(current);
    }
    lines
}

/// Renders paired or orphan texts into one cue body
#[derive(Debug, Clone, Default)]
pub struct TextFormatter {
    policy: FormatPolicy,
}

impl TextFormatter {
    pub fn new(policy: FormatPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &FormatPolicy {
        &self.policy
    }

    /// Build the final cue text; empty when both sides clean to nothing
    pub fn format(&self, primary: &str, secondary: &str) -> String {
        self.format_lines(primary, secondary).join("\n")
    }

    /// Same as [`format`](Self::format), one entry per output line
    pub fn format_lines(&self, primary: &str, secondary: &str) -> Vec<String> {
        let primary = clean_lines(primary);
        let secondary = clean_lines(secondary);

        match self.policy.layout {
            Layout::Stacked => self.stacked(&primary, &secondary, &self.policy.secondary_style),
            Layout::TranslationDerived => {
                let style = match &self.policy.secondary_style {
                    SecondaryStyle::Plain => SecondaryStyle::Italic,
                    other => other.clone(),
                };
                self.stacked(&primary, &secondary, &style)
            }
            Layout::SideBySide => self.side_by_side(&primary, &secondary),
        }
    }

    fn stacked(&self, primary: &[String], secondary: &[String], style: &SecondaryStyle) -> Vec<String> {
        let width = self.policy.max_line_width;
        let mut out: Vec<String> = primary.iter().flat_map(|line| wrap_text(line, width)).collect();
        out.extend(
            secondary
                .iter()
                .flat_map(|line| wrap_text(line, width))
                .map(|line| style.apply(&line)),
        );
        out
    }

    fn side_by_side(&self, primary: &[String], secondary: &[String]) -> Vec<String> {
        let width = self.policy.column_width;
        let left = wrap_text(&primary.join(" "), width);
        let right = wrap_text(&secondary.join(" "), width);
        let rows = left.len().max(right.len());

        (0..rows)
            .map(|row| {
                let left_cell = left.get(row).map(String::as_str).unwrap_or("");
                let padding = width.saturating_sub(left_cell.chars().count());
                let mut line = String::with_capacity(width + self.policy.separator.len() + 16);
                line.push_str(left_cell);
                line.extend(std::iter::repeat_n(' ', padding));
                line.push_str(&self.policy.separator);
                if let Some(right_cell) = right.get(row) {
                    line.push_str(&self.policy.secondary_style.apply(right_cell));
                }
                line.trim_end().to_string()
            })
            .collect()
    }
}
