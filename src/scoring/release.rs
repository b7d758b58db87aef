/*!
 * Release metadata extracted from subtitle filenames.
 *
 * Scene-style names carry the source, resolution, codec and release group of the
 * video the subtitle was timed against, e.g.
 * `Show.S01E02.1080p.BluRay.x264-GROUP.srt`.
 */

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

use super::candidate::EpisodeInfo;

static EPISODE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:^|[^a-z0-9])s(\d{1,2})[ ._-]?e(\d{1,3})|(?:^|[^0-9])(\d{1,2})x(\d{2,3})(?:[^0-9]|$)").unwrap()
});

static RELEASE_GROUP_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"-([A-Za-z0-9]{2,})$").unwrap());

static FPS_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:^|[^0-9.])(23\.976|23\.98|24|25|29\.97|30|50|59\.94|60) ?fps").unwrap()
});

/// Where the video was captured or ripped from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceType {
    BluRay,
    Remux,
    Dvd,
    WebDl,
    WebRip,
    Hdtv,
    Pdtv,
    Cam,
}

/// Mutually exclusive groups of sources; releases from different families almost
/// never share a cut
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceFamily {
    Disc,
    Web,
    Broadcast,
    Cam,
}

impl SourceType {
    pub fn family(self) -> SourceFamily {
        match self {
            Self::BluRay | Self::Remux | Self::Dvd => SourceFamily::Disc,
            Self::WebDl | Self::WebRip => SourceFamily::Web,
            Self::Hdtv | Self::Pdtv => SourceFamily::Broadcast,
            Self::Cam => SourceFamily::Cam,
        }
    }

    fn from_token(token: &str) -> Option<Self> {
        match token {
            "bluray" | "blu-ray" | "bdrip" | "brrip" | "bdremux" => Some(Self::BluRay),
            "remux" => Some(Self::Remux),
            "dvdrip" | "dvd" | "dvdscr" => Some(Self::Dvd),
            "webdl" | "web-dl" | "web" => Some(Self::WebDl),
            "webrip" => Some(Self::WebRip),
            "hdtv" | "hdtvrip" => Some(Self::Hdtv),
            "pdtv" | "sdtv" | "dsr" => Some(Self::Pdtv),
            "cam" | "camrip" | "ts" | "telesync" | "hdcam" => Some(Self::Cam),
            _ => None,
        }
    }
}

/// Vertical resolution bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Resolution {
    Sd480,
    Sd576,
    Hd720,
    Hd1080,
    Uhd2160,
}

impl Resolution {
    fn from_token(token: &str) -> Option<Self> {
        match token {
            "480p" | "480i" => Some(Self::Sd480),
            "576p" | "576i" => Some(Self::Sd576),
            "720p" => Some(Self::Hd720),
            "1080p" | "1080i" => Some(Self::Hd1080),
            "2160p" | "4k" | "uhd" => Some(Self::Uhd2160),
            _ => None,
        }
    }
}

fn codec_from_token(token: &str) -> Option<&'static str> {
    match token {
        "x264" | "h264" | "avc" => Some("h264"),
        "x265" | "h265" | "hevc" => Some("h265"),
        "av1" => Some("av1"),
        "xvid" | "divx" => Some("xvid"),
        _ => None,
    }
}

/// Drop a trailing subtitle extension
fn strip_extension(file_name: &str) -> &str {
    let lower = file_name.to_ascii_lowercase();
    for ext in [".srt", ".sub", ".ass", ".ssa", ".vtt", ".zip"] {
        if lower.ends_with(ext) {
            return &file_name[..file_name.len() - ext.len()];
        }
    }
    file_name
}

/// Case-folded alphanumeric tokens of at least three characters
pub fn filename_tokens(file_name: &str) -> HashSet<String> {
    strip_extension(file_name)
        .split(|c: char| !c.is_alphanumeric())
        .filter(|token| token.chars().count() >= 3)
        .map(str::to_lowercase)
        .collect()
}

/// Jaccard similarity of the two filenames' token sets
pub fn token_similarity(a: &str, b: &str) -> f64 {
    let left = filename_tokens(a);
    let right = filename_tokens(b);
    let union = left.union(&right).count();
    if union == 0 {
        return 0.0;
    }
    left.intersection(&right).count() as f64 / union as f64
}

/// Season/episode from `S01E02`, `s1.e2` or `1x02` patterns
pub fn detect_episode(file_name: &str) -> Option<EpisodeInfo> {
    let caps = EPISODE_REGEX.captures(file_name)?;
    let (season, episode) = match (caps.get(1), caps.get(2)) {
        (Some(s), Some(e)) => (s, e),
        _ => (caps.get(3)?, caps.get(4)?),
    };
    Some(EpisodeInfo {
        season: season.as_str().parse().ok()?,
        episode: episode.as_str().parse().ok()?,
    })
}

/// Tags parsed from one filename
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReleaseInfo {
    pub source: Option<SourceType>,
    pub resolution: Option<Resolution>,
    pub codec: Option<&'static str>,
    pub frame_rate: Option<String>,
    pub release_group: Option<String>,
}

impl ReleaseInfo {
    pub fn parse(file_name: &str) -> Self {
        let stem = strip_extension(file_name);
        let mut info = ReleaseInfo::default();

        // Keep hyphens inside tokens so "web-dl" and "blu-ray" survive
        let lowered = stem.to_lowercase();
        for token in lowered.split(|c: char| !(c.is_alphanumeric() || c == '-')) {
            for part in std::iter::once(token).chain(token.split('-')) {
                if info.source.is_none() {
                    info.source = SourceType::from_token(part);
                }
                if info.resolution.is_none() {
                    info.resolution = Resolution::from_token(part);
                }
                if info.codec.is_none() {
                    info.codec = codec_from_token(part);
                }
            }
        }

        info.frame_rate = FPS_REGEX
            .captures(stem)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string());

        info.release_group = RELEASE_GROUP_REGEX
            .captures(stem)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_lowercase())
            .filter(|group| {
                group != "dl" && SourceType::from_token(group).is_none() && codec_from_token(group).is_none()
            });

        info
    }

    /// Number of technical hints present, used as a richness signal
    pub fn hint_count(&self) -> usize {
        [self.resolution.is_some(), self.codec.is_some(), self.frame_rate.is_some()]
            .iter()
            .filter(|present| **present)
            .count()
    }

    /// Both sides name a source, and the sources belong to different families
    pub fn hard_mismatch(&self, other: &ReleaseInfo) -> bool {
        match (self.source, other.source) {
            (Some(a), Some(b)) => a.family() != b.family(),
            _ => false,
        }
    }
}
