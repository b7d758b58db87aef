/*!
 * # dualsub - dual-language subtitle merging
 *
 * A Rust library that combines two independently-sourced subtitle tracks into a
 * single stream showing both languages at once.
 *
 * ## Features
 *
 * - Lenient SRT parsing and exact serialization on a millisecond timeline
 * - Master-anchored cue alignment with a guard band, orphan preservation and
 *   optional overlap clamping, or an interval-union backbone
 * - Stacked, side-by-side and translation-derived layouts with tag cleaning,
 *   word wrap and secondary-line styling
 * - Release-aware candidate scoring that prefers pairs sharing a source and cut
 * - Concurrent provider search and download, rotating API keys
 * - Batched machine translation as a fallback when one language is missing
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `subtitle_codec`: Timecode model and SRT codec
 * - `scoring`: Candidate ranking and pair selection
 * - `merge`: Aligner, formatter and the merge engine
 * - `providers`: Subtitle provider trait, OpenSubtitles client, mocks
 * - `translation`: Translator trait, batch translator, LibreTranslate client
 * - `cache`: Result cache trait and in-memory TTL cache
 * - `app_config`: Configuration management
 * - `app_controller`: Main application controller
 * - `file_utils`: File system operations
 * - `language_utils`: ISO language code utilities
 * - `errors`: Custom error types for the application
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod cache;
pub mod errors;
pub mod file_utils;
pub mod language_utils;
pub mod merge;
pub mod providers;
pub mod scoring;
pub mod subtitle_codec;
pub mod translation;

// Re-export main types for easier usage
pub use app_config::Config;
pub use app_controller::{Controller, DualOrigin, DualSubtitle};
pub use cache::{CacheKey, MemoryCache, ResultCache};
pub use errors::{AppError, MergeError, ProviderError, SubtitleError, TranslationError};
pub use language_utils::{get_language_name, language_codes_match, normalize_to_part2t};
pub use merge::{Aligner, BackboneMode, FormatPolicy, Layout, MergeEngine, MergedCue, TextFormatter};
pub use subtitle_codec::{Cue, CueSequence};
