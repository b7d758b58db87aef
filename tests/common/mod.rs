/*!
 * Common test utilities for the dualsub test suite
 */

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Once;
use tempfile::TempDir;

use dualsub::app_config::Config;
use dualsub::subtitle_codec::{Cue, CueSequence};

static INIT_LOGGER: Once = Once::new();

/// Route `log` output through env_logger, captured by the test harness
pub fn init_logger() {
    INIT_LOGGER.call_once(|| {
        let _ = env_logger::builder().is_test(true).try_init();
    });
}

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// Cue with a single-line (or newline-delimited) body
pub fn cue(ordinal: usize, start_ms: u64, end_ms: u64, text: &str) -> Cue {
    Cue::from_text(ordinal, start_ms, end_ms, text)
}

/// Sequence from `(start, end, text)` triples, numbered from 1
pub fn sequence(items: &[(u64, u64, &str)]) -> CueSequence {
    items
        .iter()
        .enumerate()
        .map(|(idx, (start, end, text))| cue(idx + 1, *start, *end, text))
        .collect::<Vec<_>>()
        .into()
}

/// English master track
pub const ENGLISH_SRT: &str = "1
00:00:01,000 --> 00:00:04,000
Hello there.

2
00:00:05,000 --> 00:00:08,000
<i>How are you?</i>

3
00:00:10,000 --> 00:00:12,500
Fine, thanks.
";

/// French track, slightly different timing grid plus one extra line
pub const FRENCH_SRT: &str = "1
00:00:01,200 --> 00:00:03,900
Bonjour.

2
00:00:05,100 --> 00:00:07,800
{\\an8}Comment ça va ?

3
00:00:08,500 --> 00:00:09,500
(musique)

4
00:00:10,100 --> 00:00:12,400
Bien, merci.
";

/// Config with fast retries and no pauses, suitable for tests
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.primary_language = "en".to_string();
    config.secondary_language = "fr".to_string();
    config.translation.batch_delay_ms = 0;
    config.translation.retry_backoff_ms = 1;
    config.translation.max_backoff_ms = 4;
    config.translation.retry_count = 2;
    config
}
