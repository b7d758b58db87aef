use anyhow::{Result, Context};
use std::fs;
use std::path::{Path, PathBuf};

// @module: File and directory utilities

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().is_file()
    }

    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.as_os_str().is_empty() && !path.exists() {
            fs::create_dir_all(path)
                .with_context(|| format!("Failed to create directory: {:?}", path))?;
        }
        Ok(())
    }

    // @generates: Output path for a merged subtitle
    // @params: input_file, output_dir, language tag (e.g. `en-fr`)
    pub fn generate_output_path<P1: AsRef<Path>, P2: AsRef<Path>>(
        input_file: P1,
        output_dir: P2,
        language_tag: &str,
    ) -> PathBuf {
        let input_file = input_file.as_ref();

        // Strip a trailing language code so `movie.en.srt` becomes `movie.en-fr.srt`, not `movie.en.en-fr.srt`
        let stem = input_file.file_stem().unwrap_or_default().to_string_lossy();
        let base = match stem.rsplit_once('.') {
            Some((base, code)) if crate::language_utils::validate_language_code(code).is_ok() => base,
            _ => stem.as_ref(),
        };

        output_dir.as_ref().join(format!("{}.{}.srt", base, language_tag))
    }

    /// Read a subtitle file, decoding invalid UTF-8 lossily
    pub fn read_subtitle_file<P: AsRef<Path>>(path: P) -> Result<String> {
        let bytes = fs::read(&path)
            .with_context(|| format!("Failed to read file: {:?}", path.as_ref()))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Write a string to a file
    pub fn write_to_file<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
        // Ensure the parent directory exists
        if let Some(parent) = path.as_ref().parent() {
            Self::ensure_dir(parent)?;
        }

        fs::write(&path, content)
            .with_context(|| format!("Failed to write to file: {:?}", path.as_ref()))?;

        Ok(())
    }

    /// Whether the path looks like a subtitle we can parse
    pub fn is_subtitle_file<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref()
            .extension()
            .is_some_and(|ext| ext.to_string_lossy().eq_ignore_ascii_case("srt"))
    }
}
