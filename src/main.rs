// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{anyhow, Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use log::{error, info, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::io::Write;
use std::path::{Path, PathBuf};

use dualsub::app_config::{self, Config};
use dualsub::merge::{BackboneMode, Layout};
use dualsub::scoring::EpisodeInfo;
use dualsub::{Controller, MergeError};

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

/// CLI Wrapper for Layout to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLayout {
    Stacked,
    SideBySide,
    TranslationDerived,
}

impl From<CliLayout> for Layout {
    fn from(cli_layout: CliLayout) -> Self {
        match cli_layout {
            CliLayout::Stacked => Layout::Stacked,
            CliLayout::SideBySide => Layout::SideBySide,
            CliLayout::TranslationDerived => Layout::TranslationDerived,
        }
    }
}

/// CLI Wrapper for BackboneMode to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliMode {
    MasterAnchored,
    IntervalUnion,
}

impl From<CliMode> for BackboneMode {
    fn from(cli_mode: CliMode) -> Self {
        match cli_mode {
            CliMode::MasterAnchored => BackboneMode::MasterAnchored,
            CliMode::IntervalUnion => BackboneMode::IntervalUnion,
        }
    }
}

/// Options shared by every command that produces a subtitle
#[derive(Args, Debug)]
struct CommonArgs {
    /// Primary (master) language code (e.g., 'en', 'es', 'fr')
    #[arg(short, long)]
    primary_language: Option<String>,

    /// Secondary language code (e.g., 'en', 'es', 'fr')
    #[arg(short, long)]
    secondary_language: Option<String>,

    /// Presentation layout of the merged cues
    #[arg(long, value_enum)]
    layout: Option<CliLayout>,

    /// Alignment backbone
    #[arg(long, value_enum)]
    mode: Option<CliMode>,

    /// Shift applied to the secondary track, in milliseconds (may be negative)
    #[arg(long, allow_hyphen_values = true)]
    offset_ms: Option<i64>,

    /// Output directory (defaults to the input file's directory)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Force overwrite of existing output files
    #[arg(short, long)]
    force_overwrite: bool,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Merge two local subtitle files
    Merge {
        /// Master track, its timing drives the output
        #[arg(value_name = "PRIMARY")]
        primary: PathBuf,

        /// Track attached under the master
        #[arg(value_name = "SECONDARY")]
        secondary: PathBuf,

        #[command(flatten)]
        common: CommonArgs,
    },

    /// Search the subtitle provider for both languages and merge the best pair
    Fetch {
        /// Title id, e.g. an IMDb id (tt0133093)
        #[arg(value_name = "TITLE_ID")]
        title_id: String,

        /// Season number for series
        #[arg(long, requires = "episode")]
        season: Option<u32>,

        /// Episode number for series
        #[arg(long, requires = "season")]
        episode: Option<u32>,

        /// Provider API key (repeatable, rotated on quota errors)
        #[arg(long = "api-key", env = "OPENSUBTITLES_API_KEY")]
        api_keys: Vec<String>,

        /// Machine-translate the primary subtitle when no secondary subtitle exists
        #[arg(long)]
        translate_fallback: bool,

        #[command(flatten)]
        common: CommonArgs,
    },

    /// Machine-translate one subtitle file and stack the translation under it
    Translate {
        /// Subtitle in the primary language
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Translation service URL
        #[arg(long)]
        endpoint: Option<String>,

        #[command(flatten)]
        common: CommonArgs,
    },

    /// Generate shell completions for dualsub
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// dualsub - dual-language subtitles
///
/// Combines two subtitle tracks into one stream that shows both languages.
#[derive(Parser, Debug)]
#[command(name = "dualsub")]
#[command(version)]
#[command(about = "Dual-language subtitle merger")]
#[command(long_about = "dualsub aligns two subtitle tracks on one timeline and renders both languages in every cue.

EXAMPLES:
    dualsub merge movie.en.srt movie.fr.srt               # Stack French under English
    dualsub merge -s de --layout side-by-side a.srt b.srt # Side-by-side columns
    dualsub merge --offset-ms -1200 a.srt b.srt           # Secondary track runs 1.2s late
    dualsub fetch tt0133093 -p en -s fr                   # Search, pick the best pair, merge
    dualsub fetch tt0944947 --season 1 --episode 2        # Series episode
    dualsub translate movie.en.srt -s es                  # Machine-translated second track
    dualsub completions bash > dualsub.bash               # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default one
    will be created automatically. Command line flags override file values.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,
}

// @struct: Custom logger implementation
// Filtering happens through `log::max_level`, which is adjusted once the config is read
struct CustomLogger;

impl CustomLogger {
    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        log::set_boxed_logger(Box::new(CustomLogger))?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI colour for log level
    fn color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "1;31",
            Level::Warn => "1;33",
            Level::Info => "1;32",
            Level::Debug => "1;36",
            Level::Trace => "1;35",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "\x1B[{}m{} {:<5} {}\x1B[0m",
                Self::color_for_level(record.level()),
                now,
                record.level(),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Info until the config says otherwise
    CustomLogger::init(LevelFilter::Info)?;

    let cli = CommandLineOptions::parse();

    let result = match cli.command {
        Commands::Completions { shell } => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "dualsub", &mut std::io::stdout());
            return Ok(());
        }
        Commands::Merge { primary, secondary, common } => run_merge(&primary, &secondary, common),
        Commands::Fetch { title_id, season, episode, api_keys, translate_fallback, common } => {
            let episode = season.zip(episode).map(|(season, episode)| EpisodeInfo { season, episode });
            run_fetch(&title_id, episode, api_keys, translate_fallback, common).await
        }
        Commands::Translate { input, endpoint, common } => run_translate(&input, endpoint, common).await,
    };

    if let Err(e) = result {
        if let Some(merge_error) = e.downcast_ref::<MergeError>() {
            error!("No dual subtitle available: {}", merge_error);
            std::process::exit(1);
        }
        return Err(e);
    }

    Ok(())
}

/// Load or create the config, then apply command line overrides
fn load_config(common: &CommonArgs) -> Result<Config> {
    // If log level is set via command line, apply it immediately
    if let Some(level) = &common.log_level {
        let level: app_config::LogLevel = level.clone().into();
        log::set_max_level(level.to_level_filter());
    }

    let mut config = Config::load_or_create(Path::new(&common.config_path))?;

    if let Some(primary) = &common.primary_language {
        config.primary_language = primary.clone();
    }
    if let Some(secondary) = &common.secondary_language {
        config.secondary_language = secondary.clone();
    }
    if let Some(layout) = &common.layout {
        config.format.layout = layout.clone().into();
    }
    if let Some(mode) = &common.mode {
        config.merge.mode = mode.clone().into();
    }
    if let Some(offset_ms) = common.offset_ms {
        config.merge.offset_ms = offset_ms;
    }
    if let Some(log_level) = &common.log_level {
        config.log_level = log_level.clone().into();
    }

    config.validate().context("Configuration validation failed")?;

    // If log level was not set via command line, update it from config now
    if common.log_level.is_none() {
        log::set_max_level(config.log_level.to_level_filter());
    }

    Ok(config)
}

fn run_merge(primary: &Path, secondary: &Path, common: CommonArgs) -> Result<()> {
    for path in [primary, secondary] {
        if !path.is_file() {
            return Err(anyhow!("Input file does not exist: {:?}", path));
        }
    }

    let config = load_config(&common)?;
    let controller = Controller::with_config(config)?;
    controller.merge_files(primary, secondary, common.output_dir.as_deref(), common.force_overwrite)?;
    Ok(())
}

async fn run_fetch(
    title_id: &str,
    episode: Option<EpisodeInfo>,
    api_keys: Vec<String>,
    translate_fallback: bool,
    common: CommonArgs,
) -> Result<()> {
    let mut config = load_config(&common)?;
    if !api_keys.is_empty() {
        config.provider.api_keys = api_keys;
    }
    if translate_fallback {
        config.translation.enabled = true;
    }
    if config.provider.api_keys.is_empty() {
        return Err(anyhow!("A provider API key is required (--api-key or provider.api_keys in the config)"));
    }

    info!("Fetching {} + {} subtitles for {}", config.primary_language, config.secondary_language, title_id);

    let output_dir = common.output_dir.clone().unwrap_or_else(|| PathBuf::from("."));
    let controller = Controller::with_config(config)?;
    controller.fetch_to_file(title_id, episode, &output_dir, common.force_overwrite).await?;
    Ok(())
}

async fn run_translate(input: &Path, endpoint: Option<String>, common: CommonArgs) -> Result<()> {
    if !input.is_file() {
        return Err(anyhow!("Input file does not exist: {:?}", input));
    }

    let mut config = load_config(&common)?;
    if let Some(endpoint) = endpoint {
        config.translation.endpoint = endpoint;
    }

    let controller = Controller::with_config(config)?;
    controller.translate_file(input, common.output_dir.as_deref(), common.force_overwrite).await?;
    Ok(())
}
