// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, info, warn};
use parking_lot::Mutex;
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use wordweave::app_config::{self, Config, DEFAULT_CONFIG_PATH};
use wordweave::document::fixture::PageFixture;
use wordweave::processing::markup::{OriginalWordDisplayMode, TranslationPosition};
use wordweave::processing::{CoordinatorStats, ProcessOptions, ProcessingCoordinator, ProcessingResult, RngSource};
use wordweave::providers::dictionary::DictionaryTranslator;

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

/// CLI Wrapper for OriginalWordDisplayMode to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliDisplayMode {
    Visible,
    Hidden,
    Learning,
}

impl From<CliDisplayMode> for OriginalWordDisplayMode {
    fn from(cli_mode: CliDisplayMode) -> Self {
        match cli_mode {
            CliDisplayMode::Visible => OriginalWordDisplayMode::Visible,
            CliDisplayMode::Hidden => OriginalWordDisplayMode::Hidden,
            CliDisplayMode::Learning => OriginalWordDisplayMode::Learning,
        }
    }
}

/// CLI Wrapper for TranslationPosition to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliPosition {
    Before,
    After,
}

impl From<CliPosition> for TranslationPosition {
    fn from(cli_position: CliPosition) -> Self {
        match cli_position {
            CliPosition::Before => TranslationPosition::Before,
            CliPosition::After => TranslationPosition::After,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Rewrite a page fixture using a dictionary
    Run(RunArgs),

    /// Generate shell completions for wordweave
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser, Debug)]
struct RunArgs {
    /// Page to rewrite: an HTML file, or a JSON list of text blocks
    #[arg(long, value_name = "PAGE")]
    page: PathBuf,

    /// Dictionary file (JSON object of word -> translation)
    #[arg(long, value_name = "DICTIONARY_JSON")]
    dictionary: PathBuf,

    /// Configuration file path
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: String,

    /// Override the page-wide replacement rate (0 < rate <= 1)
    #[arg(short, long)]
    rate: Option<f64>,

    /// How original words are presented
    #[arg(short, long, value_enum)]
    mode: Option<CliDisplayMode>,

    /// Where translations go relative to the original
    #[arg(short, long, value_enum)]
    position: Option<CliPosition>,

    /// Do not wrap translations in parentheses
    #[arg(long)]
    no_parentheses: bool,

    /// Seed for reproducible allocation
    #[arg(short, long)]
    seed: Option<u64>,

    /// Number of processing passes over the same segments
    #[arg(long, default_value_t = 1)]
    passes: usize,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

/// WordWeave - bilingual vocabulary overlay
///
/// Replaces a fraction of the words of a page with their translation,
/// spreading the replacement budget evenly across text blocks.
#[derive(Parser, Debug)]
#[command(name = "wordweave")]
#[command(version)]
#[command(about = "Bilingual vocabulary overlay for page text")]
#[command(long_about = "WordWeave rewrites page text so that a fraction of its words appear next to their translation.

EXAMPLES:
    wordweave run --page page.json --dictionary fr.json            # Rewrite with default config
    wordweave run --page page.html --dictionary fr.json            # Rewrite an HTML page
    wordweave run --page page.json --dictionary fr.json -r 0.5     # Replace half of the words
    wordweave run --page page.json --dictionary fr.json -s 42      # Reproducible allocation
    wordweave run --page page.json --dictionary fr.json --passes 2 # Show that a second pass skips
    wordweave completions bash > wordweave.bash                    # Generate bash completions

CONFIGURATION:
    Configuration is stored in wordweave.json by default. You can specify a different
    config file with --config. If the config file doesn't exist, a default one
    will be created automatically.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,
}

/// Summary printed after a run
#[derive(Debug, Serialize)]
struct RunSummary {
    passes: Vec<ProcessingResult>,
    stats: CoordinatorStats,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        // Filtering happens through `set_max_level` so the level can change later
        let logger = Box::new(CustomLogger::new(LevelFilter::Trace));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    fn color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "\x1B[1;31m",
            Level::Warn => "\x1B[1;33m",
            Level::Info => "\x1B[1;32m",
            Level::Debug => "\x1B[1;36m",
            Level::Trace => "\x1B[1;35m",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let _ = writeln!(
                std::io::stderr(),
                "{}{} {:<5} {}\x1B[0m",
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
    // Start at info; the configured level is applied once the config is loaded
    CustomLogger::init(LevelFilter::Info)?;

    let cli = CommandLineOptions::parse();

    match cli.command {
        Commands::Completions { shell } => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "wordweave", &mut std::io::stdout());
            Ok(())
        }
        Commands::Run(args) => run(args).await,
    }
}

/// Load the config file, or write a default one when it is missing
fn load_config(path: &str) -> Result<Config> {
    if Path::new(path).exists() {
        Config::from_file(path)
    } else {
        warn!("Config file not found at '{}', creating default config.", path);
        let config = Config::default();
        config.save(path)?;
        Ok(config)
    }
}

async fn run(args: RunArgs) -> Result<()> {
    if let Some(level) = &args.log_level {
        let level: app_config::LogLevel = level.clone().into();
        log::set_max_level(level.to_level_filter());
    }

    let mut config = load_config(&args.config)?;

    // Override config with CLI options if provided
    if let Some(rate) = args.rate {
        config.replacement_rate = rate;
    }
    if let Some(mode) = &args.mode {
        config.display.original_word_display_mode = mode.clone().into();
    }
    if let Some(position) = &args.position {
        config.display.translation_position = position.clone().into();
    }
    if args.no_parentheses {
        config.display.show_parentheses = false;
    }
    if let Some(level) = &args.log_level {
        config.log_level = level.clone().into();
    }

    config.validate().context("Configuration validation failed")?;
    log::set_max_level(config.log_level.to_level_filter());

    let (document, segments) = PageFixture::load(&args.page)?;
    let dictionary = DictionaryTranslator::from_file(&args.dictionary)?;
    info!(
        "Loaded {} segment(s) and {} dictionary entries",
        segments.len(),
        dictionary.len()
    );

    let document = Arc::new(Mutex::new(document));
    let mut coordinator = ProcessingCoordinator::new(Arc::clone(&document), Arc::new(dictionary), &config);
    if let Some(seed) = args.seed {
        coordinator = coordinator.with_random_source(Box::new(RngSource::seeded(seed)));
    }

    let options = ProcessOptions {
        display: config.display,
        lazy_loading: false,
    };

    let mut passes = Vec::with_capacity(args.passes);
    for pass in 0..args.passes.max(1) {
        let options = ProcessOptions {
            lazy_loading: pass > 0,
            ..options
        };
        passes.push(coordinator.process_segments(&segments, options).await);
    }
    coordinator.wait_for_completion().await;

    let summary = RunSummary {
        passes,
        stats: coordinator.get_stats(),
    };

    let html = document.lock().to_html();
    let mut stdout = std::io::stdout();
    writeln!(stdout, "{}", html)?;
    writeln!(
        stdout,
        "{}",
        serde_json::to_string_pretty(&summary).context("Failed to serialize run summary")?
    )?;

    Ok(())
}
