// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, debug, error, info};
use serde::de::DeserializeOwned;
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};

use yastgen::app_config::{Config, LogLevel};
use yastgen::errors::AppError;
use yastgen::segmentation::{align_words, merge_and_split, merge_bilingual, split_bilingual, trim_events};
use yastgen::subtitle_track::{JsonTrackSerializer, Region, SubtitleSerializer, SubtitleTrack};
use yastgen::timed_word::TimedWord;

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => LogLevel::Error,
            CliLogLevel::Warn => LogLevel::Warn,
            CliLogLevel::Info => LogLevel::Info,
            CliLogLevel::Debug => LogLevel::Debug,
            CliLogLevel::Trace => LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Merge and split the events of a track into readable sentences
    Segment {
        /// Track to segment (JSON)
        #[arg(value_name = "TRACK")]
        input: PathBuf,

        /// Output file; stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Bind word timestamps to coarse regions and render events
    Align {
        /// Word list (JSON array of {start, end, text})
        #[arg(value_name = "WORDS")]
        words: PathBuf,

        /// Coarse regions (JSON array of {start, end})
        #[arg(value_name = "REGIONS")]
        regions: PathBuf,

        /// Style of the produced events
        #[arg(long)]
        style: Option<String>,

        /// Output file; stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Combine two tracks into one bilingual track
    Merge {
        /// Track shown on the top line (JSON)
        #[arg(value_name = "TOP")]
        top: PathBuf,

        /// Track shown on the bottom line (JSON)
        #[arg(value_name = "BOTTOM")]
        bottom: PathBuf,

        /// Output file; stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Separate a bilingual track into its two languages
    Split {
        /// Bilingual track (JSON)
        #[arg(value_name = "TRACK")]
        input: PathBuf,

        /// Output file for the top-line track
        #[arg(long)]
        top: PathBuf,

        /// Output file for the bottom-line track
        #[arg(long)]
        bottom: PathBuf,

        /// Style of bottom-line events when the track has no combined events
        #[arg(long)]
        bottom_style: Option<String>,
    },

    /// Tighten event bounds to speech activity detected inside each event
    Trim {
        /// Track to trim (JSON)
        #[arg(value_name = "TRACK")]
        input: PathBuf,

        /// Sub-regions per event, relative to each fragment (JSON array of arrays)
        #[arg(value_name = "ACTIVITY")]
        activity: PathBuf,

        /// Output file; stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Generate shell completions for yastgen
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// yastgen - Yet Another Subtitle Generator
///
/// Segmentation and alignment tools for automatically generated subtitles.
#[derive(Parser, Debug)]
#[command(name = "yastgen")]
#[command(author = "yastgen Team")]
#[command(version)]
#[command(about = "Subtitle segmentation and alignment tool")]
#[command(long_about = "yastgen reshapes timed subtitle events: it binds word timestamps to coarse
speech regions, merges and splits events into readable sentences, combines
two language tracks into one bilingual track and trims events to detected speech.

EXAMPLES:
    yastgen segment track.json -o segmented.json
    yastgen align words.json regions.json --style Default
    yastgen merge source.json translated.json -o bilingual.json
    yastgen split bilingual.json --top source.json --bottom translated.json
    yastgen trim track.json activity.json
    yastgen completions bash > yastgen.bash

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default one
    will be created automatically.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json", global = true)]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum, global = true)]
    log_level: Option<CliLogLevel>,

    /// Override the maximum event length in characters
    #[arg(short, long, global = true)]
    max_join_size: Option<usize>,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI colour code for log level
    fn colour_for_level(level: Level) -> &'static str {
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
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let colour = Self::colour_for_level(record.level());
            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "\x1B[{}m{} {:<5} {}\x1B[0m",
                colour,
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
    // The level is lowered or raised once the config is known
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    if let Commands::Completions { shell } = cli.command {
        let mut cmd = CommandLineOptions::command();
        generate(shell, &mut cmd, "yastgen", &mut std::io::stdout());
        return Ok(());
    }

    let result = load_config(&cli).and_then(|config| run_command(cli.command, &config));
    if let Err(e) = result {
        error!("{}", e);
        std::process::exit(1);
    }
    Ok(())
}

fn load_config(cli: &CommandLineOptions) -> Result<Config, AppError> {
    let mut config = Config::load_or_create(&cli.config_path)?;

    if let Some(level) = &cli.log_level {
        config.log_level = level.clone().into();
    }
    if let Some(max_join_size) = cli.max_join_size {
        config.segmentation.max_join_size = max_join_size;
    }
    log::set_max_level(config.log_level.to_level_filter());

    config.validate()?;
    debug!("Loaded configuration from {}", cli.config_path);
    Ok(config)
}

fn run_command(command: Commands, config: &Config) -> Result<(), AppError> {
    match command {
        Commands::Segment { input, output } => {
            let mut track: SubtitleTrack = read_json(&input)?;
            let (events, stats) = merge_and_split(&track.events, &config.segmentation);
            info!(
                "Segmented {} events into {} ({} merged, {} split)",
                track.events.len(),
                events.len(),
                stats.merged,
                stats.split
            );
            track.events = events;
            write_track(&track, output.as_deref())
        }
        Commands::Align { words, regions, style, output } => {
            let words: Vec<TimedWord> = read_json(&words)?;
            let regions: Vec<Region> = read_json(&regions)?;
            let style = style.unwrap_or_else(|| config.bilingual.source_style.clone());

            let events = align_words(&words, &regions, &config.segmentation, &style)?;
            info!("Aligned {} words into {} events", words.len(), events.len());

            let mut track = SubtitleTrack::with_styles(config.styles.iter().cloned());
            track.push_events(events)?;
            write_track(&track, output.as_deref())
        }
        Commands::Merge { top, bottom, output } => {
            let top: SubtitleTrack = read_json(&top)?;
            let bottom: SubtitleTrack = read_json(&bottom)?;

            let events = merge_bilingual(&top.events, &bottom.events);
            info!("Merged {} and {} events into {}", top.events.len(), bottom.events.len(), events.len());

            let mut track = SubtitleTrack {
                events,
                ..top
            };
            for (name, style) in bottom.styles {
                track.styles.entry(name).or_insert(style);
            }
            write_track(&track, output.as_deref())
        }
        Commands::Split { input, top, bottom, bottom_style } => {
            let track: SubtitleTrack = read_json(&input)?;
            let fallback = bottom_style.as_deref().unwrap_or(&config.bilingual.destination_style);
            let split = split_bilingual(&track.events, fallback);
            info!("Split into {} top and {} bottom events", split.top.len(), split.bottom.len());

            let top_track = SubtitleTrack {
                events: split.top,
                ..track.clone()
            };
            let bottom_track = SubtitleTrack {
                events: split.bottom,
                ..track
            };
            write_track(&top_track, Some(top.as_path()))?;
            write_track(&bottom_track, Some(bottom.as_path()))
        }
        Commands::Trim { input, activity, output } => {
            let mut track: SubtitleTrack = read_json(&input)?;
            let activity: Vec<Vec<Region>> = read_json(&activity)?;

            track.events = trim_events(
                &track.events,
                &activity,
                &config.trim,
                config.extraction.margin_before_ms,
            )?;
            info!("Trimmed {} events", track.events.len());
            write_track(&track, output.as_deref())
        }
        Commands::Completions { .. } => Ok(()),
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, AppError> {
    let file = File::open(path).map_err(|e| AppError::File(format!("{}: {}", path.display(), e)))?;
    serde_json::from_reader(BufReader::new(file))
        .map_err(|e| AppError::File(format!("Failed to parse {}: {}", path.display(), e)))
}

fn write_track(track: &SubtitleTrack, output: Option<&Path>) -> Result<(), AppError> {
    let bytes = JsonTrackSerializer.serialize(track, "json")?;
    match output {
        Some(path) => {
            std::fs::write(path, bytes)?;
            info!("Wrote {}", path.display());
        }
        None => {
            let mut stdout = std::io::stdout();
            stdout.write_all(&bytes)?;
            stdout.write_all(b"\n")?;
        }
    }
    Ok(())
}
