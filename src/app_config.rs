use anyhow::{Context, Result};
use log::{LevelFilter, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::errors::ConfigError;
use crate::language_utils;
use crate::subtitle_track::{DEFAULT_STYLE, OutputKind, Style};

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings. Every engine gets its own
/// typed section with explicit defaults and a `validate` method.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Source language code (ISO)
    #[serde(default = "default_source_language")]
    pub source_language: String,

    /// Target language code (ISO)
    #[serde(default = "default_target_language")]
    pub target_language: String,

    /// Outputs to produce
    #[serde(default = "default_outputs")]
    pub outputs: Vec<OutputKind>,

    /// Worker pool size for extraction, recognition and translation
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Style table shared by every produced track
    #[serde(default = "default_styles")]
    pub styles: Vec<Style>,

    /// Sentence merge/split and word binding settings
    #[serde(default)]
    pub segmentation: SegmentationConfig,

    /// Voice activity detection settings
    #[serde(default)]
    pub auditok: AuditokConfig,

    /// VAD parameter grid search settings
    #[serde(default)]
    pub optimizer: OptimizerConfig,

    /// Region trimming settings
    #[serde(default)]
    pub trim: TrimConfig,

    /// Audio fragment extraction settings
    #[serde(default)]
    pub extraction: ExtractionConfig,

    /// Bilingual track settings
    #[serde(default)]
    pub bilingual: BilingualConfig,

    /// Translation batching settings
    #[serde(default)]
    pub translation: TranslationBatchConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Settings for the sentence merge/split engine and word binding
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SegmentationConfig {
    /// Maximum event text length in characters
    #[serde(default = "default_max_join_size")]
    pub max_join_size: usize,

    /// Events closer than this are merge candidates
    #[serde(default = "default_max_delta_time_ms")]
    pub max_delta_time_ms: u64,

    /// Characters preferred as split points
    #[serde(default = "default_delimiters")]
    pub delimiters: String,

    /// Words that make a natural break when no punctuation is available
    #[serde(default = "default_strong_stop_words")]
    pub strong_stop_words: Vec<String>,

    /// Last-resort break words
    #[serde(default = "default_weak_stop_words")]
    pub weak_stop_words: Vec<String>,

    /// Never split oversized text
    #[serde(default)]
    pub avoid_split: bool,

    /// Split points closer than this fraction of the text to either edge are ignored
    #[serde(default = "default_min_edge_ratio")]
    pub min_edge_ratio: f64,

    /// Inserted between the texts of merged events
    #[serde(default = "default_join_separator")]
    pub join_separator: String,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            max_join_size: default_max_join_size(),
            max_delta_time_ms: default_max_delta_time_ms(),
            delimiters: default_delimiters(),
            strong_stop_words: default_strong_stop_words(),
            weak_stop_words: default_weak_stop_words(),
            avoid_split: false,
            min_edge_ratio: default_min_edge_ratio(),
            join_separator: default_join_separator(),
        }
    }
}

impl SegmentationConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_join_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "segmentation.max_join_size",
                reason: "must be greater than zero".to_string(),
            });
        }
        if !(0.0..0.5).contains(&self.min_edge_ratio) {
            return Err(ConfigError::InvalidValue {
                field: "segmentation.min_edge_ratio",
                reason: format!("{} is outside [0, 0.5)", self.min_edge_ratio),
            });
        }
        Ok(())
    }
}

/// Voice activity detection parameters handed to the VAD provider
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AuditokConfig {
    /// Energy above which audio counts as speech
    #[serde(default = "default_energy_threshold")]
    pub energy_threshold: u32,

    /// Shortest region kept
    #[serde(default = "default_min_region_ms")]
    pub min_region_ms: u64,

    /// Longest region before a forced cut
    #[serde(default = "default_max_region_ms")]
    pub max_region_ms: u64,

    /// Silence tolerated inside a region
    #[serde(default = "default_max_continuous_silence_ms")]
    pub max_continuous_silence_ms: u64,

    /// Drop trailing regions shorter than `min_region_ms` as well
    #[serde(default = "default_true")]
    pub strict_min_length: bool,

    /// Strip trailing silence from each region
    #[serde(default)]
    pub drop_trailing_silence: bool,
}

impl Default for AuditokConfig {
    fn default() -> Self {
        Self {
            energy_threshold: default_energy_threshold(),
            min_region_ms: default_min_region_ms(),
            max_region_ms: default_max_region_ms(),
            max_continuous_silence_ms: default_max_continuous_silence_ms(),
            strict_min_length: true,
            drop_trailing_silence: false,
        }
    }
}

impl AuditokConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_region_ms > self.max_region_ms {
            return Err(ConfigError::InvalidRange {
                field: "auditok.region_ms",
                min: self.min_region_ms.to_string(),
                max: self.max_region_ms.to_string(),
            });
        }
        if self.max_region_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "auditok.max_region_ms",
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

/// Grid search settings for the VAD parameter optimizer
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OptimizerConfig {
    /// Run the optimizer before detecting regions
    #[serde(default)]
    pub enabled: bool,

    /// Energy threshold bounds; swapped if given in the wrong order
    #[serde(default = "default_optimizer_energy_min")]
    pub energy_min: u32,
    #[serde(default = "default_optimizer_energy_max")]
    pub energy_max: u32,

    /// Continuous silence bounds; swapped if given in the wrong order
    #[serde(default = "default_optimizer_silence_min_ms")]
    pub silence_min_ms: u64,
    #[serde(default = "default_optimizer_silence_max_ms")]
    pub silence_max_ms: u64,

    /// Interior grid points per axis
    #[serde(default = "default_optimizer_passes")]
    pub energy_passes: usize,
    #[serde(default = "default_optimizer_passes")]
    pub silence_passes: usize,

    /// Regions shorter than this count as small
    #[serde(default = "default_small_region_ms")]
    pub small_region_ms: u64,

    /// Regions longer than this count as big
    #[serde(default = "default_big_region_ms")]
    pub big_region_ms: u64,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            energy_min: default_optimizer_energy_min(),
            energy_max: default_optimizer_energy_max(),
            silence_min_ms: default_optimizer_silence_min_ms(),
            silence_max_ms: default_optimizer_silence_max_ms(),
            energy_passes: default_optimizer_passes(),
            silence_passes: default_optimizer_passes(),
            small_region_ms: default_small_region_ms(),
            big_region_ms: default_big_region_ms(),
        }
    }
}

impl OptimizerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.energy_passes == 0 || self.silence_passes == 0 {
            return Err(ConfigError::InvalidValue {
                field: "optimizer.passes",
                reason: "each axis needs at least one grid point".to_string(),
            });
        }
        if self.small_region_ms >= self.big_region_ms {
            return Err(ConfigError::InvalidRange {
                field: "optimizer.region_size_ms",
                min: self.small_region_ms.to_string(),
                max: self.big_region_ms.to_string(),
            });
        }
        Ok(())
    }
}

/// Settings for tightening events to inner speech activity
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TrimConfig {
    /// Trim each fragment to its inner speech activity before transcription
    #[serde(default)]
    pub enabled: bool,

    /// Sub-regions shorter than this at either edge are treated as blips
    #[serde(default = "default_trim_size_ms")]
    pub trim_size_ms: u64,
}

impl Default for TrimConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            trim_size_ms: default_trim_size_ms(),
        }
    }
}

/// Margins added around each region when extracting audio fragments
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct ExtractionConfig {
    #[serde(default)]
    pub margin_before_ms: u64,
    #[serde(default)]
    pub margin_after_ms: u64,
}

/// Bilingual track settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BilingualConfig {
    /// Style for source-language text
    #[serde(default = "default_source_style")]
    pub source_style: String,

    /// Style for destination-language text
    #[serde(default = "default_destination_style")]
    pub destination_style: String,

    /// Run the sentence merge pass on translated events before combining
    #[serde(default)]
    pub merge_destination: bool,
}

impl Default for BilingualConfig {
    fn default() -> Self {
        Self {
            source_style: default_source_style(),
            destination_style: default_destination_style(),
            merge_destination: false,
        }
    }
}

/// Translation request batching
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationBatchConfig {
    /// Maximum display width of one newline-joined batch
    #[serde(default = "default_max_batch_width")]
    pub max_batch_width: usize,
}

impl Default for TranslationBatchConfig {
    fn default() -> Self {
        Self {
            max_batch_width: default_max_batch_width(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(&self) -> LevelFilter {
        match self {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

fn default_source_language() -> String {
    "en".to_string()
}

fn default_target_language() -> String {
    "fr".to_string()
}

fn default_outputs() -> Vec<OutputKind> {
    vec![OutputKind::Source]
}

fn default_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

fn default_styles() -> Vec<Style> {
    vec![
        Style::named(default_source_style()),
        Style::named(default_destination_style()),
    ]
}

fn default_max_join_size() -> usize {
    100
}

fn default_max_delta_time_ms() -> u64 {
    1000
}

fn default_delimiters() -> String {
    "!()*,.:;?[]^_`~，。！？；：".to_string()
}

fn default_strong_stop_words() -> Vec<String> {
    [
        "and", "but", "or", "so", "because", "then", "however", "although", "though",
        "while", "whereas", "unless", "until",
    ]
    .iter()
    .map(|w| w.to_string())
    .collect()
}

fn default_weak_stop_words() -> Vec<String> {
    [
        "the", "a", "an", "of", "to", "in", "on", "at", "for", "with", "that", "which",
        "who", "when", "where", "if", "as", "from", "by",
    ]
    .iter()
    .map(|w| w.to_string())
    .collect()
}

fn default_min_edge_ratio() -> f64 {
    0.1
}

fn default_join_separator() -> String {
    " ".to_string()
}

fn default_energy_threshold() -> u32 {
    45
}

fn default_min_region_ms() -> u64 {
    500
}

fn default_max_region_ms() -> u64 {
    6000
}

fn default_max_continuous_silence_ms() -> u64 {
    300
}

fn default_optimizer_energy_min() -> u32 {
    30
}

fn default_optimizer_energy_max() -> u32 {
    70
}

fn default_optimizer_silence_min_ms() -> u64 {
    100
}

fn default_optimizer_silence_max_ms() -> u64 {
    700
}

fn default_optimizer_passes() -> usize {
    3
}

fn default_small_region_ms() -> u64 {
    1000
}

fn default_big_region_ms() -> u64 {
    5000
}

fn default_trim_size_ms() -> u64 {
    200
}

fn default_source_style() -> String {
    DEFAULT_STYLE.to_string()
}

fn default_destination_style() -> String {
    "Translated".to_string()
}

fn default_max_batch_width() -> usize {
    5000
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<(), ConfigError> {
        language_utils::validate_language_code(&self.source_language)?;
        language_utils::validate_language_code(&self.target_language)?;

        if self.outputs.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "outputs",
                reason: "at least one output is required".to_string(),
            });
        }
        if self.concurrency == 0 {
            return Err(ConfigError::InvalidValue {
                field: "concurrency",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.translation.max_batch_width == 0 {
            return Err(ConfigError::InvalidValue {
                field: "translation.max_batch_width",
                reason: "must be greater than zero".to_string(),
            });
        }

        self.segmentation.validate()?;
        self.auditok.validate()?;
        self.optimizer.validate()?;

        for style in [&self.bilingual.source_style, &self.bilingual.destination_style] {
            if !self.styles.iter().any(|s| &s.name == style) {
                return Err(ConfigError::UnknownStyle(style.clone()));
            }
        }

        Ok(())
    }

    /// Requested outputs as a set
    pub fn requested_outputs(&self) -> BTreeSet<OutputKind> {
        self.outputs.iter().copied().collect()
    }

    /// Load configuration from a JSON file, writing the defaults if it does not exist
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            let file = File::open(path)
                .with_context(|| format!("Failed to open config file: {}", path.display()))?;
            let reader = BufReader::new(file);
            let config: Config = serde_json::from_reader(reader)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
            return Ok(config);
        }

        warn!("Config file not found at '{}', creating default config.", path.display());
        let config = Config::default();
        let config_json = serde_json::to_string_pretty(&config)
            .context("Failed to serialize default config to JSON")?;
        std::fs::write(path, config_json)
            .with_context(|| format!("Failed to write default config to file: {}", path.display()))?;
        Ok(config)
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            source_language: default_source_language(),
            target_language: default_target_language(),
            outputs: default_outputs(),
            concurrency: default_concurrency(),
            styles: default_styles(),
            segmentation: SegmentationConfig::default(),
            auditok: AuditokConfig::default(),
            optimizer: OptimizerConfig::default(),
            trim: TrimConfig::default(),
            extraction: ExtractionConfig::default(),
            bilingual: BilingualConfig::default(),
            translation: TranslationBatchConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}
