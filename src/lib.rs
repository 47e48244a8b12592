/*!
 * # yastgen - Yet Another Subtitle Generator
 *
 * A Rust library that turns speech audio into timed, readable subtitles.
 *
 * ## Features
 *
 * - Speech region detection through a pluggable voice activity detector
 * - Grid search over detector parameters for the best region lengths
 * - Binding of word-level timestamps to coarse subtitle events
 * - Sentence-level merge and split at natural break points
 * - Bilingual tracks combining source and translated text
 * - Trimming of event bounds to the speech inside them
 * - Ordered, bounded, cancellable concurrency for every provider call
 * - ISO 639-1 and ISO 639-2 language code support
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `timed_word`: Word-level timing model
 * - `subtitle_track`: Regions, events, styles and tracks
 * - `segmentation`: The segmentation engines:
 *   - `segmentation::boundary`: Split point selection
 *   - `segmentation::word_binding`: Word-to-event binding
 *   - `segmentation::sentence`: Sentence merge and split
 *   - `segmentation::bilingual`: Bilingual merge and split
 *   - `segmentation::trim`: Trimming to inner speech activity
 * - `vad`: Detector parameters and the parameter optimizer
 * - `pipeline`: Worker pool, translation batching and the generation run
 * - `providers`: Interfaces of the external collaborators
 * - `language_utils`: ISO language code utilities
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod errors;
pub mod language_utils;
pub mod pipeline;
pub mod providers;
pub mod segmentation;
pub mod subtitle_track;
pub mod timed_word;
pub mod vad;

// Re-export main types for easier usage
pub use app_config::Config;
pub use errors::{AppError, ConfigError, PipelineError, ProviderError, SegmentationError};
pub use language_utils::{get_language_name, language_codes_match, normalize_to_part2t};
pub use pipeline::{CancellationFlag, SubtitleGenerator, WorkerPool};
pub use subtitle_track::{Event, OutputKind, Region, Style, SubtitleTrack};
pub use timed_word::TimedWord;
