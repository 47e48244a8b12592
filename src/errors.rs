/*!
 * Error types for the yastgen application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 *
 * Per-item failures of external collaborators are `ProviderError`s and are
 * absorbed by the pipeline as empty placeholders. Everything that indicates
 * corrupted data or an invalid setup surfaces as a `PipelineError` or
 * `ConfigError` and stops processing.
 */

use thiserror::Error;

/// Errors reported by external collaborators (VAD, slicer, ASR, translator)
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    /// The request to the service failed
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// The service response could not be understood
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// A subprocess exited with a non-zero status
    #[error("Process '{program}' exited with status {status}: {message}")]
    ProcessFailed {
        /// Program that was run
        program: String,
        /// Exit status code
        status: i32,
        /// Filtered stderr output
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// The audio source could not be read
    #[error("Audio error: {0}")]
    AudioError(String),
}

/// Errors raised by the segmentation engines
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SegmentationError {
    /// The coarse event list ran out before every word was bound
    #[error(
        "Coarse events exhausted after {bound_words} of {total_words} words ({events} events); manual alignment required"
    )]
    AlignmentInsufficient {
        /// Words bound before the event list ran out
        bound_words: usize,
        /// Total number of words to bind
        total_words: usize,
        /// Number of coarse events supplied
        events: usize,
    },

    /// Two lists that must correspond index by index have different lengths
    #[error("{what}: expected {expected} items, got {actual}")]
    CountMismatch {
        /// What was being paired
        what: &'static str,
        /// Expected length
        expected: usize,
        /// Actual length
        actual: usize,
    },
}

/// Configuration errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// A numeric range whose bounds are inconsistent
    #[error("Invalid range for {field}: {min} > {max}")]
    InvalidRange {
        /// Name of the offending setting
        field: &'static str,
        /// Lower bound
        min: String,
        /// Upper bound
        max: String,
    },

    /// A setting with an unusable value
    #[error("Invalid value for {field}: {reason}")]
    InvalidValue {
        /// Name of the offending setting
        field: &'static str,
        /// Why the value was rejected
        reason: String,
    },

    /// A style name that is not in the style table
    #[error("Unknown style: {0}")]
    UnknownStyle(String),

    /// A language code that is not ISO 639-1/639-2
    #[error("Invalid language code: {0}")]
    InvalidLanguage(String),
}

/// Errors that stop a pipeline phase
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The user interrupted the phase; nothing downstream may run
    #[error("Processing cancelled")]
    Cancelled,

    /// A phase produced a different number of results than it was given
    #[error("Result count mismatch in {phase}: expected {expected}, got {actual}")]
    CountMismatch {
        /// Phase that produced the results
        phase: &'static str,
        /// Number of inputs
        expected: usize,
        /// Number of results
        actual: usize,
    },

    /// A worker task panicked or could not be joined
    #[error("Worker failed: {0}")]
    WorkerFailed(String),

    /// Every optimizer candidate failed to evaluate
    #[error("No viable parameter candidate among {0} grid points")]
    NoViableCandidate(usize),

    /// A provider failure that cannot be absorbed per item
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error from a segmentation engine
    #[error("Segmentation error: {0}")]
    Segmentation(#[from] SegmentationError),

    /// Error in the configuration
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from a provider
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error from segmentation
    #[error("Segmentation error: {0}")]
    Segmentation(#[from] SegmentationError),

    /// Error from configuration
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Error from the pipeline
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}

impl PipelineError {
    /// Whether the error came from a user interrupt rather than a failure
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
