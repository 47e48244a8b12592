/*!
 * Interfaces of the external collaborators.
 *
 * The engines never touch audio, speech models or translation services
 * directly. Everything outside the crate is reached through these traits:
 * - `VadProvider`: voice activity detection over an audio file
 * - `AudioSlicer`: extraction of one region into its own fragment
 * - `SpeechRecognizer`: transcription of one fragment
 * - `Translator`: translation of one block of lines
 *
 * Wire-format serialization lives with the track model as `SubtitleSerializer`.
 */

use std::fmt::Debug;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::errors::ProviderError;
use crate::subtitle_track::Region;
use crate::vad::AuditokParams;

/// Voice activity detector
#[async_trait]
pub trait VadProvider: Send + Sync + Debug {
    /// Detect speech regions in an audio file.
    ///
    /// # Arguments
    /// * `audio` - Audio file or fragment to analyse
    /// * `params` - Detection parameters
    ///
    /// # Returns
    /// * `Result<Vec<Region>, ProviderError>` - Regions in milliseconds relative to the file start
    async fn detect_regions(&self, audio: &Path, params: &AuditokParams) -> Result<Vec<Region>, ProviderError>;
}

/// Extracts one region of an audio file into a standalone fragment
#[async_trait]
pub trait AudioSlicer: Send + Sync + Debug {
    /// Cut `[start_ms - margin_before_ms, end_ms + margin_after_ms]` out of `audio`.
    ///
    /// Returns `None` when the fragment could not be produced. The pipeline
    /// keeps a placeholder for it instead of failing.
    async fn extract(
        &self,
        audio: &Path,
        start_ms: u64,
        end_ms: u64,
        margin_before_ms: u64,
        margin_after_ms: u64,
    ) -> Option<PathBuf>;
}

/// Speech-to-text engine
#[async_trait]
pub trait SpeechRecognizer: Send + Sync + Debug {
    /// Transcribe one audio fragment
    async fn transcribe(&self, fragment: &Path) -> Result<String, ProviderError>;
}

/// Machine translation engine
#[async_trait]
pub trait Translator: Send + Sync + Debug {
    /// Translate a block of newline-separated lines.
    ///
    /// The response must contain exactly as many lines as the request.
    async fn translate(
        &self,
        block: &str,
        source_language: &str,
        target_language: &str,
    ) -> Result<String, ProviderError>;
}
