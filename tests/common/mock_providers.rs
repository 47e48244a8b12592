/*!
 * Mock provider implementations for testing
 *
 * This module provides in-memory implementations of every collaborator
 * trait so that no audio, speech model or translation service is needed in
 * tests. Each mock returns predetermined responses and counts its calls.
 */

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use yastgen::errors::ProviderError;
use yastgen::pipeline::{CancellationFlag, Collaborators};
use yastgen::providers::{AudioSlicer, SpeechRecognizer, Translator, VadProvider};
use yastgen::subtitle_track::Region;
use yastgen::vad::AuditokParams;

/// File name the mock slicer gives the fragment of a region
pub fn fragment_name(start: u64, end: u64) -> String {
    format!("fragment_{}_{}.wav", start, end)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Mock voice activity detector
#[derive(Debug, Default)]
pub struct MockVad {
    /// Regions returned for the full audio file
    pub regions: Vec<Region>,
    /// Regions returned for individual fragments, keyed by file name
    pub fragment_activity: HashMap<String, Vec<Region>>,
    /// Regions returned for the full audio file at a given energy threshold
    pub per_energy: HashMap<u32, Vec<Region>>,
    /// Energy thresholds for which detection fails
    pub failing_energies: HashSet<u32>,
    /// Number of calls made
    pub calls: AtomicUsize,
}

impl MockVad {
    pub fn with_regions(regions: Vec<Region>) -> Self {
        MockVad {
            regions,
            ..MockVad::default()
        }
    }
}

#[async_trait]
impl VadProvider for MockVad {
    async fn detect_regions(&self, audio: &Path, params: &AuditokParams) -> Result<Vec<Region>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_energies.contains(&params.energy_threshold) {
            return Err(ProviderError::ProcessFailed {
                program: "vad".to_string(),
                status: 1,
                message: format!("energy {} rejected", params.energy_threshold),
            });
        }
        if let Some(activity) = self.fragment_activity.get(&file_name(audio)) {
            return Ok(activity.clone());
        }
        match self.per_energy.get(&params.energy_threshold) {
            Some(regions) => Ok(regions.clone()),
            None => Ok(self.regions.clone()),
        }
    }
}

/// Mock audio slicer naming each fragment after its region
#[derive(Debug, Default)]
pub struct MockSlicer {
    /// Region starts for which extraction fails
    pub failing_starts: HashSet<u64>,
}

#[async_trait]
impl AudioSlicer for MockSlicer {
    async fn extract(
        &self,
        _audio: &Path,
        start_ms: u64,
        end_ms: u64,
        _margin_before_ms: u64,
        _margin_after_ms: u64,
    ) -> Option<PathBuf> {
        if self.failing_starts.contains(&start_ms) {
            return None;
        }
        Some(PathBuf::from(fragment_name(start_ms, end_ms)))
    }
}

/// Mock speech recognizer with a fixed transcript per fragment
#[derive(Debug, Default)]
pub struct MockRecognizer {
    /// Transcript per fragment file name
    pub transcripts: HashMap<String, String>,
    /// Fragments for which transcription fails
    pub failing: HashSet<String>,
    /// Vary completion order by sleeping a few milliseconds per call
    pub jitter: bool,
    /// Raise this flag on the first call and never finish
    pub cancel_on_call: Option<CancellationFlag>,
    /// Number of calls made
    pub calls: AtomicUsize,
}

impl MockRecognizer {
    /// Recognizer answering `texts[i]` for the fragment of `regions[i]`
    pub fn for_regions(regions: &[Region], texts: &[&str]) -> Self {
        MockRecognizer {
            transcripts: regions
                .iter()
                .zip(texts)
                .map(|(r, t)| (fragment_name(r.start, r.end), t.to_string()))
                .collect(),
            ..MockRecognizer::default()
        }
    }
}

#[async_trait]
impl SpeechRecognizer for MockRecognizer {
    async fn transcribe(&self, fragment: &Path) -> Result<String, ProviderError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(flag) = &self.cancel_on_call {
            flag.cancel();
            tokio::time::sleep(Duration::from_secs(30)).await;
        }
        if self.jitter {
            tokio::time::sleep(Duration::from_millis(((call * 7) % 5) as u64 * 3)).await;
        }

        let name = file_name(fragment);
        if self.failing.contains(&name) {
            return Err(ProviderError::RequestFailed(format!("cannot transcribe {}", name)));
        }
        Ok(self.transcripts.get(&name).cloned().unwrap_or_default())
    }
}

/// How the mock translator misbehaves
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MockTranslatorMode {
    /// Prefix every line with the target language
    #[default]
    Prefix,
    /// Fail every request
    Fail,
    /// Return one line less than requested
    DropLine,
}

/// Mock translator working line by line
#[derive(Debug, Default)]
pub struct MockTranslator {
    pub mode: MockTranslatorMode,
    /// Number of calls made
    pub calls: AtomicUsize,
}

impl MockTranslator {
    pub fn new(mode: MockTranslatorMode) -> Self {
        MockTranslator {
            mode,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl Translator for MockTranslator {
    async fn translate(
        &self,
        block: &str,
        _source_language: &str,
        target_language: &str,
    ) -> Result<String, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let lines: Vec<String> = block
            .split('\n')
            .map(|line| format!("[{}] {}", target_language, line))
            .collect();

        match self.mode {
            MockTranslatorMode::Prefix => Ok(lines.join("\n")),
            MockTranslatorMode::Fail => Err(ProviderError::ConnectionError("translator offline".to_string())),
            MockTranslatorMode::DropLine => Ok(lines[..lines.len().saturating_sub(1)].join("\n")),
        }
    }
}

/// Collaborators built from the given mocks
pub fn collaborators(
    vad: MockVad,
    recognizer: MockRecognizer,
    translator: Option<MockTranslator>,
) -> Collaborators {
    Collaborators {
        vad: Arc::new(vad),
        slicer: Arc::new(MockSlicer::default()),
        recognizer: Arc::new(recognizer),
        translator: translator.map(|t| Arc::new(t) as Arc<dyn Translator>),
    }
}
