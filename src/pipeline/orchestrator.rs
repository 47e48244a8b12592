/*!
 * End-to-end subtitle generation.
 *
 * A run goes through fixed phases, each one finished before the next starts:
 * 1. speech regions are detected, optionally after tuning the detector
 * 2. each region is extracted into its own audio fragment
 * 3. fragments are optionally re-analysed to trim event bounds
 * 4. fragments are transcribed
 * 5. events are merged and split into readable sentences
 * 6. events are translated in width-bounded batches
 * 7. the requested tracks are assembled, bilingual ones included
 *
 * Per-item provider failures leave an empty placeholder so indices stay
 * aligned across phases. A count mismatch between phases or a cancellation
 * stops the run.
 */

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, info, warn};

use crate::app_config::Config;
use crate::errors::{ConfigError, PipelineError};
use crate::language_utils::language_codes_match;
use crate::providers::{AudioSlicer, SpeechRecognizer, Translator, VadProvider};
use crate::segmentation::sentence::{SegmentationStats, merge_and_split};
use crate::segmentation::{bilingual, trim};
use crate::subtitle_track::{Event, OutputKind, Region, SubtitleTrack};
use crate::vad::{self, AuditokParams};

use super::pool::{CancellationFlag, WorkerPool};
use super::translation_batch::{batch_lines, single_line, split_translated};

/// External collaborators used by a run
#[derive(Debug, Clone)]
pub struct Collaborators {
    pub vad: Arc<dyn VadProvider>,
    pub slicer: Arc<dyn AudioSlicer>,
    pub recognizer: Arc<dyn SpeechRecognizer>,
    /// Only required when a translated output is requested
    pub translator: Option<Arc<dyn Translator>>,
}

/// Everything a run produced
#[derive(Debug, Clone, Default)]
pub struct GenerationOutput {
    /// One track per requested output
    pub tracks: BTreeMap<OutputKind, SubtitleTrack>,
    /// Detector parameters actually used
    pub params: Option<AuditokParams>,
    /// Sentence pass statistics
    pub stats: SegmentationStats,
}

/// Check that a phase returned one result per input
pub fn ensure_count(phase: &'static str, expected: usize, actual: usize) -> Result<(), PipelineError> {
    if expected != actual {
        return Err(PipelineError::CountMismatch { phase, expected, actual });
    }
    Ok(())
}

/// Drives the phases of a subtitle generation run
#[derive(Debug)]
pub struct SubtitleGenerator {
    config: Config,
    pool: WorkerPool,
    providers: Collaborators,
}

impl SubtitleGenerator {
    /// Create a generator after validating the configuration.
    ///
    /// Fails when a translated output is requested without a translator.
    pub fn new(config: Config, providers: Collaborators) -> Result<Self, PipelineError> {
        config.validate()?;
        let needs_translation = config.outputs.iter().any(OutputKind::needs_translation);
        if needs_translation && providers.translator.is_none() && !Self::same_language(&config) {
            return Err(ConfigError::InvalidValue {
                field: "outputs",
                reason: "translated outputs need a translator".to_string(),
            }
            .into());
        }

        Ok(Self {
            pool: WorkerPool::new(config.concurrency),
            config,
            providers,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn same_language(config: &Config) -> bool {
        language_codes_match(&config.source_language, &config.target_language)
    }

    /// Generate every requested track for one audio file
    pub async fn run(&self, audio: &Path, cancel: &CancellationFlag) -> Result<GenerationOutput, PipelineError> {
        let outputs = self.config.requested_outputs();
        let mut output = GenerationOutput::default();

        let params = self.tune_detector(audio, cancel).await?;
        output.params = Some(params);
        cancel.check()?;

        let regions = vad::detect_speech(self.providers.vad.as_ref(), audio, &params).await?;
        info!("Detected {} speech regions", regions.len());
        cancel.check()?;

        if outputs.contains(&OutputKind::Regions) {
            let events = regions
                .iter()
                .map(|r| Event::from_region(*r, self.config.bilingual.source_style.clone()))
                .collect();
            output.tracks.insert(OutputKind::Regions, self.build_track(OutputKind::Regions, events)?);
        }
        if !outputs.iter().any(OutputKind::needs_transcription) {
            return Ok(output);
        }

        let fragments = self.extract_fragments(audio, &regions, cancel).await?;
        ensure_count("extraction", regions.len(), fragments.len())?;

        let coarse: Vec<Event> = regions
            .iter()
            .map(|r| Event::from_region(*r, self.config.bilingual.source_style.clone()))
            .collect();
        let coarse = if self.config.trim.enabled {
            self.trim_to_activity(&coarse, &fragments, &params, cancel).await?
        } else {
            coarse
        };

        let texts = self.transcribe(&fragments, cancel).await?;
        ensure_count("transcription", coarse.len(), texts.len())?;

        let transcribed: Vec<Event> = coarse
            .into_iter()
            .zip(texts)
            .filter_map(|(event, text)| {
                let text = single_line(&text);
                (!text.is_empty()).then_some(Event { text, ..event })
            })
            .collect();
        debug!("{} events carry text after transcription", transcribed.len());

        let (source_events, stats) = merge_and_split(&transcribed, &self.config.segmentation);
        output.stats = stats;
        cancel.check()?;

        if outputs.contains(&OutputKind::Source) {
            output
                .tracks
                .insert(OutputKind::Source, self.build_track(OutputKind::Source, source_events.clone())?);
        }
        if !outputs.iter().any(OutputKind::needs_translation) {
            return Ok(output);
        }

        let destination_events = self.translate_events(&source_events, cancel).await?;
        cancel.check()?;

        self.assemble_translated(&outputs, &source_events, destination_events, &mut output)?;
        Ok(output)
    }

    async fn tune_detector(&self, audio: &Path, cancel: &CancellationFlag) -> Result<AuditokParams, PipelineError> {
        let params = AuditokParams::from(&self.config.auditok);
        if !self.config.optimizer.enabled {
            return Ok(params);
        }

        let best = vad::optimize(
            Arc::clone(&self.providers.vad),
            audio,
            &self.config.auditok,
            &self.config.optimizer,
            &self.pool,
            cancel,
        )
        .await?;
        Ok(params.with_tuning(best.energy_threshold, best.max_continuous_silence_ms))
    }

    async fn extract_fragments(
        &self,
        audio: &Path,
        regions: &[Region],
        cancel: &CancellationFlag,
    ) -> Result<Vec<Option<PathBuf>>, PipelineError> {
        let slicer = Arc::clone(&self.providers.slicer);
        let audio = Arc::new(audio.to_path_buf());
        let margins = &self.config.extraction;
        let (before, after) = (margins.margin_before_ms, margins.margin_after_ms);

        let fragments = self
            .pool
            .map_ordered(
                regions.to_vec(),
                cancel,
                |index, region| {
                    let slicer = Arc::clone(&slicer);
                    let audio = Arc::clone(&audio);
                    async move {
                        let fragment = slicer.extract(&audio, region.start, region.end, before, after).await;
                        if fragment.is_none() {
                            warn!("Could not extract region {} ({}-{} ms)", index, region.start, region.end);
                        }
                        fragment
                    }
                },
                |done, total| debug!("Extracted {}/{}", done, total),
            )
            .await?;

        let missing = fragments.iter().filter(|f| f.is_none()).count();
        if missing > 0 {
            warn!("{} of {} fragments could not be extracted", missing, fragments.len());
        }
        Ok(fragments)
    }

    async fn trim_to_activity(
        &self,
        events: &[Event],
        fragments: &[Option<PathBuf>],
        params: &AuditokParams,
        cancel: &CancellationFlag,
    ) -> Result<Vec<Event>, PipelineError> {
        let vad = Arc::clone(&self.providers.vad);
        let params = *params;

        let activity = self
            .pool
            .map_ordered(
                fragments.to_vec(),
                cancel,
                |index, fragment| {
                    let vad = Arc::clone(&vad);
                    async move {
                        let Some(fragment) = fragment else {
                            return Vec::new();
                        };
                        match vad::detect_speech(vad.as_ref(), &fragment, &params).await {
                            Ok(regions) => regions,
                            Err(e) => {
                                warn!("Inner VAD failed for fragment {}: {}", index, e);
                                Vec::new()
                            }
                        }
                    }
                },
                |done, total| debug!("Analysed {}/{} fragments", done, total),
            )
            .await?;

        let trimmed = trim::trim_events(
            events,
            &activity,
            &self.config.trim,
            self.config.extraction.margin_before_ms,
        )?;
        Ok(trimmed)
    }

    async fn transcribe(
        &self,
        fragments: &[Option<PathBuf>],
        cancel: &CancellationFlag,
    ) -> Result<Vec<String>, PipelineError> {
        let recognizer = Arc::clone(&self.providers.recognizer);

        let texts = self
            .pool
            .map_ordered(
                fragments.to_vec(),
                cancel,
                |index, fragment| {
                    let recognizer = Arc::clone(&recognizer);
                    async move {
                        let Some(fragment) = fragment else {
                            return String::new();
                        };
                        match recognizer.transcribe(&fragment).await {
                            Ok(text) => text,
                            Err(e) => {
                                warn!("Transcription failed for fragment {}: {}", index, e);
                                String::new()
                            }
                        }
                    }
                },
                |done, total| debug!("Transcribed {}/{}", done, total),
            )
            .await?;

        info!("Transcribed {} fragments", texts.len());
        Ok(texts)
    }

    /// Translate events and return them re-styled as destination events
    async fn translate_events(&self, events: &[Event], cancel: &CancellationFlag) -> Result<Vec<Event>, PipelineError> {
        let lines: Vec<String> = events.iter().map(|e| single_line(&e.text)).collect();

        let translated = match (&self.providers.translator, Self::same_language(&self.config)) {
            (_, true) => {
                info!("Source and target languages match, copying source text");
                lines
            }
            (Some(translator), false) => self.translate_lines(Arc::clone(translator), lines, cancel).await?,
            (None, false) => {
                return Err(ConfigError::InvalidValue {
                    field: "outputs",
                    reason: "translated outputs need a translator".to_string(),
                }
                .into());
            }
        };
        ensure_count("translation", events.len(), translated.len())?;

        let style = &self.config.bilingual.destination_style;
        let destination: Vec<Event> = events
            .iter()
            .zip(translated)
            .map(|(event, text)| Event {
                text,
                style: style.clone(),
                ..event.clone()
            })
            .collect();

        if self.config.bilingual.merge_destination {
            let (merged, stats) = merge_and_split(&destination, &self.config.segmentation);
            debug!("Destination pass merged {} and split {}", stats.merged, stats.split);
            return Ok(merged);
        }
        Ok(destination)
    }

    async fn translate_lines(
        &self,
        translator: Arc<dyn Translator>,
        lines: Vec<String>,
        cancel: &CancellationFlag,
    ) -> Result<Vec<String>, PipelineError> {
        let blocks: Vec<(usize, String)> = batch_lines(&lines, self.config.translation.max_batch_width)
            .into_iter()
            .map(|range| (range.len(), lines[range].join("\n")))
            .collect();
        info!("Translating {} lines in {} batches", lines.len(), blocks.len());

        let source = Arc::new(self.config.source_language.clone());
        let target = Arc::new(self.config.target_language.clone());

        let batches = self
            .pool
            .map_ordered(
                blocks,
                cancel,
                |index, (count, block)| {
                    let translator = Arc::clone(&translator);
                    let source = Arc::clone(&source);
                    let target = Arc::clone(&target);
                    async move {
                        match translator.translate(&block, &source, &target).await {
                            Ok(text) => split_translated(&text, count).unwrap_or_else(|| {
                                warn!("Batch {} came back with a different line count", index);
                                vec![String::new(); count]
                            }),
                            Err(e) => {
                                warn!("Translation failed for batch {}: {}", index, e);
                                vec![String::new(); count]
                            }
                        }
                    }
                },
                |done, total| debug!("Translated {}/{} batches", done, total),
            )
            .await?;

        Ok(batches.into_iter().flatten().collect())
    }

    fn assemble_translated(
        &self,
        outputs: &BTreeSet<OutputKind>,
        source: &[Event],
        destination: Vec<Event>,
        output: &mut GenerationOutput,
    ) -> Result<(), PipelineError> {
        if outputs.contains(&OutputKind::SourceOverDestination) {
            let events = bilingual::merge_bilingual(source, &destination);
            output.tracks.insert(
                OutputKind::SourceOverDestination,
                self.build_track(OutputKind::SourceOverDestination, events)?,
            );
        }
        if outputs.contains(&OutputKind::DestinationOverSource) {
            let events = bilingual::merge_bilingual(&destination, source);
            output.tracks.insert(
                OutputKind::DestinationOverSource,
                self.build_track(OutputKind::DestinationOverSource, events)?,
            );
        }
        if outputs.contains(&OutputKind::Destination) {
            output
                .tracks
                .insert(OutputKind::Destination, self.build_track(OutputKind::Destination, destination)?);
        }
        Ok(())
    }

    fn build_track(&self, kind: OutputKind, events: Vec<Event>) -> Result<SubtitleTrack, PipelineError> {
        let mut track = SubtitleTrack::with_styles(self.config.styles.iter().cloned());
        track.push_events(events)?;
        track.sort_events();
        track.info.insert("output".to_string(), kind.to_string());
        track
            .info
            .insert("source_language".to_string(), self.config.source_language.clone());
        if kind.needs_translation() {
            track
                .info
                .insert("target_language".to_string(), self.config.target_language.clone());
        }
        debug!("Built {} track with {} events", kind, track.events.len());
        Ok(track)
    }
}
