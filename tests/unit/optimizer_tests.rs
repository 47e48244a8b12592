/*!
 * Tests for the VAD parameter optimizer
 */

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::Ordering;

use yastgen::app_config::{AuditokConfig, OptimizerConfig};
use yastgen::errors::PipelineError;
use yastgen::pipeline::{CancellationFlag, WorkerPool};
use yastgen::subtitle_track::Region;
use yastgen::vad::optimize;
use crate::common::{self, mock_providers::MockVad};

fn steady_regions() -> Vec<Region> {
    vec![Region::new(0, 2000), Region::new(3000, 6000), Region::new(7000, 9500)]
}

/// Identical statistics everywhere select the first grid point
#[tokio::test]
async fn test_optimize_withIdenticalStats_shouldReturnFirstCandidate() {
    common::init_logging();
    let vad = Arc::new(MockVad::with_regions(steady_regions()));

    let best = optimize(
        vad.clone(),
        Path::new("audio.wav"),
        &AuditokConfig::default(),
        &OptimizerConfig::default(),
        &WorkerPool::new(4),
        &CancellationFlag::new(),
    )
    .await
    .expect("optimizer should succeed");

    assert_eq!(best.energy_threshold, 40);
    assert_eq!(best.max_continuous_silence_ms, 250);
    assert_eq!(best.stats.count, 3);
    assert_eq!(vad.calls.load(Ordering::SeqCst), 9);
}

/// Grid points whose detection fails are skipped
#[tokio::test]
async fn test_optimize_withFailingGridPoint_shouldSkipIt() {
    let mut vad = MockVad::with_regions(steady_regions());
    vad.failing_energies.insert(40);

    let best = optimize(
        Arc::new(vad),
        Path::new("audio.wav"),
        &AuditokConfig::default(),
        &OptimizerConfig::default(),
        &WorkerPool::new(2),
        &CancellationFlag::new(),
    )
    .await
    .expect("optimizer should succeed");

    assert_eq!((best.energy_threshold, best.max_continuous_silence_ms), (50, 250));
}

/// Grid points that detect nothing lose to any that detect speech
#[tokio::test]
async fn test_optimize_withSilentGridPoint_shouldPreferSpeech() {
    let mut vad = MockVad::with_regions(steady_regions());
    vad.per_energy.insert(40, Vec::new());

    let best = optimize(
        Arc::new(vad),
        Path::new("audio.wav"),
        &AuditokConfig::default(),
        &OptimizerConfig::default(),
        &WorkerPool::new(3),
        &CancellationFlag::new(),
    )
    .await
    .expect("optimizer should succeed");

    assert_eq!(best.energy_threshold, 50);
}

/// Fewer small and big regions win
#[tokio::test]
async fn test_optimize_withBetterGridPoint_shouldSelectIt() {
    let mut vad = MockVad::with_regions(vec![Region::new(0, 300), Region::new(1000, 9000)]);
    vad.per_energy.insert(60, steady_regions());

    let best = optimize(
        Arc::new(vad),
        Path::new("audio.wav"),
        &AuditokConfig::default(),
        &OptimizerConfig::default(),
        &WorkerPool::new(3),
        &CancellationFlag::new(),
    )
    .await
    .expect("optimizer should succeed");

    assert_eq!((best.energy_threshold, best.max_continuous_silence_ms), (60, 250));
    assert_eq!(best.stats.small, 0);
    assert_eq!(best.stats.big, 0);
}

/// A grid where every point fails reports it instead of guessing
#[tokio::test]
async fn test_optimize_withAllGridPointsFailing_shouldReportNoCandidate() {
    let mut vad = MockVad::with_regions(steady_regions());
    vad.failing_energies.extend([40, 50, 60]);

    let result = optimize(
        Arc::new(vad),
        Path::new("audio.wav"),
        &AuditokConfig::default(),
        &OptimizerConfig::default(),
        &WorkerPool::new(3),
        &CancellationFlag::new(),
    )
    .await;

    assert!(matches!(result, Err(PipelineError::NoViableCandidate(9))));
}

/// Cancellation stops the search
#[tokio::test]
async fn test_optimize_withCancelledFlag_shouldStop() {
    let vad = Arc::new(MockVad::with_regions(steady_regions()));
    let cancel = CancellationFlag::new();
    cancel.cancel();

    let result = optimize(
        vad.clone(),
        Path::new("audio.wav"),
        &AuditokConfig::default(),
        &OptimizerConfig::default(),
        &WorkerPool::new(3),
        &cancel,
    )
    .await;

    assert!(matches!(result, Err(PipelineError::Cancelled)));
    assert_eq!(vad.calls.load(Ordering::SeqCst), 0);
}
