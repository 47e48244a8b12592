/*!
 * Grid search over VAD parameters.
 *
 * The energy threshold and the tolerated continuous silence are sampled on a
 * grid of interior points of their configured ranges. The detector runs once
 * per grid point and each result is scored on three criteria: how many
 * regions are too small, how many are too big, and how far the mean region
 * length lies from the middle of the allowed length range. Candidates are
 * ranked on each criterion separately and the one with the lowest sum of
 * ranks wins.
 */

use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::app_config::{AuditokConfig, OptimizerConfig};
use crate::errors::PipelineError;
use crate::pipeline::pool::{CancellationFlag, WorkerPool};
use crate::providers::VadProvider;
use crate::subtitle_track::Region;

use super::{AuditokParams, detect_speech};

/// Quality figures of one detection run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionStats {
    /// Number of regions detected
    pub count: usize,
    /// Regions shorter than the small threshold
    pub small: usize,
    /// Regions longer than the big threshold
    pub big: usize,
    /// Distance of the mean region length from the ideal length, in ms
    pub mean_deviation_ms: u64,
}

impl RegionStats {
    pub fn from_regions(regions: &[Region], small_ms: u64, big_ms: u64, ideal_ms: u64) -> Self {
        let count = regions.len();
        let total: u64 = regions.iter().map(Region::duration).sum();
        let mean = if count == 0 { 0 } else { total / count as u64 };
        Self {
            count,
            small: regions.iter().filter(|r| r.duration() < small_ms).count(),
            big: regions.iter().filter(|r| r.duration() > big_ms).count(),
            mean_deviation_ms: mean.abs_diff(ideal_ms),
        }
    }
}

/// One evaluated grid point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterCandidate {
    pub energy_threshold: u32,
    pub max_continuous_silence_ms: u64,
    pub stats: RegionStats,
}

/// `passes` evenly spaced interior points of `[min, max]`, bounds swapped if reversed
pub fn interior_points(min: u64, max: u64, passes: usize) -> Vec<u64> {
    let (low, high) = if min > max { (max, min) } else { (min, max) };
    let steps = passes as u64 + 1;
    (1..=passes as u64).map(|k| low + (high - low) * k / steps).collect()
}

/// Every (energy, silence) pair to evaluate, energy in the outer loop
pub fn build_grid(config: &OptimizerConfig) -> Vec<(u32, u64)> {
    let energies = interior_points(config.energy_min as u64, config.energy_max as u64, config.energy_passes);
    let silences = interior_points(config.silence_min_ms, config.silence_max_ms, config.silence_passes);

    let mut grid = Vec::with_capacity(energies.len() * silences.len());
    for &energy in &energies {
        for &silence in &silences {
            // Interior points of a u32 range always fit a u32
            grid.push((u32::try_from(energy).unwrap_or(u32::MAX), silence));
        }
    }
    grid
}

/// Index of the best candidate by rank sum; ties go to the earliest
pub fn select_best(candidates: &[ParameterCandidate]) -> Option<usize> {
    if candidates.is_empty() {
        return None;
    }

    let mut rank_sum = vec![0usize; candidates.len()];
    let criteria: [fn(&RegionStats) -> u64; 3] = [
        |s| s.small as u64,
        |s| s.big as u64,
        |s| s.mean_deviation_ms,
    ];
    for key in criteria {
        let mut order: Vec<usize> = (0..candidates.len()).collect();
        order.sort_by_key(|&i| key(&candidates[i].stats));
        for (rank, &i) in order.iter().enumerate() {
            rank_sum[i] += rank;
        }
    }

    rank_sum
        .iter()
        .enumerate()
        .min_by_key(|&(i, &sum)| (sum, i))
        .map(|(i, _)| i)
}

/// Search the grid and return the best parameter pair.
///
/// Grid points whose detection fails are left out. Points that detect no
/// speech at all are only considered when nothing else detected any.
pub async fn optimize(
    vad: Arc<dyn VadProvider>,
    audio: &Path,
    base: &AuditokConfig,
    config: &OptimizerConfig,
    pool: &WorkerPool,
    cancel: &CancellationFlag,
) -> Result<ParameterCandidate, PipelineError> {
    let grid = build_grid(config);
    let grid_size = grid.len();
    let base_params = AuditokParams::from(base);
    let ideal_ms = (base.min_region_ms + base.max_region_ms) / 2;
    let (small_ms, big_ms) = (config.small_region_ms, config.big_region_ms);
    let audio: Arc<PathBuf> = Arc::new(audio.to_path_buf());

    info!("Optimizing VAD parameters over {} grid points", grid_size);

    let evaluated = pool
        .map_ordered(
            grid,
            cancel,
            |_, (energy, silence)| {
                let vad = Arc::clone(&vad);
                let audio = Arc::clone(&audio);
                let params = base_params.with_tuning(energy, silence);
                async move {
                    match detect_speech(vad.as_ref(), &audio, &params).await {
                        Ok(regions) => Some(ParameterCandidate {
                            energy_threshold: energy,
                            max_continuous_silence_ms: silence,
                            stats: RegionStats::from_regions(&regions, small_ms, big_ms, ideal_ms),
                        }),
                        Err(e) => {
                            warn!("VAD failed for energy {} silence {} ms: {}", energy, silence, e);
                            None
                        }
                    }
                }
            },
            |done, total| debug!("Optimizer progress {}/{}", done, total),
        )
        .await?;

    let viable: Vec<ParameterCandidate> = evaluated.into_iter().flatten().collect();
    let speaking: Vec<ParameterCandidate> = viable.iter().copied().filter(|c| c.stats.count > 0).collect();
    let pool_of_choice = if speaking.is_empty() { &viable } else { &speaking };

    let best = select_best(pool_of_choice)
        .map(|i| pool_of_choice[i])
        .ok_or(PipelineError::NoViableCandidate(grid_size))?;

    info!(
        "Selected energy threshold {} and max silence {} ms ({} regions, {} small, {} big)",
        best.energy_threshold,
        best.max_continuous_silence_ms,
        best.stats.count,
        best.stats.small,
        best.stats.big
    );
    Ok(best)
}
