/*!
 * Voice activity detection.
 *
 * Detection itself is delegated to a `VadProvider`. This module owns the
 * parameter set handed to it and the clean-up of whatever region list comes
 * back, and hosts the parameter optimizer.
 */

use std::path::Path;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::app_config::AuditokConfig;
use crate::errors::ProviderError;
use crate::providers::VadProvider;
use crate::subtitle_track::Region;

pub mod optimizer;

pub use optimizer::{ParameterCandidate, RegionStats, optimize};

/// Detection parameters for one VAD run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditokParams {
    pub energy_threshold: u32,
    pub min_region_ms: u64,
    pub max_region_ms: u64,
    pub max_continuous_silence_ms: u64,
    pub strict_min_length: bool,
    pub drop_trailing_silence: bool,
}

impl AuditokParams {
    /// Same parameters with the two optimized values replaced
    pub fn with_tuning(self, energy_threshold: u32, max_continuous_silence_ms: u64) -> Self {
        Self {
            energy_threshold,
            max_continuous_silence_ms,
            ..self
        }
    }
}

impl From<&AuditokConfig> for AuditokParams {
    fn from(config: &AuditokConfig) -> Self {
        Self {
            energy_threshold: config.energy_threshold,
            min_region_ms: config.min_region_ms,
            max_region_ms: config.max_region_ms,
            max_continuous_silence_ms: config.max_continuous_silence_ms,
            strict_min_length: config.strict_min_length,
            drop_trailing_silence: config.drop_trailing_silence,
        }
    }
}

/// Sort regions and clamp them so that none overlaps the previous one.
///
/// Regions left empty by the clamping are dropped.
pub fn normalize_regions(mut regions: Vec<Region>) -> Vec<Region> {
    regions.sort_by_key(|r| (r.start, r.end));
    let mut normalized: Vec<Region> = Vec::with_capacity(regions.len());
    for mut region in regions {
        if let Some(prev) = normalized.last() {
            region.start = region.start.max(prev.end);
        }
        if region.end > region.start {
            normalized.push(region);
        } else {
            debug!("Dropping empty region at {} ms", region.start);
        }
    }
    normalized
}

/// Run the detector and normalize its output
pub async fn detect_speech(
    vad: &dyn VadProvider,
    audio: &Path,
    params: &AuditokParams,
) -> Result<Vec<Region>, ProviderError> {
    let raw = vad.detect_regions(audio, params).await?;
    let count = raw.len();
    let regions = normalize_regions(raw);
    if regions.len() != count {
        warn!("VAD returned {} regions, {} usable after normalization", count, regions.len());
    }
    debug!(
        "Detected {} regions with energy {} and silence {} ms",
        regions.len(),
        params.energy_threshold,
        params.max_continuous_silence_ms
    );
    Ok(regions)
}
