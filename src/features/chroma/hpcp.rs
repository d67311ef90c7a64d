//! Harmonic pitch class profile (HPCP)
//!
//! Constant-Q chroma averaged over time and smoothed across neighbouring
//! pitch classes. The finer log-frequency resolution of the constant-Q
//! transform makes this a sharper companion to the STFT chroma.

use super::cqt::chroma_cqt;
use super::smoothing::smooth_circular;
use super::{time_average, FeatureKind, PitchClassProfile};
use crate::config::AnalysisConfig;
use crate::error::AnalysisError;

/// HPCP profile from an already computed constant-Q chromagram
pub fn hpcp_profile(chromagram: &[[f32; 12]], window: usize) -> Result<PitchClassProfile, AnalysisError> {
    let mean = time_average(chromagram);
    PitchClassProfile::new(FeatureKind::Hpcp, smooth_circular(&mean, window))
}

/// Extract the smoothed, time-averaged HPCP profile of a signal
///
/// # Arguments
///
/// * `samples` - Harmonic component of the signal
/// * `sample_rate` - Sample rate in Hz
/// * `config` - Uses the `cqt_*` fields and `smoothing_window`
///
/// # Returns
///
/// 12-value `PitchClassProfile` of kind `Hpcp`
pub fn extract_hpcp(
    samples: &[f32],
    sample_rate: u32,
    config: &AnalysisConfig,
) -> Result<PitchClassProfile, AnalysisError> {
    let chromagram = chroma_cqt(samples, sample_rate, config)?;
    hpcp_profile(&chromagram, config.smoothing_window)
}
