//! Tonal centroid features (tonnetz)
//!
//! Projects each L1-normalised chroma frame onto three circles: fifths,
//! minor thirds and major thirds. Each circle contributes a (sin, cos) pair,
//! giving a 6-D point per frame.
//!
//! # Reference
//!
//! Harte, C., Sandler, M., & Gasser, M. (2006). Detecting Harmonic Change in
//! Musical Audio. *Proceedings of the 1st ACM Workshop on Audio and Music
//! Computing Multimedia*, 21-26.

use std::f32::consts::PI;

use super::cqt::chroma_cqt;
use super::normalization::normalize_l1;
use super::{time_average, FeatureKind, PitchClassProfile};
use crate::config::AnalysisConfig;
use crate::error::AnalysisError;

/// (angular step per pitch class in units of pi, radius) for each circle
const CIRCLES: [(f32, f32); 3] = [(7.0 / 6.0, 1.0), (3.0 / 2.0, 1.0), (2.0 / 3.0, 0.5)];

/// Tonal centroid of one 12-bin pitch-class vector
///
/// The vector is L1-normalised first; an all-zero vector maps to the origin.
/// Output order is `[sin, cos]` for fifths, minor thirds, then major thirds.
pub fn project(chroma: &[f32; 12]) -> [f32; 6] {
    let mut weights = *chroma;
    normalize_l1(&mut weights);

    let mut centroid = [0.0f32; 6];
    for (pair, &(step, radius)) in centroid.chunks_exact_mut(2).zip(CIRCLES.iter()) {
        for (c, &w) in weights.iter().enumerate() {
            let angle = PI * step * c as f32;
            pair[0] += radius * angle.sin() * w;
            pair[1] += radius * angle.cos() * w;
        }
    }
    centroid
}

/// Tonal centroid of every frame of a chromagram
pub fn tonnetz_frames(chromagram: &[[f32; 12]]) -> Vec<[f32; 6]> {
    chromagram.iter().map(project).collect()
}

/// Time-averaged tonnetz profile from an already computed chromagram
pub fn tonnetz_profile(chromagram: &[[f32; 12]]) -> Result<PitchClassProfile, AnalysisError> {
    let frames = tonnetz_frames(chromagram);
    PitchClassProfile::new(FeatureKind::Tonnetz, time_average(&frames))
}

/// Extract the time-averaged tonnetz profile of a signal
///
/// Computes its own constant-Q chromagram; the profile is not smoothed.
///
/// # Arguments
///
/// * `samples` - Harmonic component of the signal
/// * `sample_rate` - Sample rate in Hz
/// * `config` - Uses the `cqt_*` fields
pub fn extract_tonnetz(
    samples: &[f32],
    sample_rate: u32,
    config: &AnalysisConfig,
) -> Result<PitchClassProfile, AnalysisError> {
    let chromagram = chroma_cqt(samples, sample_rate, config)?;
    tonnetz_profile(&chromagram)
}
