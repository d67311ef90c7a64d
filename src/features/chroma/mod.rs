//! Pitch-class feature extraction
//!
//! Three views of the harmonic signal, each reduced to one time-averaged
//! profile:
//! - STFT chroma (12 bins)
//! - HPCP from a constant-Q transform folded to 12 bins
//! - Tonnetz, a 6-D tonal centroid projection of the constant-Q chroma

pub mod cqt;
pub mod extractor;
pub mod hpcp;
pub mod normalization;
pub mod smoothing;
pub mod tonnetz;

use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;

/// One 12-bin pitch-class vector per frame (index 0 = C)
pub type Chromagram = Vec<[f32; 12]>;

/// Which extractor produced a profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeatureKind {
    /// STFT chroma
    Chroma,
    /// Constant-Q harmonic pitch class profile
    Hpcp,
    /// Tonal centroid (tonnetz)
    Tonnetz,
}

impl FeatureKind {
    /// Profile length for this feature
    pub fn dims(self) -> usize {
        match self {
            FeatureKind::Chroma | FeatureKind::Hpcp => 12,
            FeatureKind::Tonnetz => 6,
        }
    }

    /// Lowercase name used in logs
    pub fn name(self) -> &'static str {
        match self {
            FeatureKind::Chroma => "chroma",
            FeatureKind::Hpcp => "hpcp",
            FeatureKind::Tonnetz => "tonnetz",
        }
    }
}

/// Time-averaged feature vector of fixed length
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PitchClassProfile {
    kind: FeatureKind,
    values: Vec<f32>,
}

impl PitchClassProfile {
    /// Create a profile, checking its length against `kind`
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::InvalidInput` if `values.len() != kind.dims()`.
    pub fn new(kind: FeatureKind, values: Vec<f32>) -> Result<Self, AnalysisError> {
        if values.len() != kind.dims() {
            return Err(AnalysisError::InvalidInput(format!(
                "{} profile must have {} values, got {}",
                kind.name(),
                kind.dims(),
                values.len()
            )));
        }
        Ok(Self { kind, values })
    }

    /// Feature that produced this profile
    pub fn kind(&self) -> FeatureKind {
        self.kind
    }

    /// Profile values
    pub fn values(&self) -> &[f32] {
        &self.values
    }
}

/// Mean of each dimension over all frames (zeros when there are no frames)
pub fn time_average<const N: usize>(frames: &[[f32; N]]) -> Vec<f32> {
    let mut mean = vec![0.0f32; N];
    if frames.is_empty() {
        return mean;
    }
    for frame in frames {
        for (m, &x) in mean.iter_mut().zip(frame.iter()) {
            *m += x;
        }
    }
    let scale = 1.0 / frames.len() as f32;
    mean.iter_mut().for_each(|m| *m *= scale);
    mean
}
