//! Mono sample buffer shared by every analysis stage

use crate::error::AnalysisError;

/// Samples whose absolute value stays below this are treated as silence
const SILENCE_FLOOR: f32 = 1e-10;

/// Immutable mono signal with its sample rate
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBuffer {
    /// Mono samples, nominally in [-1.0, 1.0]
    samples: Vec<f32>,
    /// Sample rate in Hz (always > 0)
    sample_rate: u32,
}

impl SampleBuffer {
    /// Create a new sample buffer
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::InvalidInput` if `sample_rate` is zero.
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Result<Self, AnalysisError> {
        if sample_rate == 0 {
            return Err(AnalysisError::InvalidInput(
                "Sample rate must be > 0".to_string(),
            ));
        }
        Ok(Self {
            samples,
            sample_rate,
        })
    }

    /// Buffer of `len` zeros at `sample_rate`
    pub fn silent(len: usize, sample_rate: u32) -> Result<Self, AnalysisError> {
        Self::new(vec![0.0; len], sample_rate)
    }

    /// Samples as a slice
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Consume the buffer, returning its samples
    pub fn into_samples(self) -> Vec<f32> {
        self.samples
    }

    /// Sample rate in Hz
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of samples
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// True if the buffer holds no samples
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in seconds
    pub fn duration_seconds(&self) -> f32 {
        self.samples.len() as f32 / self.sample_rate as f32
    }

    /// Largest absolute sample value
    pub fn peak(&self) -> f32 {
        self.samples.iter().fold(0.0f32, |acc, &s| acc.max(s.abs()))
    }

    /// True if every sample is (numerically) zero
    pub fn is_silent(&self) -> bool {
        self.peak() < SILENCE_FLOOR
    }
}
