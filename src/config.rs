//! Configuration parameters for key analysis

use std::path::PathBuf;

use crate::error::AnalysisError;
use crate::features::key::templates::{TemplateSet, TonnetzTemplate};

/// Frequency of C1 in Hz, the lowest constant-Q bin by default
pub const C1_HZ: f32 = 32.703_197;

/// Analysis configuration parameters
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    // Loading
    /// Sample rate the signal is resampled to before analysis (default: 22050)
    pub target_sample_rate: u32,

    /// Directory for the intermediate WAV file (default: None = system temp dir)
    pub intermediate_dir: Option<PathBuf>,

    // Harmonic-percussive separation
    /// STFT frame size for HPSS (default: 2048)
    pub hpss_frame_size: usize,

    /// STFT hop size for HPSS (default: 512)
    pub hpss_hop_size: usize,

    /// Median filter length in frames/bins (default: 31, must be odd)
    pub hpss_kernel_size: usize,

    /// Soft mask exponent (default: 2.0)
    pub hpss_power: f32,

    /// Soft mask margin (default: 1.0)
    pub hpss_margin: f32,

    // STFT chroma
    /// STFT frame size for chroma (default: 4096)
    pub chroma_frame_size: usize,

    /// STFT hop size for chroma (default: 512)
    pub chroma_hop_size: usize,

    /// Tuning deviation from A440 in fractions of a chroma bin (default: 0.0)
    pub tuning: f32,

    // Constant-Q (HPCP and tonnetz)
    /// Hop size for the constant-Q transform (default: 512)
    pub cqt_hop_size: usize,

    /// Lowest constant-Q bin frequency in Hz (default: C1, ~32.70 Hz)
    pub cqt_fmin: f32,

    /// Number of octaves covered by the constant-Q transform (default: 7)
    pub cqt_octaves: usize,

    /// Constant-Q bins per octave (default: 36, must be a multiple of 12)
    pub cqt_bins_per_octave: usize,

    /// Fraction of each kernel's L1 mass dropped when sparsifying (default: 0.01)
    pub cqt_sparsity: f32,

    // Profiles and matching
    /// Circular smoothing window for chroma and HPCP profiles (default: 3, must be odd)
    pub smoothing_window: usize,

    /// Major/minor template family (default: Temperley)
    pub template_set: TemplateSet,

    /// How tonnetz templates are derived per rotation (default: TonalCentroid)
    pub tonnetz_template: TonnetzTemplate,

    /// Pass the 12-bin templates through the profile smoothing (default: true)
    pub smooth_templates: bool,

    /// Run the STFT chroma and constant-Q extraction concurrently (default: true)
    pub parallel_extraction: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            target_sample_rate: 22050,
            intermediate_dir: None,
            hpss_frame_size: 2048,
            hpss_hop_size: 512,
            hpss_kernel_size: 31,
            hpss_power: 2.0,
            hpss_margin: 1.0,
            chroma_frame_size: 4096,
            chroma_hop_size: 512,
            tuning: 0.0,
            cqt_hop_size: 512,
            cqt_fmin: C1_HZ,
            cqt_octaves: 7,
            cqt_bins_per_octave: 36,
            cqt_sparsity: 0.01,
            smoothing_window: 3,
            template_set: TemplateSet::default(),
            tonnetz_template: TonnetzTemplate::default(),
            smooth_templates: true,
            parallel_extraction: true,
        }
    }
}

impl AnalysisConfig {
    /// Check parameter ranges before any audio is touched
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::InvalidInput` naming the first offending field.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        fn invalid(msg: String) -> Result<(), AnalysisError> {
            Err(AnalysisError::InvalidInput(msg))
        }

        if self.target_sample_rate == 0 {
            return invalid("target_sample_rate must be > 0".to_string());
        }
        for (name, frame, hop) in [
            ("hpss", self.hpss_frame_size, self.hpss_hop_size),
            ("chroma", self.chroma_frame_size, self.chroma_hop_size),
        ] {
            if frame < 2 || frame % 2 != 0 {
                return invalid(format!("{}_frame_size must be even and >= 2, got {}", name, frame));
            }
            if hop == 0 {
                return invalid(format!("{}_hop_size must be > 0", name));
            }
        }
        if self.cqt_hop_size == 0 {
            return invalid("cqt_hop_size must be > 0".to_string());
        }
        if self.hpss_kernel_size == 0 || self.hpss_kernel_size % 2 == 0 {
            return invalid(format!(
                "hpss_kernel_size must be odd, got {}",
                self.hpss_kernel_size
            ));
        }
        if !(self.hpss_power.is_finite() && self.hpss_power > 0.0) {
            return invalid(format!("hpss_power must be > 0, got {}", self.hpss_power));
        }
        if !(self.hpss_margin.is_finite() && self.hpss_margin >= 1.0) {
            return invalid(format!("hpss_margin must be >= 1, got {}", self.hpss_margin));
        }
        if !self.tuning.is_finite() || self.tuning.abs() > 0.5 {
            return invalid(format!("tuning must lie in [-0.5, 0.5], got {}", self.tuning));
        }
        if !(self.cqt_fmin.is_finite() && self.cqt_fmin > 0.0) {
            return invalid(format!("cqt_fmin must be > 0, got {}", self.cqt_fmin));
        }
        if self.cqt_octaves == 0 {
            return invalid("cqt_octaves must be > 0".to_string());
        }
        if self.cqt_bins_per_octave == 0 || self.cqt_bins_per_octave % 12 != 0 {
            return invalid(format!(
                "cqt_bins_per_octave must be a positive multiple of 12, got {}",
                self.cqt_bins_per_octave
            ));
        }
        if !(0.0..1.0).contains(&self.cqt_sparsity) {
            return invalid(format!(
                "cqt_sparsity must lie in [0, 1), got {}",
                self.cqt_sparsity
            ));
        }
        if self.smoothing_window == 0 || self.smoothing_window % 2 == 0 {
            return invalid(format!(
                "smoothing_window must be odd, got {}",
                self.smoothing_window
            ));
        }
        Ok(())
    }

    /// Number of constant-Q bins requested (before trimming at Nyquist)
    pub fn cqt_n_bins(&self) -> usize {
        self.cqt_octaves * self.cqt_bins_per_octave
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = AnalysisConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.cqt_n_bins(), 252);
        assert_eq!(config.target_sample_rate, 22050);
    }

    #[test]
    fn test_rejects_even_kernel() {
        let config = AnalysisConfig {
            hpss_kernel_size: 30,
            ..AnalysisConfig::default()
        };
        assert!(matches!(config.validate(), Err(AnalysisError::InvalidInput(_))));
    }

    #[test]
    fn test_rejects_bad_cqt_resolution() {
        let config = AnalysisConfig {
            cqt_bins_per_octave: 30,
            ..AnalysisConfig::default()
        };
        assert!(config.validate().is_err());

        let config = AnalysisConfig {
            cqt_fmin: 0.0,
            ..AnalysisConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_zero_hop_and_even_window() {
        let config = AnalysisConfig {
            chroma_hop_size: 0,
            ..AnalysisConfig::default()
        };
        assert!(config.validate().is_err());

        let config = AnalysisConfig {
            smoothing_window: 4,
            ..AnalysisConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
