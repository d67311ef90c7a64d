//! Harmonic-percussive source separation (HPSS)
//!
//! Median-filtering separation of a magnitude spectrogram:
//! - Horizontal (time) median filter enhances sustained, harmonic partials
//! - Vertical (frequency) median filter enhances broadband, percussive events
//! - Soft Wiener-style masks split the complex STFT, which is then inverted
//!
//! # Reference
//!
//! Fitzgerald, D. (2010). Harmonic/Percussive Separation using Median Filtering.
//! *Proceedings of the 13th International Conference on Digital Audio Effects (DAFx-10)*.
//!
//! Driedger, J., Müller, M., & Disch, S. (2014). Extending Harmonic-Percussive
//! Separation of Audio Signals. *ISMIR*.

use rayon::prelude::*;

use super::spectrum::{istft, stft};
use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::io::SampleBuffer;

/// Harmonic and percussive components of a signal
#[derive(Debug, Clone)]
pub struct HpssOutput {
    /// Sustained, tonal component (same length and rate as the input)
    pub harmonic: SampleBuffer,
    /// Transient, broadband component (same length and rate as the input)
    pub percussive: SampleBuffer,
}

/// Separate a signal into harmonic and percussive components
///
/// # Arguments
///
/// * `buffer` - Mono input signal
/// * `config` - Uses `hpss_frame_size`, `hpss_hop_size`, `hpss_kernel_size`,
///   `hpss_power` and `hpss_margin`
///
/// # Returns
///
/// `HpssOutput` whose buffers match the input length. Silent or very short
/// input is valid and yields (near-)silent components.
///
/// # Errors
///
/// Returns `AnalysisError::InvalidInput` for an even or zero kernel size or
/// invalid STFT parameters.
///
/// # Example
///
/// ```no_run
/// use stratum_key::{AnalysisConfig, io::SampleBuffer};
/// use stratum_key::features::hpss::separate;
///
/// let buffer = SampleBuffer::new(vec![0.0f32; 22050], 22050)?;
/// let parts = separate(&buffer, &AnalysisConfig::default())?;
/// assert_eq!(parts.harmonic.len(), buffer.len());
/// # Ok::<(), stratum_key::AnalysisError>(())
/// ```
pub fn separate(buffer: &SampleBuffer, config: &AnalysisConfig) -> Result<HpssOutput, AnalysisError> {
    let kernel = config.hpss_kernel_size;
    if kernel == 0 || kernel % 2 == 0 {
        return Err(AnalysisError::InvalidInput(format!(
            "Median kernel size must be odd, got {}",
            kernel
        )));
    }

    log::debug!(
        "HPSS: {} samples, n_fft={}, hop={}, kernel={}",
        buffer.len(),
        config.hpss_frame_size,
        config.hpss_hop_size,
        kernel
    );

    let spec = stft(buffer.samples(), config.hpss_frame_size, config.hpss_hop_size)?;
    let magnitude = spec.magnitude();
    let n_frames = spec.n_frames();
    let n_bins = spec.n_bins();

    // Harmonic enhancement: median across time, one row per bin
    let harmonic_by_bin: Vec<Vec<f32>> = (0..n_bins)
        .into_par_iter()
        .map(|k| {
            let row: Vec<f32> = magnitude.iter().map(|frame| frame[k]).collect();
            median_filter(&row, kernel)
        })
        .collect();

    // Percussive enhancement: median across frequency, one row per frame
    let percussive: Vec<Vec<f32>> = magnitude
        .par_iter()
        .map(|frame| median_filter(frame, kernel))
        .collect();

    let power = config.hpss_power;
    let margin = config.hpss_margin;

    let mut harmonic_spec = spec.clone();
    let mut percussive_spec = spec;

    for t in 0..n_frames {
        for k in 0..n_bins {
            let h = harmonic_by_bin[k][t];
            let p = percussive[t][k];
            let mask_h = softmask(h, p * margin, power);
            let mask_p = softmask(p, h * margin, power);
            harmonic_spec.frames[t][k] *= mask_h;
            percussive_spec.frames[t][k] *= mask_p;
        }
    }

    let harmonic = istft(&harmonic_spec)?;
    let percussive = istft(&percussive_spec)?;

    Ok(HpssOutput {
        harmonic: SampleBuffer::new(harmonic, buffer.sample_rate())?,
        percussive: SampleBuffer::new(percussive, buffer.sample_rate())?,
    })
}

/// Soft mask `x^p / (x^p + y^p)`, evaluated relative to `max(x, y)`
///
/// Returns 0 where both inputs vanish.
pub fn softmask(x: f32, y: f32, power: f32) -> f32 {
    let z = x.max(y);
    if z < f32::MIN_POSITIVE {
        return 0.0;
    }
    let xm = (x / z).powf(power);
    let ym = (y / z).powf(power);
    xm / (xm + ym)
}

/// Median filter with odd `kernel` and symmetric-reflection edges
///
/// Outside the signal `[a b c d]` is extended as `d c b a | a b c d | d c b a`.
pub fn median_filter(signal: &[f32], kernel: usize) -> Vec<f32> {
    let n = signal.len();
    if n == 0 {
        return Vec::new();
    }
    let half = (kernel / 2) as isize;
    let mut window = vec![0.0f32; kernel];

    (0..n)
        .map(|i| {
            for (slot, offset) in window.iter_mut().zip(-half..=half) {
                *slot = signal[reflect_index(i as isize + offset, n)];
            }
            let mid = kernel / 2;
            let (_, median, _) = window.select_nth_unstable_by(mid, |a, b| a.total_cmp(b));
            *median
        })
        .collect()
}

fn reflect_index(i: isize, n: usize) -> usize {
    let period = 2 * n as isize;
    let m = i.rem_euclid(period) as usize;
    if m < n {
        m
    } else {
        2 * n - 1 - m
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    fn energy(samples: &[f32]) -> f32 {
        samples.iter().map(|x| x * x).sum()
    }

    #[test]
    fn test_reflect_index() {
        assert_eq!(reflect_index(-1, 4), 0);
        assert_eq!(reflect_index(-2, 4), 1);
        assert_eq!(reflect_index(4, 4), 3);
        assert_eq!(reflect_index(5, 4), 2);
        assert_eq!(reflect_index(2, 4), 2);
        assert_eq!(reflect_index(-3, 1), 0);
    }

    #[test]
    fn test_median_filter_removes_spike() {
        let signal = vec![1.0, 1.0, 9.0, 1.0, 1.0];
        let filtered = median_filter(&signal, 3);
        assert_eq!(filtered, vec![1.0, 1.0, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_median_filter_edges_reflect() {
        // [3 | 3 1 2] -> median(3, 3, 1) = 3
        let filtered = median_filter(&[3.0, 1.0, 2.0], 3);
        assert_eq!(filtered, vec![3.0, 2.0, 2.0]);
    }

    #[test]
    fn test_softmask() {
        assert_eq!(softmask(0.0, 0.0, 2.0), 0.0);
        assert!((softmask(1.0, 1.0, 2.0) - 0.5).abs() < 1e-6);
        assert!((softmask(3.0, 1.0, 2.0) - 0.9).abs() < 1e-6);
        assert!((softmask(1.0, 3.0, 2.0) + softmask(3.0, 1.0, 2.0) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_sustained_tone_is_harmonic() {
        let sr = 22050;
        let samples: Vec<f32> = (0..sr)
            .map(|i| (2.0 * PI * 440.0 * i as f32 / sr as f32).sin() * 0.5)
            .collect();
        let buffer = SampleBuffer::new(samples, sr as u32).unwrap();
        let parts = separate(&buffer, &AnalysisConfig::default()).unwrap();

        assert_eq!(parts.harmonic.len(), buffer.len());
        assert_eq!(parts.percussive.len(), buffer.len());
        assert!(energy(parts.harmonic.samples()) > 10.0 * energy(parts.percussive.samples()));
    }

    #[test]
    fn test_click_train_is_percussive() {
        let sr = 22050usize;
        let mut samples = vec![0.0f32; sr];
        for i in (sr / 8..sr).step_by(sr / 4) {
            samples[i] = 1.0;
        }
        let buffer = SampleBuffer::new(samples, sr as u32).unwrap();
        let parts = separate(&buffer, &AnalysisConfig::default()).unwrap();
        assert!(energy(parts.percussive.samples()) > energy(parts.harmonic.samples()));
    }

    #[test]
    fn test_components_sum_to_input() {
        let sr = 22050usize;
        let mut state = 12345u32;
        let samples: Vec<f32> = (0..sr / 2)
            .map(|i| {
                state = state.wrapping_mul(1_103_515_245).wrapping_add(12345);
                let noise = ((state >> 16) as f32 / 32768.0 - 1.0) * 0.05;
                (2.0 * PI * 330.0 * i as f32 / sr as f32).sin() * 0.4 + noise
            })
            .collect();
        let buffer = SampleBuffer::new(samples.clone(), sr as u32).unwrap();
        let parts = separate(&buffer, &AnalysisConfig::default()).unwrap();

        let residual: Vec<f32> = samples
            .iter()
            .zip(parts.harmonic.samples().iter().zip(parts.percussive.samples()))
            .map(|(x, (h, p))| x - h - p)
            .collect();
        assert!(energy(&residual) < 1e-4 * energy(&samples));
    }

    #[test]
    fn test_silent_and_short_input() {
        let config = AnalysisConfig::default();

        let silent = SampleBuffer::silent(4096, 22050).unwrap();
        let parts = separate(&silent, &config).unwrap();
        assert!(parts.harmonic.samples().iter().all(|&x| x == 0.0));
        assert!(parts.percussive.samples().iter().all(|&x| x == 0.0));

        let short = SampleBuffer::new(vec![0.1, -0.2, 0.3], 22050).unwrap();
        let parts = separate(&short, &config).unwrap();
        assert_eq!(parts.harmonic.len(), 3);

        let empty = SampleBuffer::new(vec![], 22050).unwrap();
        let parts = separate(&empty, &config).unwrap();
        assert!(parts.harmonic.is_empty());
    }

    #[test]
    fn test_even_kernel_rejected() {
        let config = AnalysisConfig {
            hpss_kernel_size: 4,
            ..AnalysisConfig::default()
        };
        let buffer = SampleBuffer::silent(1024, 22050).unwrap();
        assert!(separate(&buffer, &config).is_err());
    }
}
