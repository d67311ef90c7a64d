//! Constant-Q transform and constant-Q chroma
//!
//! Spectral-kernel implementation: every constant-Q bin is a Hann-windowed
//! complex exponential whose FFT is computed once and sparsified. A frame's
//! constant-Q coefficients are then sparse inner products with that frame's
//! FFT. Bins are logarithmically spaced, `bins_per_octave` per octave from
//! `fmin`, each with the same quality factor `Q`.
//!
//! # Reference
//!
//! Brown, J. C., & Puckette, M. S. (1992). An efficient algorithm for the
//! calculation of a constant Q transform. *JASA*, 92(5), 2698-2701.

use std::sync::Arc;

use rayon::prelude::*;
use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};

use super::normalization::normalize_max;
use super::Chromagram;
use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::features::spectrum::hann_window;

/// Nonzero entries of one spectral kernel: `(fft_bin, conj(K) / fft_len)`
type SparseKernel = Vec<(usize, Complex<f32>)>;

/// Precomputed constant-Q transform for one sample rate and resolution
pub struct ConstantQ {
    hop_size: usize,
    bins_per_octave: usize,
    fmin: f32,
    fft_len: usize,
    frequencies: Vec<f32>,
    kernels: Vec<SparseKernel>,
    fft: Arc<dyn Fft<f32>>,
}

impl std::fmt::Debug for ConstantQ {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConstantQ")
            .field("hop_size", &self.hop_size)
            .field("bins_per_octave", &self.bins_per_octave)
            .field("fmin", &self.fmin)
            .field("fft_len", &self.fft_len)
            .field("n_bins", &self.frequencies.len())
            .finish()
    }
}

impl ConstantQ {
    /// Build the spectral kernels
    ///
    /// # Arguments
    ///
    /// * `sample_rate` - Sample rate in Hz
    /// * `hop_size` - Hop between frames in samples
    /// * `fmin` - Centre frequency of bin 0 in Hz
    /// * `n_bins` - Requested number of bins; bins at or above Nyquist are dropped
    /// * `bins_per_octave` - Frequency resolution (multiple of 12 for chroma folding)
    /// * `sparsity` - Fraction of each kernel's L1 mass that may be discarded
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::InvalidInput` for zero rates/sizes, non-positive
    /// `fmin`, or when no bin lies below Nyquist.
    pub fn new(
        sample_rate: u32,
        hop_size: usize,
        fmin: f32,
        n_bins: usize,
        bins_per_octave: usize,
        sparsity: f32,
    ) -> Result<Self, AnalysisError> {
        if sample_rate == 0 || hop_size == 0 || n_bins == 0 || bins_per_octave == 0 {
            return Err(AnalysisError::InvalidInput(format!(
                "Invalid constant-Q parameters: sr={}, hop={}, n_bins={}, bins_per_octave={}",
                sample_rate, hop_size, n_bins, bins_per_octave
            )));
        }
        if !(fmin.is_finite() && fmin > 0.0) {
            return Err(AnalysisError::InvalidInput(format!(
                "Constant-Q fmin must be > 0, got {}",
                fmin
            )));
        }

        let sr = sample_rate as f64;
        let nyquist = sr / 2.0;
        let frequencies: Vec<f64> = (0..n_bins)
            .map(|k| fmin as f64 * 2f64.powf(k as f64 / bins_per_octave as f64))
            .take_while(|&f| f < nyquist)
            .collect();

        if frequencies.is_empty() {
            return Err(AnalysisError::InvalidInput(format!(
                "fmin {} Hz is above Nyquist for {} Hz",
                fmin, sample_rate
            )));
        }
        if frequencies.len() < n_bins {
            log::warn!(
                "Constant-Q: dropped {} of {} bins at or above Nyquist ({} Hz)",
                n_bins - frequencies.len(),
                n_bins,
                nyquist
            );
        }

        let q = 1.0 / (2f64.powf(1.0 / bins_per_octave as f64) - 1.0);
        let lengths: Vec<usize> = frequencies.iter().map(|f| (q * sr / f).ceil() as usize).collect();
        let fft_len = lengths.iter().copied().max().unwrap_or(1).next_power_of_two();

        let mut planner = FftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(fft_len);

        let kernels: Vec<SparseKernel> = frequencies
            .par_iter()
            .zip(lengths.par_iter())
            .map(|(&freq, &len)| spectral_kernel(freq, len, sr, fft_len, sparsity, fft.as_ref()))
            .collect();

        log::debug!(
            "Constant-Q: {} bins from {:.2} Hz, Q={:.2}, fft_len={}, {} kernel coefficients",
            frequencies.len(),
            fmin,
            q,
            fft_len,
            kernels.iter().map(|k| k.len()).sum::<usize>()
        );

        Ok(Self {
            hop_size,
            bins_per_octave,
            fmin,
            fft_len,
            frequencies: frequencies.into_iter().map(|f| f as f32).collect(),
            kernels,
            fft,
        })
    }

    /// Build from the constant-Q fields of an `AnalysisConfig`
    pub fn from_config(sample_rate: u32, config: &AnalysisConfig) -> Result<Self, AnalysisError> {
        Self::new(
            sample_rate,
            config.cqt_hop_size,
            config.cqt_fmin,
            config.cqt_n_bins(),
            config.cqt_bins_per_octave,
            config.cqt_sparsity,
        )
    }

    /// Centre frequency of every retained bin in Hz
    pub fn frequencies(&self) -> &[f32] {
        &self.frequencies
    }

    /// Number of retained bins
    pub fn n_bins(&self) -> usize {
        self.frequencies.len()
    }

    /// FFT length shared by all kernels
    pub fn fft_len(&self) -> usize {
        self.fft_len
    }

    /// Constant-Q magnitudes, frame-major
    ///
    /// Frame `t` is centred on sample `t * hop_size`; the signal is zero-padded
    /// at both ends, giving `1 + len / hop_size` frames.
    pub fn magnitudes(&self, samples: &[f32]) -> Vec<Vec<f32>> {
        let n_frames = 1 + samples.len() / self.hop_size;
        let half = (self.fft_len / 2) as isize;

        (0..n_frames)
            .into_par_iter()
            .map(|t| {
                let start = (t * self.hop_size) as isize - half;
                let mut buffer = vec![Complex::new(0.0f32, 0.0); self.fft_len];
                let first = (-start).max(0) as usize;
                let last = (samples.len() as isize - start).clamp(0, self.fft_len as isize) as usize;
                for n in first..last {
                    buffer[n].re = samples[(start + n as isize) as usize];
                }
                self.fft.process(&mut buffer);

                self.kernels
                    .iter()
                    .map(|kernel| {
                        kernel
                            .iter()
                            .map(|&(j, k)| buffer[j] * k)
                            .sum::<Complex<f32>>()
                            .norm()
                    })
                    .collect()
            })
            .collect()
    }

    /// Fold constant-Q magnitudes into a 12-bin chromagram (row 0 = C)
    ///
    /// Each frame is scaled so its maximum is 1; silent frames stay zero.
    pub fn chromagram(&self, samples: &[f32]) -> Chromagram {
        let mapping = cq_to_chroma(self.n_bins(), self.bins_per_octave, self.fmin);
        self.magnitudes(samples)
            .iter()
            .map(|frame| {
                let mut chroma = [0.0f32; 12];
                for (&magnitude, &c) in frame.iter().zip(&mapping) {
                    chroma[c] += magnitude;
                }
                normalize_max(&mut chroma);
                chroma
            })
            .collect()
    }
}

fn spectral_kernel(
    freq: f64,
    len: usize,
    sr: f64,
    fft_len: usize,
    sparsity: f32,
    fft: &dyn Fft<f32>,
) -> SparseKernel {
    let len = len.min(fft_len);
    let window = hann_window(len);
    let norm: f32 = window.iter().sum();
    let offset = (fft_len - len) / 2;
    let omega = 2.0 * std::f64::consts::PI * freq / sr;

    let mut buffer = vec![Complex::new(0.0f32, 0.0); fft_len];
    for (n, &w) in window.iter().enumerate() {
        let phase = omega * (n as f64 - (len / 2) as f64);
        buffer[offset + n] = Complex::new(phase.cos() as f32, phase.sin() as f32) * (w / norm);
    }
    fft.process(&mut buffer);

    let scale = 1.0 / fft_len as f32;
    let spectrum: Vec<Complex<f32>> = buffer.iter().map(|c| c.conj() * scale).collect();
    sparsify(&spectrum, sparsity)
}

/// Keep the largest coefficients carrying at least `1 - sparsity` of the L1 mass
fn sparsify(spectrum: &[Complex<f32>], sparsity: f32) -> SparseKernel {
    let magnitudes: Vec<f32> = spectrum.iter().map(|c| c.norm()).collect();
    let total: f32 = magnitudes.iter().sum();

    let threshold = if sparsity > 0.0 && total > 0.0 {
        let mut sorted = magnitudes.clone();
        sorted.sort_unstable_by(|a, b| a.total_cmp(b));
        let mut cumulative = 0.0f32;
        let mut threshold = 0.0f32;
        for &m in &sorted {
            cumulative += m / total;
            if cumulative >= sparsity {
                threshold = m;
                break;
            }
        }
        threshold
    } else {
        0.0
    };

    spectrum
        .iter()
        .zip(&magnitudes)
        .enumerate()
        .filter(|(_, (_, m))| **m > 0.0 && **m >= threshold)
        .map(|(j, (&c, _))| (j, c))
        .collect()
}

/// Pitch class (0 = C) of every constant-Q bin
///
/// Each group of `bins_per_octave / 12` adjacent bins, centred on a semitone,
/// folds into that semitone. `fmin` fixes which pitch class bin 0 belongs to.
pub fn cq_to_chroma(n_bins: usize, bins_per_octave: usize, fmin: f32) -> Vec<usize> {
    let n_merge = (bins_per_octave / 12).max(1);
    let midi = 12.0 * (fmin as f64 / 440.0).log2() + 69.0;
    let roll = (midi.rem_euclid(12.0)).round() as usize;

    (0..n_bins)
        .map(|b| (((b % bins_per_octave) + n_merge / 2) / n_merge + roll) % 12)
        .collect()
}

/// Constant-Q chromagram of a signal
///
/// # Arguments
///
/// * `samples` - Mono signal
/// * `sample_rate` - Sample rate in Hz
/// * `config` - Uses the `cqt_*` fields
pub fn chroma_cqt(
    samples: &[f32],
    sample_rate: u32,
    config: &AnalysisConfig,
) -> Result<Chromagram, AnalysisError> {
    let cqt = ConstantQ::from_config(sample_rate, config)?;
    let chromagram = cqt.chromagram(samples);
    log::debug!("Chroma CQT: {} frames, {} bins", chromagram.len(), cqt.n_bins());
    Ok(chromagram)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::C1_HZ;
    use crate::features::chroma::time_average;
    use std::f32::consts::PI;

    fn sine(freq: f32, sr: u32, seconds: f32) -> Vec<f32> {
        (0..(sr as f32 * seconds) as usize)
            .map(|i| (2.0 * PI * freq * i as f32 / sr as f32).sin() * 0.5)
            .collect()
    }

    fn argmax(values: &[f32]) -> usize {
        values
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
            .unwrap()
    }

    #[test]
    fn test_cq_to_chroma_mapping() {
        let mapping = cq_to_chroma(252, 36, C1_HZ);
        // Bins 35, 0 and 1 form the group centred on C
        assert_eq!(mapping[0], 0);
        assert_eq!(mapping[1], 0);
        assert_eq!(mapping[2], 1);
        assert_eq!(mapping[34], 11);
        assert_eq!(mapping[35], 0);
        assert_eq!(mapping[36], 0);
        assert_eq!(mapping[27], 9);
    }

    #[test]
    fn test_cq_to_chroma_from_a() {
        let mapping = cq_to_chroma(24, 12, 55.0);
        assert_eq!(mapping[0], 9);
        assert_eq!(mapping[3], 0);
    }

    #[test]
    fn test_trims_bins_above_nyquist() {
        let cqt = ConstantQ::new(8000, 512, C1_HZ, 252, 36, 0.01).unwrap();
        assert!(cqt.n_bins() < 252);
        assert!(cqt.frequencies().iter().all(|&f| f < 4000.0));
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(ConstantQ::new(22050, 0, C1_HZ, 84, 12, 0.01).is_err());
        assert!(ConstantQ::new(22050, 512, -1.0, 84, 12, 0.01).is_err());
        assert!(ConstantQ::new(22050, 512, 20_000.0, 84, 12, 0.01).is_err());
    }

    #[test]
    fn test_pure_tone_peaks_at_matching_bin() {
        let sr = 22050;
        let cqt = ConstantQ::new(sr, 512, C1_HZ, 84, 12, 0.01).unwrap();
        // A4 (MIDI 69) is 45 semitones above C1 (MIDI 24)
        let magnitudes = cqt.magnitudes(&sine(440.0, sr, 1.0));
        let middle = &magnitudes[magnitudes.len() / 2];
        assert_eq!(argmax(middle), 45);
        assert!((cqt.frequencies()[45] - 440.0).abs() < 0.01);
        // Unit-L1 kernels respond with about half the sinusoid amplitude
        assert!((middle[45] - 0.25).abs() < 0.05, "magnitude {}", middle[45]);
    }

    #[test]
    fn test_pure_tone_peaks_at_matching_bin_three_per_semitone() {
        let sr = 22050;
        let cqt = ConstantQ::new(sr, 512, C1_HZ, 252, 36, 0.01).unwrap();
        let magnitudes = cqt.magnitudes(&sine(440.0, sr, 1.0));
        let middle = &magnitudes[magnitudes.len() / 2];
        assert_eq!(argmax(middle), 135);
    }

    #[test]
    fn test_chroma_cqt_of_pure_tone() {
        let sr = 22050;
        let config = AnalysisConfig::default();
        let chromagram = chroma_cqt(&sine(392.0, sr, 1.5), sr, &config).unwrap();
        assert_eq!(chromagram.len(), 1 + (sr as usize * 3 / 2) / 512);
        assert_eq!(argmax(&time_average(&chromagram)), 7);
    }

    #[test]
    fn test_silence_is_zero() {
        let sr = 22050;
        let chromagram = chroma_cqt(&vec![0.0; 4096], sr, &AnalysisConfig::default()).unwrap();
        assert!(chromagram.iter().flatten().all(|&x| x == 0.0));
    }
}
