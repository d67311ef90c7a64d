//! STFT chroma extraction
//!
//! Maps a power spectrogram onto 12 pitch classes with a bank of Gaussian
//! bumps, one per semitone, in fractional-chroma-bin units. Each FFT bin's
//! weights are L2-normalised and then tapered by a Gaussian octave weighting
//! centred five octaves above A0 (880 Hz) with a width of two octaves.

use super::normalization::{normalize_l2, normalize_max};
use super::smoothing::smooth_circular;
use super::{time_average, Chromagram, FeatureKind, PitchClassProfile};
use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::features::spectrum::stft;

/// Centre of the octave weighting, in octaves above A0 (27.5 Hz)
const CENTER_OCTAVE: f64 = 5.0;

/// Width (standard deviation) of the octave weighting in octaves
const OCTAVE_WIDTH: f64 = 2.0;

/// Build the `12 x (n_fft/2 + 1)` chroma filterbank
///
/// Row 0 is C. `tuning` shifts the reference A440 by a fraction of a bin.
pub fn chroma_filterbank(sample_rate: u32, n_fft: usize, tuning: f32) -> Vec<Vec<f32>> {
    const N_CHROMA: f64 = 12.0;
    let a440 = 440.0 * 2f64.powf(tuning as f64 / N_CHROMA);

    // Fractional chroma bin of every FFT bin; bin 0 (DC) is placed 1.5 octaves below bin 1
    let mut frqbins = Vec::with_capacity(n_fft);
    for b in 1..n_fft {
        let freq = b as f64 * sample_rate as f64 / n_fft as f64;
        frqbins.push(N_CHROMA * (freq / (a440 / 16.0)).log2());
    }
    frqbins.insert(0, frqbins.first().copied().unwrap_or(0.0) - 1.5 * N_CHROMA);

    let mut binwidth: Vec<f64> = frqbins.windows(2).map(|w| (w[1] - w[0]).max(1.0)).collect();
    binwidth.push(1.0);

    let n_bins = n_fft / 2 + 1;
    let mut weights = vec![vec![0.0f32; n_bins]; 12];

    for (b, (&frq, &width)) in frqbins.iter().zip(&binwidth).enumerate().take(n_bins) {
        let mut column = [0.0f32; 12];
        for (c, w) in column.iter_mut().enumerate() {
            let d = (frq - c as f64 + 6.0 + 10.0 * N_CHROMA).rem_euclid(N_CHROMA) - 6.0;
            *w = (-0.5 * (2.0 * d / width).powi(2)).exp() as f32;
        }
        normalize_l2(&mut column);

        let octave = frq / N_CHROMA;
        let octave_weight =
            (-0.5 * ((octave - CENTER_OCTAVE) / OCTAVE_WIDTH).powi(2)).exp() as f32;

        // Rows are built relative to A; rotate so row 0 is C
        for (c, row) in weights.iter_mut().enumerate() {
            row[b] = column[(c + 3) % 12] * octave_weight;
        }
    }

    weights
}

/// Chromagram from a power spectrogram
///
/// # Arguments
///
/// * `samples` - Mono signal
/// * `sample_rate` - Sample rate in Hz
/// * `n_fft` - FFT size (default 4096)
/// * `hop_size` - Hop size (default 512)
/// * `tuning` - Tuning offset in fractions of a chroma bin (0.0 = A440)
///
/// # Returns
///
/// One 12-bin vector per frame, each scaled so its maximum is 1 (silent
/// frames stay zero).
pub fn chroma_stft(
    samples: &[f32],
    sample_rate: u32,
    n_fft: usize,
    hop_size: usize,
    tuning: f32,
) -> Result<Chromagram, AnalysisError> {
    if sample_rate == 0 {
        return Err(AnalysisError::InvalidInput("Sample rate must be > 0".to_string()));
    }

    let power = stft(samples, n_fft, hop_size)?.power();
    let filterbank = chroma_filterbank(sample_rate, n_fft, tuning);

    let chromagram: Chromagram = power
        .iter()
        .map(|frame| {
            let mut chroma = [0.0f32; 12];
            for (c, row) in filterbank.iter().enumerate() {
                chroma[c] = row.iter().zip(frame).map(|(w, p)| w * p).sum();
            }
            normalize_max(&mut chroma);
            chroma
        })
        .collect();

    log::debug!(
        "Chroma STFT: {} frames (n_fft={}, hop={})",
        chromagram.len(),
        n_fft,
        hop_size
    );

    Ok(chromagram)
}

/// Extract the smoothed, time-averaged STFT chroma profile
///
/// # Arguments
///
/// * `samples` - Harmonic component of the signal
/// * `sample_rate` - Sample rate in Hz
/// * `config` - Uses `chroma_frame_size`, `chroma_hop_size`, `tuning` and `smoothing_window`
///
/// # Returns
///
/// 12-value `PitchClassProfile` of kind `Chroma`
///
/// # Example
///
/// ```no_run
/// use stratum_key::AnalysisConfig;
/// use stratum_key::features::chroma::extractor::extract_chroma;
///
/// let samples = vec![0.0f32; 22050 * 5];
/// let profile = extract_chroma(&samples, 22050, &AnalysisConfig::default())?;
/// assert_eq!(profile.values().len(), 12);
/// # Ok::<(), stratum_key::AnalysisError>(())
/// ```
pub fn extract_chroma(
    samples: &[f32],
    sample_rate: u32,
    config: &AnalysisConfig,
) -> Result<PitchClassProfile, AnalysisError> {
    let chromagram = chroma_stft(
        samples,
        sample_rate,
        config.chroma_frame_size,
        config.chroma_hop_size,
        config.tuning,
    )?;
    let mean = time_average(&chromagram);
    PitchClassProfile::new(FeatureKind::Chroma, smooth_circular(&mean, config.smoothing_window))
}

#[cfg(test)]
mod tests {
    use super::*;
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
    fn test_filterbank_shape() {
        let fb = chroma_filterbank(22050, 4096, 0.0);
        assert_eq!(fb.len(), 12);
        assert!(fb.iter().all(|row| row.len() == 2049));
        assert!(fb.iter().flatten().all(|w| w.is_finite() && *w >= 0.0));
    }

    #[test]
    fn test_filterbank_a440_maps_to_a() {
        let sr = 22050;
        let n_fft = 4096;
        let bin = (440.0 * n_fft as f32 / sr as f32).round() as usize;
        let fb = chroma_filterbank(sr, n_fft, 0.0);
        let column: Vec<f32> = fb.iter().map(|row| row[bin]).collect();
        assert_eq!(argmax(&column), 9);
    }

    #[test]
    fn test_chroma_of_pure_tones() {
        let sr = 22050;
        for (freq, expected) in [(440.0, 9usize), (261.63, 0), (392.0, 7)] {
            let chromagram = chroma_stft(&sine(freq, sr, 1.0), sr, 4096, 512, 0.0).unwrap();
            let mean = time_average(&chromagram);
            assert_eq!(argmax(&mean), expected, "tone {} Hz", freq);
        }
    }

    #[test]
    fn test_frames_max_normalised() {
        let sr = 22050;
        let chromagram = chroma_stft(&sine(330.0, sr, 0.5), sr, 4096, 512, 0.0).unwrap();
        for frame in &chromagram {
            let max = frame.iter().cloned().fold(0.0f32, f32::max);
            assert!((max - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_silence_gives_zero_profile() {
        let profile = extract_chroma(&vec![0.0; 22050], 22050, &AnalysisConfig::default()).unwrap();
        assert_eq!(profile.kind(), FeatureKind::Chroma);
        assert!(profile.values().iter().all(|&v| v == 0.0));
    }
}
