//! Short-time Fourier transform and its inverse
//!
//! Frames are centred: the signal is zero-padded by `n_fft / 2` on both sides,
//! so frame `t` is centred on sample `t * hop_size` and a signal of `L`
//! samples yields `1 + L / hop_size` frames. The window is a periodic Hann.

use rayon::prelude::*;
use rustfft::num_complex::Complex;
use rustfft::FftPlanner;

use crate::error::AnalysisError;

/// Complex STFT, frame-major (`frames[t][k]`, `k` in `0..=n_fft/2`)
#[derive(Debug, Clone)]
pub struct Spectrogram {
    /// One row of `n_fft / 2 + 1` bins per frame
    pub frames: Vec<Vec<Complex<f32>>>,
    /// FFT size
    pub n_fft: usize,
    /// Hop between frames in samples
    pub hop_size: usize,
    /// Length of the analysed signal in samples
    pub signal_len: usize,
}

impl Spectrogram {
    /// Number of frames
    pub fn n_frames(&self) -> usize {
        self.frames.len()
    }

    /// Number of frequency bins per frame
    pub fn n_bins(&self) -> usize {
        self.n_fft / 2 + 1
    }

    /// Magnitude spectrogram `|S|`
    pub fn magnitude(&self) -> Vec<Vec<f32>> {
        self.frames
            .iter()
            .map(|frame| frame.iter().map(|c| c.norm()).collect())
            .collect()
    }

    /// Power spectrogram `|S|^2`
    pub fn power(&self) -> Vec<Vec<f32>> {
        self.frames
            .iter()
            .map(|frame| frame.iter().map(|c| c.norm_sqr()).collect())
            .collect()
    }
}

/// Periodic Hann window of length `n`
pub fn hann_window(n: usize) -> Vec<f32> {
    (0..n)
        .map(|i| 0.5 - 0.5 * (2.0 * std::f32::consts::PI * i as f32 / n as f32).cos())
        .collect()
}

fn check_params(n_fft: usize, hop_size: usize) -> Result<(), AnalysisError> {
    if n_fft < 2 || n_fft % 2 != 0 {
        return Err(AnalysisError::InvalidInput(format!(
            "FFT size must be even and >= 2, got {}",
            n_fft
        )));
    }
    if hop_size == 0 {
        return Err(AnalysisError::InvalidInput("Hop size must be > 0".to_string()));
    }
    Ok(())
}

/// Centred STFT of a real signal
///
/// # Arguments
///
/// * `samples` - Real input signal
/// * `n_fft` - FFT size (even)
/// * `hop_size` - Hop between frames in samples
///
/// # Errors
///
/// Returns `AnalysisError::InvalidInput` for an odd/zero FFT size or a zero hop.
pub fn stft(samples: &[f32], n_fft: usize, hop_size: usize) -> Result<Spectrogram, AnalysisError> {
    check_params(n_fft, hop_size)?;

    let pad = n_fft / 2;
    let mut padded = vec![0.0f32; samples.len() + 2 * pad];
    padded[pad..pad + samples.len()].copy_from_slice(samples);

    let n_frames = 1 + samples.len() / hop_size;
    let n_bins = n_fft / 2 + 1;
    let window = hann_window(n_fft);

    let mut planner = FftPlanner::<f32>::new();
    let fft = planner.plan_fft_forward(n_fft);

    let frames: Vec<Vec<Complex<f32>>> = (0..n_frames)
        .into_par_iter()
        .map(|t| {
            let start = t * hop_size;
            let mut buffer: Vec<Complex<f32>> = padded[start..start + n_fft]
                .iter()
                .zip(&window)
                .map(|(&x, &w)| Complex::new(x * w, 0.0))
                .collect();
            fft.process(&mut buffer);
            buffer.truncate(n_bins);
            buffer
        })
        .collect();

    log::debug!(
        "STFT: {} samples -> {} frames x {} bins (n_fft={}, hop={})",
        samples.len(),
        n_frames,
        n_bins,
        n_fft,
        hop_size
    );

    Ok(Spectrogram {
        frames,
        n_fft,
        hop_size,
        signal_len: samples.len(),
    })
}

/// Inverse of [`stft`] by weighted overlap-add
///
/// Each frame is inverted, windowed and overlap-added, then divided by the
/// summed squared window wherever that sum is non-negligible. The result is
/// trimmed back to `spec.signal_len` samples.
pub fn istft(spec: &Spectrogram) -> Result<Vec<f32>, AnalysisError> {
    check_params(spec.n_fft, spec.hop_size)?;

    let n_fft = spec.n_fft;
    let hop = spec.hop_size;
    let n_bins = spec.n_bins();
    let pad = n_fft / 2;
    let out_len = n_fft + hop * spec.n_frames().saturating_sub(1);

    let window = hann_window(n_fft);
    let mut planner = FftPlanner::<f32>::new();
    let ifft = planner.plan_fft_inverse(n_fft);
    let scale = 1.0 / n_fft as f32;

    let mut output = vec![0.0f32; out_len];
    let mut window_sum = vec![0.0f32; out_len];
    let mut buffer = vec![Complex::new(0.0f32, 0.0); n_fft];

    for (t, frame) in spec.frames.iter().enumerate() {
        if frame.len() != n_bins {
            return Err(AnalysisError::InvalidInput(format!(
                "Frame {} has {} bins, expected {}",
                t,
                frame.len(),
                n_bins
            )));
        }

        // Rebuild the Hermitian-symmetric full spectrum
        buffer[..n_bins].copy_from_slice(frame);
        buffer[0].im = 0.0;
        buffer[n_fft / 2].im = 0.0;
        for k in 1..n_fft / 2 {
            buffer[n_fft - k] = frame[k].conj();
        }
        ifft.process(&mut buffer);

        let start = t * hop;
        for n in 0..n_fft {
            output[start + n] += buffer[n].re * scale * window[n];
            window_sum[start + n] += window[n] * window[n];
        }
    }

    for (y, &w) in output.iter_mut().zip(&window_sum) {
        if w > f32::MIN_POSITIVE {
            *y /= w;
        }
    }

    let mut signal: Vec<f32> = output.into_iter().skip(pad).take(spec.signal_len).collect();
    signal.resize(spec.signal_len, 0.0);
    Ok(signal)
}
