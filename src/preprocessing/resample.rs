//! Sample rate conversion to the analysis rate
//!
//! Band-limited sinc resampling with rubato, run as a single pass over the
//! whole signal followed by a flush so the filter delay can be trimmed.

use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};

use crate::error::AnalysisError;

/// Resample a mono signal from `from_rate` to `to_rate`
///
/// # Arguments
///
/// * `samples` - Mono samples
/// * `from_rate` - Source sample rate in Hz
/// * `to_rate` - Target sample rate in Hz
///
/// # Returns
///
/// Resampled signal of length `round(len * to_rate / from_rate)`; the input
/// unchanged when the rates already match.
///
/// # Errors
///
/// Returns `AnalysisError::InvalidInput` for a zero rate and
/// `AnalysisError::ProcessingError` if rubato fails.
pub fn resample_mono(
    samples: &[f32],
    from_rate: u32,
    to_rate: u32,
) -> Result<Vec<f32>, AnalysisError> {
    if from_rate == 0 || to_rate == 0 {
        return Err(AnalysisError::InvalidInput(format!(
            "Cannot resample from {} Hz to {} Hz",
            from_rate, to_rate
        )));
    }
    if from_rate == to_rate || samples.is_empty() {
        return Ok(samples.to_vec());
    }

    let ratio = to_rate as f64 / from_rate as f64;
    let expected_len = (samples.len() as f64 * ratio).round() as usize;

    log::debug!(
        "Resampling {} samples from {} Hz to {} Hz",
        samples.len(),
        from_rate,
        to_rate
    );

    let params = SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };

    let mut resampler = SincFixedIn::<f32>::new(ratio, 1.0, params, samples.len(), 1)
        .map_err(|e| AnalysisError::ProcessingError(format!("Resampler setup failed: {}", e)))?;
    let delay = resampler.output_delay();

    let input = vec![samples.to_vec()];
    let mut output = resampler
        .process(&input, None)
        .map_err(|e| AnalysisError::ProcessingError(format!("Resampling failed: {}", e)))?;
    let tail = resampler
        .process_partial(None::<&[Vec<f32>]>, None)
        .map_err(|e| AnalysisError::ProcessingError(format!("Resampler flush failed: {}", e)))?;

    let mut resampled = output.swap_remove(0);
    if let Some(rest) = tail.into_iter().next() {
        resampled.extend(rest);
    }

    let mut resampled: Vec<f32> = resampled.into_iter().skip(delay).collect();
    resampled.resize(expected_len, 0.0);
    Ok(resampled)
}
