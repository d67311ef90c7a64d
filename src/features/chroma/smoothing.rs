//! Circular profile smoothing
//!
//! Pitch classes live on a circle, so the moving average wraps around the
//! octave: B is the neighbour of C.

/// Circular moving average over an odd `window`
///
/// Every output bin is the mean of the `window` bins centred on it, with
/// indices taken modulo the profile length. The sum of the profile is
/// preserved. A window of 1, or an empty profile, returns the input.
///
/// # Arguments
///
/// * `values` - Profile to smooth (12 pitch classes for chroma/HPCP)
/// * `window` - Odd window length in bins (e.g., 3)
///
/// # Example
///
/// ```
/// use stratum_key::features::chroma::smoothing::smooth_circular;
///
/// let mut peak = vec![0.0f32; 12];
/// peak[0] = 3.0;
/// let smoothed = smooth_circular(&peak, 3);
/// assert_eq!(smoothed[11], 1.0);
/// assert_eq!(smoothed[0], 1.0);
/// assert_eq!(smoothed[1], 1.0);
/// ```
pub fn smooth_circular(values: &[f32], window: usize) -> Vec<f32> {
    let n = values.len();
    if n == 0 || window <= 1 {
        return values.to_vec();
    }

    let half = (window / 2) as isize;
    let scale = 1.0 / window as f32;

    (0..n as isize)
        .map(|i| {
            (-half..=half)
                .map(|offset| values[(i + offset).rem_euclid(n as isize) as usize])
                .sum::<f32>()
                * scale
        })
        .collect()
}
