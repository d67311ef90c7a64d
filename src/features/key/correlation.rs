//! Pearson correlation between a profile and a template

/// Score given to a comparison whose correlation is undefined
///
/// The lowest value a Pearson coefficient can take, so a degenerate channel
/// never helps a candidate.
pub const DEGENERATE_SCORE: f32 = -1.0;

/// Variance below this fraction of a vector's energy counts as constant
const RELATIVE_VARIANCE_FLOOR: f64 = 1e-10;

/// Pearson correlation coefficient of two equal-length vectors
///
/// Accumulates in f64. Returns `None` when the coefficient is undefined: a
/// length mismatch or empty input, a non-finite entry, or a vector that is
/// (numerically) constant, including all-zero vectors.
///
/// # Example
///
/// ```
/// use stratum_key::features::key::correlation::pearson;
///
/// let r = pearson(&[1.0, 2.0, 3.0], &[2.0, 4.0, 6.0]).unwrap();
/// assert!((r - 1.0).abs() < 1e-6);
/// assert!(pearson(&[1.0, 1.0, 1.0], &[1.0, 2.0, 3.0]).is_none());
/// ```
pub fn pearson(x: &[f32], y: &[f32]) -> Option<f32> {
    if x.len() != y.len() || x.is_empty() {
        return None;
    }
    if x.iter().chain(y).any(|v| !v.is_finite()) {
        return None;
    }

    let n = x.len() as f64;
    let mean_x = x.iter().map(|&v| v as f64).sum::<f64>() / n;
    let mean_y = y.iter().map(|&v| v as f64).sum::<f64>() / n;

    let mut sxx = 0.0f64;
    let mut syy = 0.0f64;
    let mut sxy = 0.0f64;
    let mut energy_x = 0.0f64;
    let mut energy_y = 0.0f64;
    for (&a, &b) in x.iter().zip(y) {
        let (a, b) = (a as f64, b as f64);
        let dx = a - mean_x;
        let dy = b - mean_y;
        sxx += dx * dx;
        syy += dy * dy;
        sxy += dx * dy;
        energy_x += a * a;
        energy_y += b * b;
    }

    if sxx <= RELATIVE_VARIANCE_FLOOR * energy_x || syy <= RELATIVE_VARIANCE_FLOOR * energy_y {
        return None;
    }

    let r = sxy / (sxx * syy).sqrt();
    if !r.is_finite() {
        return None;
    }
    Some(r.clamp(-1.0, 1.0) as f32)
}

/// Pearson correlation with undefined results mapped to [`DEGENERATE_SCORE`]
pub fn correlation_score(x: &[f32], y: &[f32]) -> f32 {
    pearson(x, y).unwrap_or(DEGENERATE_SCORE)
}
