//! Per-frame chroma normalization
//!
//! Frames whose norm falls below `EPSILON` are left untouched, so silent
//! frames stay exactly zero.

const EPSILON: f32 = 1e-10;

/// Scale so the largest absolute entry is 1 (infinity norm)
pub fn normalize_max(values: &mut [f32]) {
    let norm = values.iter().fold(0.0f32, |acc, &x| acc.max(x.abs()));
    scale_by(values, norm);
}

/// Scale so absolute entries sum to 1 (L1 norm)
pub fn normalize_l1(values: &mut [f32]) {
    let norm: f32 = values.iter().map(|x| x.abs()).sum();
    scale_by(values, norm);
}

/// Scale to unit Euclidean length (L2 norm)
pub fn normalize_l2(values: &mut [f32]) {
    let norm = values.iter().map(|x| x * x).sum::<f32>().sqrt();
    scale_by(values, norm);
}

fn scale_by(values: &mut [f32], norm: f32) {
    if norm > EPSILON && norm.is_finite() {
        for x in values.iter_mut() {
            *x /= norm;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_max() {
        let mut v = vec![0.5, -2.0, 1.0];
        normalize_max(&mut v);
        assert_eq!(v, vec![0.25, -1.0, 0.5]);
    }

    #[test]
    fn test_normalize_l1() {
        let mut v = vec![1.0, 3.0, 0.0, 4.0];
        normalize_l1(&mut v);
        assert!((v.iter().sum::<f32>() - 1.0).abs() < 1e-6);
        assert!((v[3] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_normalize_l2() {
        let mut v = vec![3.0, 4.0];
        normalize_l2(&mut v);
        assert!((v[0] - 0.6).abs() < 1e-6);
        assert!((v[1] - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_zero_frame_unchanged() {
        let mut v = vec![0.0; 12];
        normalize_max(&mut v);
        normalize_l1(&mut v);
        normalize_l2(&mut v);
        assert!(v.iter().all(|&x| x == 0.0));
    }
}
