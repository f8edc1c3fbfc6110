/// Trajectory normalization
///
/// Resamples a variable-length angle sequence onto `n` evenly spaced points
/// and min-max rescales it to [0, 1]. Shared by training and scoring, so it is
/// a pure function of its input.

use crate::models::NormalizedTrajectory;

/// Default number of points in a normalized trajectory
pub const DEFAULT_TRAJECTORY_POINTS: usize = 50;

/// Added to the rescaling denominator when the curve is flat
pub const NORMALIZATION_EPSILON: f64 = 1e-6;

/// Linearly resample `values` onto `n` evenly spaced points over its index range
pub fn resample(values: &[f64], n: usize) -> Vec<f64> {
    let m = values.len();
    if m == 0 || n == 0 {
        return vec![0.0; n];
    }
    if m == 1 || n == 1 {
        return vec![values[0]; n];
    }

    (0..n)
        .map(|j| {
            // Integer numerator keeps the position exact when m == n
            let position = (j * (m - 1)) as f64 / (n - 1) as f64;
            let lower = position.floor() as usize;
            if lower >= m - 1 {
                return values[m - 1];
            }
            let frac = position - lower as f64;
            if frac == 0.0 {
                return values[lower];
            }
            values[lower] + (values[lower + 1] - values[lower]) * frac
        })
        .collect()
}

/// Normalize a raw trajectory to `n` points in [0, 1].
///
/// Fewer than two samples give an all-zero curve. The observed minimum maps to
/// exactly 0 and the observed maximum to exactly 1; a flat curve maps to zeros.
pub fn normalize_trajectory(raw: &[f64], n: usize) -> NormalizedTrajectory {
    if raw.len() < 2 {
        return NormalizedTrajectory::zeros(n);
    }

    let resampled = resample(raw, n);
    let min = resampled.iter().copied().fold(f64::INFINITY, f64::min);
    let max = resampled.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;
    let denominator = if range > 0.0 {
        range
    } else {
        range + NORMALIZATION_EPSILON
    };

    NormalizedTrajectory::new(resampled.iter().map(|y| (y - min) / denominator).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_invariance() {
        for len in [2usize, 10, 200] {
            let raw: Vec<f64> = (0..len).map(|i| 170.0 - (i as f64 * 7.0) % 90.0).collect();
            assert_eq!(normalize_trajectory(&raw, 50).len(), 50);
            assert_eq!(normalize_trajectory(&raw, 17).len(), 17);
        }
    }

    #[test]
    fn test_range_hits_zero_and_one() {
        let raw = vec![170.0, 140.0, 95.0, 88.0, 120.0, 165.0];
        let curve = normalize_trajectory(&raw, 50);
        assert!(curve.iter().all(|v| (0.0..=1.0).contains(v)));
        assert!(curve.iter().any(|v| *v == 0.0));
        assert!(curve.iter().any(|v| *v == 1.0));
    }

    #[test]
    fn test_degenerate_inputs_zero_fill() {
        assert_eq!(normalize_trajectory(&[], 50).to_vec(), vec![0.0; 50]);
        assert_eq!(normalize_trajectory(&[123.0], 50).to_vec(), vec![0.0; 50]);
    }

    #[test]
    fn test_flat_input_maps_to_zero() {
        let curve = normalize_trajectory(&[150.0; 8], 10);
        assert!(curve.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_resample_endpoints_and_midpoint() {
        let out = resample(&[0.0, 10.0], 3);
        assert_eq!(out, vec![0.0, 5.0, 10.0]);
    }

    #[test]
    fn test_same_length_is_identity() {
        let raw = vec![0.0, 0.25, 1.0, 0.5, 0.0];
        assert_eq!(resample(&raw, raw.len()), raw);
        assert_eq!(normalize_trajectory(&raw, raw.len()).to_vec(), raw);
    }

    #[test]
    fn test_deterministic() {
        let raw: Vec<f64> = (0..37).map(|i| (i as f64 * 0.37).sin() * 40.0 + 120.0).collect();
        assert_eq!(normalize_trajectory(&raw, 50), normalize_trajectory(&raw, 50));
    }
}
