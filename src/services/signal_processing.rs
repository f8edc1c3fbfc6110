/// Signal processing helpers for offline segmentation
///
/// - Savitzky-Golay smoothing with polynomial fits at the edges
/// - Local extremum detection with a prominence criterion

use ndarray::{Array1, Array2};

/// Least-squares polynomial fit of `ys` at positions `xs`; coefficients lowest order first
pub fn polyfit(xs: &[f64], ys: &[f64], degree: usize) -> Option<Vec<f64>> {
    let terms = degree + 1;
    if xs.len() != ys.len() || xs.len() < terms {
        return None;
    }

    // Normal equations: (A^T A) c = A^T y with A[i][j] = x_i^j
    let mut normal = Array2::<f64>::zeros((terms, terms));
    let mut rhs = Array1::<f64>::zeros(terms);
    for (&x, &y) in xs.iter().zip(ys) {
        let powers: Vec<f64> = (0..terms).map(|j| x.powi(j as i32)).collect();
        for r in 0..terms {
            rhs[r] += powers[r] * y;
            for c in 0..terms {
                normal[[r, c]] += powers[r] * powers[c];
            }
        }
    }

    solve_linear_system(normal, rhs).map(|c| c.to_vec())
}

/// Evaluate a polynomial with coefficients lowest order first
pub fn polyval(coefficients: &[f64], x: f64) -> f64 {
    coefficients.iter().rev().fold(0.0, |acc, c| acc * x + c)
}

/// Gaussian elimination with partial pivoting
fn solve_linear_system(mut a: Array2<f64>, mut b: Array1<f64>) -> Option<Array1<f64>> {
    let n = b.len();
    for col in 0..n {
        let pivot = (col..n).max_by(|&i, &j| a[[i, col]].abs().total_cmp(&a[[j, col]].abs()))?;
        if a[[pivot, col]].abs() < 1e-12 {
            return None;
        }
        if pivot != col {
            for k in 0..n {
                a.swap([col, k], [pivot, k]);
            }
            b.swap(col, pivot);
        }
        for row in (col + 1)..n {
            let factor = a[[row, col]] / a[[col, col]];
            for k in col..n {
                a[[row, k]] -= factor * a[[col, k]];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = Array1::<f64>::zeros(n);
    for row in (0..n).rev() {
        let tail: f64 = ((row + 1)..n).map(|k| a[[row, k]] * x[k]).sum();
        x[row] = (b[row] - tail) / a[[row, row]];
    }
    Some(x)
}

/// Savitzky-Golay smoothing.
///
/// Interior points use the centered convolution weights; the first and last
/// `window / 2` points come from a polynomial fitted to the edge window.
/// Inputs shorter than the window, or invalid parameters, are returned unchanged.
pub fn savgol_filter(values: &[f64], window: usize, order: usize) -> Vec<f64> {
    let n = values.len();
    if window % 2 == 0 || window <= order || n < window {
        return values.to_vec();
    }
    let half = window / 2;

    let offsets: Vec<f64> = (0..window).map(|i| i as f64 - half as f64).collect();
    let Some(weights) = convolution_weights(&offsets, order) else {
        return values.to_vec();
    };

    let mut smoothed = values.to_vec();
    for center in half..(n - half) {
        smoothed[center] = weights
            .iter()
            .zip(&values[center - half..=center + half])
            .map(|(w, v)| w * v)
            .sum();
    }

    // Edge fits use centered positions to keep the normal equations well conditioned
    if let Some(head) = polyfit(&offsets, &values[..window], order) {
        for i in 0..half {
            smoothed[i] = polyval(&head, offsets[i]);
        }
    }
    if let Some(tail) = polyfit(&offsets, &values[n - window..], order) {
        for i in (window - half)..window {
            smoothed[n - window + i] = polyval(&tail, offsets[i]);
        }
    }

    smoothed
}

/// Weights that evaluate the local polynomial fit at offset 0
fn convolution_weights(offsets: &[f64], order: usize) -> Option<Vec<f64>> {
    let terms = order + 1;
    let mut normal = Array2::<f64>::zeros((terms, terms));
    for &x in offsets {
        for r in 0..terms {
            for c in 0..terms {
                normal[[r, c]] += x.powi((r + c) as i32);
            }
        }
    }
    let mut unit = Array1::<f64>::zeros(terms);
    unit[0] = 1.0;
    let z = solve_linear_system(normal, unit)?;

    Some(
        offsets
            .iter()
            .map(|&x| (0..terms).map(|j| z[j] * x.powi(j as i32)).sum())
            .collect(),
    )
}

/// Indices of local maxima whose prominence is at least `min_prominence`.
///
/// A flat-topped maximum is reported at the middle of its plateau. The
/// prominence of a peak is its height above the higher of the two lowest
/// points reached before the signal climbs above the peak on either side.
pub fn find_peaks(values: &[f64], min_prominence: f64) -> Vec<usize> {
    local_maxima(values)
        .into_iter()
        .filter(|&peak| prominence(values, peak) >= min_prominence)
        .collect()
}

/// Indices of local minima whose prominence is at least `min_prominence`
pub fn find_valleys(values: &[f64], min_prominence: f64) -> Vec<usize> {
    let inverted: Vec<f64> = values.iter().map(|v| -v).collect();
    find_peaks(&inverted, min_prominence)
}

fn local_maxima(values: &[f64]) -> Vec<usize> {
    let n = values.len();
    let mut maxima = Vec::new();
    if n < 3 {
        return maxima;
    }

    let mut i = 1;
    while i < n - 1 {
        if values[i - 1] < values[i] {
            let mut ahead = i + 1;
            while ahead < n - 1 && values[ahead] == values[i] {
                ahead += 1;
            }
            if values[ahead] < values[i] {
                maxima.push((i + ahead - 1) / 2);
                i = ahead;
                continue;
            }
        }
        i += 1;
    }
    maxima
}

fn prominence(values: &[f64], peak: usize) -> f64 {
    let height = values[peak];

    let mut left_min = height;
    let mut i = peak;
    loop {
        if values[i] > height {
            break;
        }
        left_min = left_min.min(values[i]);
        if i == 0 {
            break;
        }
        i -= 1;
    }

    let mut right_min = height;
    for &v in &values[peak..] {
        if v > height {
            break;
        }
        right_min = right_min.min(v);
    }

    height - left_min.max(right_min)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_polyfit_recovers_cubic() {
        let xs: Vec<f64> = (0..8).map(|i| i as f64).collect();
        let ys: Vec<f64> = xs.iter().map(|x| 1.0 - 2.0 * x + 0.5 * x * x * x).collect();
        let c = polyfit(&xs, &ys, 3).unwrap();
        assert!((c[0] - 1.0).abs() < 1e-6);
        assert!((c[1] + 2.0).abs() < 1e-6);
        assert!(c[2].abs() < 1e-6);
        assert!((c[3] - 0.5).abs() < 1e-6);
        assert!((polyval(&c, 2.0) - (1.0 - 4.0 + 4.0)).abs() < 1e-6);
    }

    #[test]
    fn test_savgol_weights_match_closed_form() {
        // Window 11, order 3: (267 - 15 i^2) / 1287
        let offsets: Vec<f64> = (-5..=5).map(|i| i as f64).collect();
        let weights = convolution_weights(&offsets, 3).unwrap();
        for (w, i) in weights.iter().zip(-5i32..=5) {
            let expected = (267.0 - 15.0 * (i * i) as f64) / 1287.0;
            assert!((w - expected).abs() < 1e-9);
        }
    }

    #[test]
    fn test_savgol_preserves_cubic_signal() {
        let values: Vec<f64> = (0..30).map(|i| (i as f64 - 15.0).powi(3) * 0.01).collect();
        let smoothed = savgol_filter(&values, 11, 3);
        for (a, b) in values.iter().zip(&smoothed) {
            assert!((a - b).abs() < 1e-6);
        }
    }

    #[test]
    fn test_savgol_short_input_unchanged() {
        let values = vec![1.0, 5.0, 2.0];
        assert_eq!(savgol_filter(&values, 11, 3), values);
    }

    #[test]
    fn test_find_peaks_with_prominence() {
        let values = vec![0.0, 10.0, 9.0, 30.0, 0.0, 2.0, 1.0, 40.0, 0.0];
        // 10.0 rises only 1 above its right dip before a higher point
        assert_eq!(find_peaks(&values, 5.0), vec![3, 7]);
        assert_eq!(find_peaks(&values, 0.5), vec![1, 3, 5, 7]);
    }

    #[test]
    fn test_plateau_peak_reports_middle() {
        let values = vec![0.0, 5.0, 5.0, 5.0, 0.0];
        assert_eq!(find_peaks(&values, 1.0), vec![2]);
    }

    #[test]
    fn test_find_valleys() {
        let values = vec![170.0, 90.0, 170.0, 160.0, 85.0, 170.0];
        assert_eq!(find_valleys(&values, 25.0), vec![1, 4]);
    }

    #[test]
    fn test_edges_are_never_peaks() {
        assert!(find_peaks(&[10.0, 0.0, 10.0], 1.0).is_empty());
        assert!(find_peaks(&[], 1.0).is_empty());
    }
}
