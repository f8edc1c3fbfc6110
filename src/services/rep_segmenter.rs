/// Offline Rep Segmentation
///
/// Splits the angle sequence of one training recording into reps: smooth,
/// find prominent peaks (extended) and valleys (flexed), then cut one rep per
/// pair of consecutive peaks that has a valley between them.

use crate::config::SegmentationConfig;
use crate::models::Rep;
use crate::services::signal_processing::{find_peaks, find_valleys, savgol_filter};

#[derive(Debug, Clone)]
pub struct RepSegmenter {
    prominence_deg: f64,
    smoothing_window: usize,
    smoothing_order: usize,
}

impl RepSegmenter {
    /// Segmenter with an 11-sample cubic smoothing window
    pub fn new(prominence_deg: f64) -> Self {
        Self {
            prominence_deg,
            smoothing_window: 11,
            smoothing_order: 3,
        }
    }

    pub fn from_config(config: &SegmentationConfig) -> Self {
        Self {
            prominence_deg: config.prominence_deg,
            smoothing_window: config.smoothing_window,
            smoothing_order: config.smoothing_order,
        }
    }

    pub fn prominence_deg(&self) -> f64 {
        self.prominence_deg
    }

    /// Smoothed copy of the sequence; shorter than the window means unsmoothed
    pub fn smooth(&self, angles: &[f64]) -> Vec<f64> {
        if angles.len() >= self.smoothing_window {
            savgol_filter(angles, self.smoothing_window, self.smoothing_order)
        } else {
            angles.to_vec()
        }
    }

    /// Cut reps out of a full recording.
    ///
    /// Peaks and valleys are located on the smoothed curve but each rep keeps
    /// the raw angles. Fewer than two peaks gives an empty result.
    pub fn segment(&self, angles: &[f64]) -> Vec<Rep> {
        let smoothed = self.smooth(angles);
        let peaks = find_peaks(&smoothed, self.prominence_deg);
        let valleys = find_valleys(&smoothed, self.prominence_deg);

        tracing::debug!(
            "Segmenting {} samples: {} peaks, {} valleys",
            angles.len(),
            peaks.len(),
            valleys.len()
        );

        if peaks.len() < 2 || valleys.is_empty() {
            return Vec::new();
        }

        peaks
            .windows(2)
            .filter_map(|pair| {
                let (start, end) = (pair[0], pair[1]);
                let valley = valleys.iter().copied().find(|&v| start < v && v < end)?;
                Some(Rep {
                    start_index: start,
                    end_index: end,
                    valley_index: valley,
                    raw_trajectory: angles[start..=end].to_vec(),
                })
            })
            .collect()
    }
}

impl Default for RepSegmenter {
    fn default() -> Self {
        Self::new(25.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    /// `cycles` full periods starting and ending at the bottom of the motion
    fn sinusoid(cycles: usize, period: usize, amplitude: f64) -> Vec<f64> {
        (0..=cycles * period)
            .map(|i| 125.0 - amplitude * (2.0 * PI * i as f64 / period as f64).cos())
            .collect()
    }

    #[test]
    fn test_k_cycles_give_k_minus_one_reps() {
        let segmenter = RepSegmenter::new(25.0);
        for cycles in [2usize, 4, 6] {
            let angles = sinusoid(cycles, 40, 45.0);
            let reps = segmenter.segment(&angles);
            assert_eq!(reps.len(), cycles - 1, "cycles = {}", cycles);
            for rep in &reps {
                assert!(rep.start_index < rep.valley_index);
                assert!(rep.valley_index < rep.end_index);
                assert_eq!(rep.raw_trajectory.len(), rep.end_index - rep.start_index + 1);
            }
        }
    }

    #[test]
    fn test_rep_spans_peak_to_peak() {
        let angles = sinusoid(3, 40, 45.0);
        let reps = RepSegmenter::default().segment(&angles);
        assert_eq!(reps[0].start_index, 20);
        assert_eq!(reps[0].valley_index, 40);
        assert_eq!(reps[0].end_index, 60);
        assert_eq!(reps[0].raw_trajectory[0], angles[20]);
        let valley = reps[0].valley_angle().unwrap();
        assert!((valley - 80.0).abs() < 1e-9);
    }

    #[test]
    fn test_small_wobble_is_not_a_rep() {
        // 10 degree swings stay below the prominence threshold
        let angles = sinusoid(5, 30, 5.0);
        assert!(RepSegmenter::new(25.0).segment(&angles).is_empty());
    }

    #[test]
    fn test_short_and_empty_sequences() {
        let segmenter = RepSegmenter::default();
        assert!(segmenter.segment(&[]).is_empty());
        assert!(segmenter.segment(&[170.0, 90.0, 170.0]).is_empty());
    }

    #[test]
    fn test_short_sequence_is_not_smoothed() {
        let segmenter = RepSegmenter::default();
        let angles = vec![170.0, 120.0, 90.0, 130.0];
        assert_eq!(segmenter.smooth(&angles), angles);
    }
}
