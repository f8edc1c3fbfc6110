use serde::{Deserialize, Serialize};
use std::ops::Deref;

/// One repetition cut out of an angle sequence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rep {
    /// Index of the first sample (top of the motion)
    pub start_index: usize,
    /// Index of the last sample, inclusive
    pub end_index: usize,
    /// Index of the deepest sample, start_index < valley_index < end_index for offline reps
    pub valley_index: usize,
    /// Raw angles in degrees over start_index..=end_index
    pub raw_trajectory: Vec<f64>,
}

impl Rep {
    /// Raw angle at the valley
    pub fn valley_angle(&self) -> Option<f64> {
        self.valley_index
            .checked_sub(self.start_index)
            .and_then(|offset| self.raw_trajectory.get(offset))
            .copied()
    }

    pub fn len(&self) -> usize {
        self.raw_trajectory.len()
    }

    pub fn is_empty(&self) -> bool {
        self.raw_trajectory.is_empty()
    }
}

/// Fixed-length curve in [0, 1]; 0 is the deepest point, 1 the most extended
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NormalizedTrajectory(Vec<f64>);

impl NormalizedTrajectory {
    pub fn new(points: Vec<f64>) -> Self {
        Self(points)
    }

    pub fn zeros(n: usize) -> Self {
        Self(vec![0.0; n])
    }

    pub fn into_inner(self) -> Vec<f64> {
        self.0
    }

    /// Index of the minimum (first one on ties)
    pub fn argmin(&self) -> usize {
        argmin(&self.0)
    }
}

impl Deref for NormalizedTrajectory {
    type Target = [f64];

    fn deref(&self) -> &[f64] {
        &self.0
    }
}

impl AsRef<[f64]> for NormalizedTrajectory {
    fn as_ref(&self) -> &[f64] {
        &self.0
    }
}

pub(crate) fn argmin(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, v) in values.iter().enumerate() {
        if *v < values[best] {
            best = i;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valley_angle_offsets_from_start() {
        let rep = Rep {
            start_index: 10,
            end_index: 14,
            valley_index: 12,
            raw_trajectory: vec![170.0, 120.0, 85.0, 130.0, 168.0],
        };
        assert_eq!(rep.valley_angle(), Some(85.0));
        assert_eq!(rep.len(), 5);
    }

    #[test]
    fn test_valley_angle_out_of_range() {
        let rep = Rep {
            start_index: 10,
            end_index: 11,
            valley_index: 3,
            raw_trajectory: vec![1.0, 2.0],
        };
        assert_eq!(rep.valley_angle(), None);
    }

    #[test]
    fn test_argmin_first_on_ties() {
        let t = NormalizedTrajectory::new(vec![0.5, 0.0, 0.3, 0.0]);
        assert_eq!(t.argmin(), 1);
        assert_eq!(argmin(&[]), 0);
    }
}
