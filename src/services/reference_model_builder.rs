use chrono::Utc;
use ndarray::{Array2, Axis};
use statrs::statistics::Statistics;

use crate::error::{CoachError, Result};
use crate::models::{BottomAngleStats, ReferenceModel, Rep};
use crate::services::trajectory_normalizer::{normalize_trajectory, DEFAULT_TRAJECTORY_POINTS};

/// Aggregates expert reps into a mean curve with a per-point std band
#[derive(Debug, Clone)]
pub struct ReferenceModelBuilder {
    exercise_id: String,
    trajectory_points: usize,
}

impl ReferenceModelBuilder {
    pub fn new(exercise_id: impl Into<String>, trajectory_points: usize) -> Self {
        Self {
            exercise_id: exercise_id.into(),
            trajectory_points,
        }
    }

    pub fn trajectory_points(&self) -> usize {
        self.trajectory_points
    }

    /// Build from raw rep trajectories, normalizing each to the model length.
    ///
    /// Mean and population std are taken across reps, so input order does
    /// not matter. Fails with `EmptyCorpus` when there is nothing to aggregate.
    pub fn build_from_trajectories(&self, trajectories: &[Vec<f64>]) -> Result<ReferenceModel> {
        if trajectories.is_empty() || self.trajectory_points == 0 {
            return Err(CoachError::EmptyCorpus);
        }

        let n = self.trajectory_points;
        let mut stacked = Array2::<f64>::zeros((trajectories.len(), n));
        for (mut row, raw) in stacked.axis_iter_mut(Axis(0)).zip(trajectories) {
            let normalized = normalize_trajectory(raw, n);
            row.iter_mut()
                .zip(normalized.iter())
                .for_each(|(cell, value)| *cell = *value);
        }

        let mean_curve = stacked.mean_axis(Axis(0)).ok_or(CoachError::EmptyCorpus)?;
        let std_curve = stacked.std_axis(Axis(0), 0.0);

        let model = ReferenceModel {
            exercise_id: self.exercise_id.clone(),
            mean_curve: mean_curve.to_vec(),
            std_curve: std_curve.to_vec(),
            sample_count: trajectories.len(),
            bottom_angle: None,
            trained_at: Utc::now(),
        };

        tracing::info!(
            "Built reference model for {} from {} reps ({} points)",
            self.exercise_id,
            model.sample_count,
            n
        );
        Ok(model)
    }

    /// Build from segmented reps and record their bottom-angle statistics
    pub fn build_from_reps(&self, reps: &[Rep]) -> Result<ReferenceModel> {
        let trajectories: Vec<Vec<f64>> = reps.iter().map(|r| r.raw_trajectory.clone()).collect();
        let mut model = self.build_from_trajectories(&trajectories)?;
        model.bottom_angle = bottom_angle_stats(reps);
        Ok(model)
    }
}

/// Mean and population std of the raw valley angles, if any rep has one
pub fn bottom_angle_stats(reps: &[Rep]) -> Option<BottomAngleStats> {
    let valleys: Vec<f64> = reps.iter().filter_map(Rep::valley_angle).collect();
    if valleys.is_empty() {
        return None;
    }
    Some(BottomAngleStats {
        mean_deg: valleys.iter().mean(),
        std_deg: valleys.iter().population_std_dev(),
    })
}

impl Default for ReferenceModelBuilder {
    fn default() -> Self {
        Self::new("pushup", DEFAULT_TRAJECTORY_POINTS)
    }
}
