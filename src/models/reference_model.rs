use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoachError, Result};

/// Mean/std statistics of the raw valley angle across training reps
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BottomAngleStats {
    pub mean_deg: f64,
    pub std_deg: f64,
}

/// Statistical summary of expert reps for one exercise.
///
/// Immutable once built; sessions share it behind an `Arc`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceModel {
    pub exercise_id: String,
    pub mean_curve: Vec<f64>,
    pub std_curve: Vec<f64>,
    pub sample_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bottom_angle: Option<BottomAngleStats>,
    pub trained_at: DateTime<Utc>,
}

impl ReferenceModel {
    /// Number of points every compared trajectory must have
    pub fn len(&self) -> usize {
        self.mean_curve.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mean_curve.is_empty()
    }

    /// Check structural invariants before a model is persisted or used
    pub fn validate(&self) -> Result<()> {
        if self.sample_count == 0 {
            return Err(CoachError::InvalidModel(
                "sample_count must be at least 1".to_string(),
            ));
        }
        if self.mean_curve.is_empty() {
            return Err(CoachError::InvalidModel("mean_curve is empty".to_string()));
        }
        if self.mean_curve.len() != self.std_curve.len() {
            return Err(CoachError::InvalidModel(format!(
                "mean_curve has {} points but std_curve has {}",
                self.mean_curve.len(),
                self.std_curve.len()
            )));
        }
        if self.std_curve.iter().any(|s| !s.is_finite() || *s < 0.0) {
            return Err(CoachError::InvalidModel(
                "std_curve must be finite and non-negative".to_string(),
            ));
        }
        if self.mean_curve.iter().any(|m| !m.is_finite()) {
            return Err(CoachError::InvalidModel(
                "mean_curve must be finite".to_string(),
            ));
        }
        Ok(())
    }
}
