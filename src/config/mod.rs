use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{CoachError, Result};
use crate::models::{JointTriplet, PoseLandmark};

/// Top-level configuration, loaded from TOML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoachConfig {
    #[serde(default = "default_models_dir")]
    pub models_dir: PathBuf,

    #[serde(default = "default_exercises")]
    pub exercises: BTreeMap<String, ExerciseConfig>,

    #[serde(default)]
    pub segmentation: SegmentationConfig,

    #[serde(default)]
    pub rep_detection: RepDetectionConfig,

    #[serde(default)]
    pub scoring: ScoringConfig,

    #[serde(default)]
    pub feedback: FeedbackConfig,
}

/// Landmarks and thresholds for one exercise
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseConfig {
    pub name: String,
    /// One triplet per limb; two triplets are averaged and give a symmetry value
    pub triplets: Vec<JointTriplet>,
    pub extended_threshold_deg: f64,
    pub flexed_threshold_deg: f64,
}

/// Offline segmentation and normalization parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentationConfig {
    #[serde(default = "default_prominence")]
    pub prominence_deg: f64,

    #[serde(default = "default_trajectory_points")]
    pub trajectory_points: usize,

    #[serde(default = "default_smoothing_window")]
    pub smoothing_window: usize,

    #[serde(default = "default_smoothing_order")]
    pub smoothing_order: usize,
}

/// Live rep-boundary debouncing parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepDetectionConfig {
    /// Samples kept from the top of the motion to seed a rep
    #[serde(default = "default_dwell_samples")]
    pub dwell_samples: usize,

    /// Frames absorbed after the angle returns above the extended threshold
    #[serde(default = "default_finish_frames")]
    pub finish_frames: usize,

    /// Angle above the extended threshold that ends the finishing window early
    #[serde(default = "default_lockout_margin")]
    pub lockout_margin_deg: f64,

    /// Reps with this many samples or fewer are dropped as noise
    #[serde(default = "default_min_rep_samples")]
    pub min_rep_samples: usize,
}

/// Thresholds and penalties of the form scorer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    #[serde(default = "default_depth_high_ratio")]
    pub depth_high_ratio: f64,
    #[serde(default = "default_depth_low_ratio")]
    pub depth_low_ratio: f64,
    #[serde(default = "default_tempo_fast_descent_ratio")]
    pub tempo_fast_descent_ratio: f64,
    #[serde(default = "default_tempo_fast_ascent_ratio")]
    pub tempo_fast_ascent_ratio: f64,
    #[serde(default = "default_smoothness_ratio")]
    pub smoothness_ratio: f64,
    #[serde(default = "default_z_threshold")]
    pub z_threshold: f64,
    #[serde(default = "default_z_std_floor")]
    pub z_std_floor: f64,
    #[serde(default = "default_early_phase_limit")]
    pub early_phase_limit: f64,
    #[serde(default = "default_late_phase_limit")]
    pub late_phase_limit: f64,
    #[serde(default = "default_high_penalty")]
    pub high_penalty: f64,
    #[serde(default = "default_medium_penalty")]
    pub medium_penalty: f64,
    #[serde(default = "default_low_penalty")]
    pub low_penalty: f64,
    #[serde(default = "default_perfect_score")]
    pub perfect_score: f64,
    #[serde(default = "default_very_good_score")]
    pub very_good_score: f64,
}

/// Per-category cooldowns of the feedback scheduler, in seconds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackConfig {
    #[serde(default = "default_rep_count_cooldown")]
    pub rep_count_secs: f64,
    #[serde(default = "default_form_feedback_cooldown")]
    pub form_feedback_secs: f64,
    #[serde(default = "default_error_warning_cooldown")]
    pub error_warning_secs: f64,
    #[serde(default)]
    pub milestone_secs: f64,
    #[serde(default = "default_encouragement_cooldown")]
    pub encouragement_secs: f64,
}

// Default value functions
fn default_models_dir() -> PathBuf {
    PathBuf::from("models")
}

fn default_exercises() -> BTreeMap<String, ExerciseConfig> {
    let mut exercises = BTreeMap::new();
    exercises.insert(
        "pushup".to_string(),
        ExerciseConfig {
            name: "Push-up".to_string(),
            triplets: vec![
                JointTriplet::from_landmarks(
                    PoseLandmark::LeftShoulder,
                    PoseLandmark::LeftElbow,
                    PoseLandmark::LeftWrist,
                ),
                JointTriplet::from_landmarks(
                    PoseLandmark::RightShoulder,
                    PoseLandmark::RightElbow,
                    PoseLandmark::RightWrist,
                ),
            ],
            extended_threshold_deg: 160.0,
            flexed_threshold_deg: 90.0,
        },
    );
    exercises.insert(
        "squat".to_string(),
        ExerciseConfig {
            name: "Squat".to_string(),
            triplets: vec![
                JointTriplet::from_landmarks(
                    PoseLandmark::LeftHip,
                    PoseLandmark::LeftKnee,
                    PoseLandmark::LeftAnkle,
                ),
                JointTriplet::from_landmarks(
                    PoseLandmark::RightHip,
                    PoseLandmark::RightKnee,
                    PoseLandmark::RightAnkle,
                ),
            ],
            extended_threshold_deg: 160.0,
            flexed_threshold_deg: 90.0,
        },
    );
    exercises
}

fn default_prominence() -> f64 {
    25.0
}

fn default_trajectory_points() -> usize {
    50
}

fn default_smoothing_window() -> usize {
    11
}

fn default_smoothing_order() -> usize {
    3
}

fn default_dwell_samples() -> usize {
    8
}

fn default_finish_frames() -> usize {
    8
}

fn default_lockout_margin() -> f64 {
    20.0
}

fn default_min_rep_samples() -> usize {
    5
}

fn default_depth_high_ratio() -> f64 {
    0.8
}

fn default_depth_low_ratio() -> f64 {
    0.9
}

fn default_tempo_fast_descent_ratio() -> f64 {
    0.6
}

fn default_tempo_fast_ascent_ratio() -> f64 {
    1.5
}

fn default_smoothness_ratio() -> f64 {
    2.0
}

fn default_z_threshold() -> f64 {
    2.0
}

fn default_z_std_floor() -> f64 {
    0.01
}

fn default_early_phase_limit() -> f64 {
    0.3
}

fn default_late_phase_limit() -> f64 {
    0.7
}

fn default_high_penalty() -> f64 {
    15.0
}

fn default_medium_penalty() -> f64 {
    8.0
}

fn default_low_penalty() -> f64 {
    3.0
}

fn default_perfect_score() -> f64 {
    90.0
}

fn default_very_good_score() -> f64 {
    80.0
}

fn default_rep_count_cooldown() -> f64 {
    0.5
}

fn default_form_feedback_cooldown() -> f64 {
    3.0
}

fn default_error_warning_cooldown() -> f64 {
    5.0
}

fn default_encouragement_cooldown() -> f64 {
    10.0
}

impl Default for CoachConfig {
    fn default() -> Self {
        Self {
            models_dir: default_models_dir(),
            exercises: default_exercises(),
            segmentation: SegmentationConfig::default(),
            rep_detection: RepDetectionConfig::default(),
            scoring: ScoringConfig::default(),
            feedback: FeedbackConfig::default(),
        }
    }
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            prominence_deg: default_prominence(),
            trajectory_points: default_trajectory_points(),
            smoothing_window: default_smoothing_window(),
            smoothing_order: default_smoothing_order(),
        }
    }
}

impl Default for RepDetectionConfig {
    fn default() -> Self {
        Self {
            dwell_samples: default_dwell_samples(),
            finish_frames: default_finish_frames(),
            lockout_margin_deg: default_lockout_margin(),
            min_rep_samples: default_min_rep_samples(),
        }
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            depth_high_ratio: default_depth_high_ratio(),
            depth_low_ratio: default_depth_low_ratio(),
            tempo_fast_descent_ratio: default_tempo_fast_descent_ratio(),
            tempo_fast_ascent_ratio: default_tempo_fast_ascent_ratio(),
            smoothness_ratio: default_smoothness_ratio(),
            z_threshold: default_z_threshold(),
            z_std_floor: default_z_std_floor(),
            early_phase_limit: default_early_phase_limit(),
            late_phase_limit: default_late_phase_limit(),
            high_penalty: default_high_penalty(),
            medium_penalty: default_medium_penalty(),
            low_penalty: default_low_penalty(),
            perfect_score: default_perfect_score(),
            very_good_score: default_very_good_score(),
        }
    }
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            rep_count_secs: default_rep_count_cooldown(),
            form_feedback_secs: default_form_feedback_cooldown(),
            error_warning_secs: default_error_warning_cooldown(),
            milestone_secs: 0.0,
            encouragement_secs: default_encouragement_cooldown(),
        }
    }
}

impl ExerciseConfig {
    fn validate(&self, id: &str) -> Result<()> {
        if self.triplets.is_empty() || self.triplets.len() > 2 {
            return Err(CoachError::InvalidConfig(format!(
                "exercise '{}' needs one or two joint triplets, got {}",
                id,
                self.triplets.len()
            )));
        }
        if self.flexed_threshold_deg >= self.extended_threshold_deg {
            return Err(CoachError::InvalidConfig(format!(
                "exercise '{}': flexed threshold {} must be below extended threshold {}",
                id, self.flexed_threshold_deg, self.extended_threshold_deg
            )));
        }
        Ok(())
    }
}

impl CoachConfig {
    /// Parse configuration from a TOML string and validate it
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: CoachConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file, falling back to defaults when absent
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!("Config file {} not found, using defaults", path.display());
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let contents = toml::to_string_pretty(self)
            .map_err(|e| CoachError::InvalidConfig(format!("cannot serialize config: {}", e)))?;
        fs::write(path, contents)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        for (id, exercise) in &self.exercises {
            exercise.validate(id)?;
        }

        let seg = &self.segmentation;
        if seg.trajectory_points < 2 {
            return Err(CoachError::InvalidConfig(
                "trajectory_points must be at least 2".to_string(),
            ));
        }
        if seg.smoothing_window % 2 == 0 || seg.smoothing_window <= seg.smoothing_order {
            return Err(CoachError::InvalidConfig(format!(
                "smoothing_window {} must be odd and greater than smoothing_order {}",
                seg.smoothing_window, seg.smoothing_order
            )));
        }
        if seg.prominence_deg <= 0.0 {
            return Err(CoachError::InvalidConfig(
                "prominence_deg must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Look up an exercise, failing fast on unknown ids
    pub fn exercise(&self, exercise_id: &str) -> Result<&ExerciseConfig> {
        self.exercises
            .get(exercise_id)
            .ok_or_else(|| CoachError::UnknownExercise(exercise_id.to_string()))
    }
}
