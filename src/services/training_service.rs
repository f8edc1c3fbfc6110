/// Reference Model Training
///
/// Offline pipeline over a corpus of expert recordings for one exercise:
/// extract angles, segment each recording into reps, then aggregate every
/// rep into a reference model. Recordings are processed independently.

use serde::{Deserialize, Serialize};

use crate::config::CoachConfig;
use crate::error::Result;
use crate::models::{Recording, ReferenceModel, Rep};
use crate::services::angle_extractor::AngleExtractor;
use crate::services::model_store::ModelStore;
use crate::services::reference_model_builder::ReferenceModelBuilder;
use crate::services::rep_segmenter::RepSegmenter;

/// What one recording contributed to training
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingSummary {
    pub name: String,
    pub frames: usize,
    pub detected_frames: usize,
    pub reps: usize,
    pub min_angle: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingReport {
    pub exercise_id: String,
    pub recordings: Vec<RecordingSummary>,
    pub model: ReferenceModel,
}

impl TrainingReport {
    pub fn total_reps(&self) -> usize {
        self.recordings.iter().map(|r| r.reps).sum()
    }
}

#[derive(Debug, Clone)]
pub struct TrainingService {
    exercise_id: String,
    extractor: AngleExtractor,
    segmenter: RepSegmenter,
    builder: ReferenceModelBuilder,
    frame_width: f64,
    frame_height: f64,
}

impl TrainingService {
    /// Fails with `UnknownExercise` when the exercise is not configured
    pub fn new(config: &CoachConfig, exercise_id: &str) -> Result<Self> {
        let exercise = config.exercise(exercise_id)?;
        Ok(Self {
            exercise_id: exercise_id.to_string(),
            extractor: AngleExtractor::new(exercise.triplets.clone()),
            segmenter: RepSegmenter::from_config(&config.segmentation),
            builder: ReferenceModelBuilder::new(exercise_id, config.segmentation.trajectory_points),
            frame_width: 1.0,
            frame_height: 1.0,
        })
    }

    /// Pixel size used to scale normalized landmark coordinates
    pub fn with_frame_size(mut self, width: f64, height: f64) -> Self {
        self.frame_width = width;
        self.frame_height = height;
        self
    }

    pub fn exercise_id(&self) -> &str {
        &self.exercise_id
    }

    /// Extract angles from one recording and cut it into reps
    pub fn segment_recording(&self, recording: &Recording) -> (Vec<Rep>, RecordingSummary) {
        let angles = self.extractor.extract_sequence(
            recording.detected(),
            self.frame_width,
            self.frame_height,
        );
        let reps = self.segmenter.segment(&angles);

        let min_angle = angles.iter().copied().reduce(f64::min);
        let summary = RecordingSummary {
            name: recording.name.clone(),
            frames: recording.len(),
            detected_frames: angles.len(),
            reps: reps.len(),
            min_angle,
        };

        if reps.is_empty() {
            tracing::warn!(
                "{}: no reps found in {} usable frames",
                recording.name,
                angles.len()
            );
        } else {
            tracing::info!(
                "{}: {} reps, min angle {:.1}",
                recording.name,
                reps.len(),
                min_angle.unwrap_or_default()
            );
        }
        (reps, summary)
    }

    /// Build a reference model from every rep in the corpus.
    ///
    /// Fails with `EmptyCorpus` when no recording yields a rep.
    pub fn train(&self, recordings: &[Recording]) -> Result<TrainingReport> {
        let mut all_reps = Vec::new();
        let mut summaries = Vec::with_capacity(recordings.len());
        for recording in recordings {
            let (reps, summary) = self.segment_recording(recording);
            all_reps.extend(reps);
            summaries.push(summary);
        }

        let model = self.builder.build_from_reps(&all_reps)?;
        if let Some(bottom) = &model.bottom_angle {
            tracing::info!(
                "Trained {} from {} reps, bottom angle {:.1} +/- {:.1}",
                self.exercise_id,
                model.sample_count,
                bottom.mean_deg,
                bottom.std_deg
            );
        }

        Ok(TrainingReport {
            exercise_id: self.exercise_id.clone(),
            recordings: summaries,
            model,
        })
    }

    /// Train and persist; nothing is written when training fails
    pub fn train_and_save(&self, recordings: &[Recording], store: &dyn ModelStore) -> Result<TrainingReport> {
        let report = self.train(recordings)?;
        store.save(&report.model)?;
        Ok(report)
    }
}
