// Analysis core and the session/training services built on it

pub mod angle_extractor;
pub mod exercise_session;
pub mod feedback_scheduler;
pub mod form_scoring_service;
pub mod model_store;
pub mod reference_model_builder;
pub mod rep_segmenter;
pub mod rep_state_machine;
pub mod signal_processing;
pub mod training_service;
pub mod trajectory_normalizer;

pub use angle_extractor::AngleExtractor;
pub use exercise_session::{frame_channel, ExerciseSession, Frame};
pub use feedback_scheduler::{
    spawn_feedback_worker, FeedbackCategory, FeedbackScheduler, LoggingSpeechSink, Priority,
    SpeechSink, Utterance,
};
pub use form_scoring_service::FormScorer;
pub use model_store::{InMemoryModelStore, JsonModelStore, ModelStore};
pub use reference_model_builder::ReferenceModelBuilder;
pub use rep_segmenter::RepSegmenter;
pub use rep_state_machine::{RepPhase, RepStateMachine, RepThresholds, StepOutcome};
pub use training_service::{RecordingSummary, TrainingReport, TrainingService};
pub use trajectory_normalizer::{normalize_trajectory, DEFAULT_TRAJECTORY_POINTS};
