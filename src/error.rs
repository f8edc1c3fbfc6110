use thiserror::Error;

/// Errors surfaced by the analysis core.
///
/// Short or noisy input is never an error here: the normalizer and the
/// segmenters degrade to zero-filled or empty outputs instead.
#[derive(Error, Debug)]
pub enum CoachError {
    #[error("No person detected in frame")]
    MissingDetection,
    #[error("Cannot build a reference model from zero reps")]
    EmptyCorpus,
    #[error("No reference model available for exercise '{0}'")]
    ModelUnavailable(String),
    #[error("Unknown exercise '{0}'")]
    UnknownExercise(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Invalid reference model: {0}")]
    InvalidModel(String),
    #[error("Invalid recording: {0}")]
    InvalidRecording(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, CoachError>;
