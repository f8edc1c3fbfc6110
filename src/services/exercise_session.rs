/// Live Exercise Session
///
/// Owns everything one processing loop needs: the angle extractor, the rep
/// state machine, a shared read-only reference model and the rep target.
/// Each frame is processed to completion before the next is accepted.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::config::CoachConfig;
use crate::error::{CoachError, Result};
use crate::models::{LandmarkSet, ReferenceModel, SessionEvent, SessionSummary};
use crate::services::angle_extractor::AngleExtractor;
use crate::services::form_scoring_service::FormScorer;
use crate::services::rep_state_machine::{RepPhase, RepStateMachine, RepThresholds, StepOutcome};

/// One frame handed over by the capture loop
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// `None` when the pose estimator found no person
    pub landmarks: Option<LandmarkSet>,
    pub width: f64,
    pub height: f64,
}

impl Frame {
    pub fn detected(landmarks: LandmarkSet, width: f64, height: f64) -> Self {
        Self {
            landmarks: Some(landmarks),
            width,
            height,
        }
    }

    pub fn empty(width: f64, height: f64) -> Self {
        Self {
            landmarks: None,
            width,
            height,
        }
    }
}

/// Frame channel with room for a single frame; the sender waits while the
/// session is still busy with the previous one
pub fn frame_channel() -> (mpsc::Sender<Frame>, mpsc::Receiver<Frame>) {
    mpsc::channel(1)
}

#[derive(Debug)]
pub struct ExerciseSession {
    id: Uuid,
    exercise_id: String,
    target_reps: u32,
    extractor: AngleExtractor,
    machine: RepStateMachine,
    scorer: FormScorer,
    model: Arc<ReferenceModel>,
    reps_scored: u32,
    quality_total: f64,
    last_symmetry: Option<f64>,
    completed: bool,
}

impl ExerciseSession {
    /// Set up a session, failing fast on configuration or model problems.
    ///
    /// `target_reps` of 0 means the session never completes on its own.
    pub fn start(
        config: &CoachConfig,
        exercise_id: &str,
        model: Option<Arc<ReferenceModel>>,
        target_reps: u32,
    ) -> Result<Self> {
        let exercise = config.exercise(exercise_id)?;
        let model = model.ok_or_else(|| CoachError::ModelUnavailable(exercise_id.to_string()))?;
        model.validate()?;
        if model.exercise_id != exercise_id {
            return Err(CoachError::InvalidModel(format!(
                "model was trained for '{}', not '{}'",
                model.exercise_id, exercise_id
            )));
        }

        let id = Uuid::new_v4();
        tracing::info!(
            "Starting {} session {} (target {} reps)",
            exercise_id,
            id,
            target_reps
        );

        Ok(Self {
            id,
            exercise_id: exercise_id.to_string(),
            target_reps,
            extractor: AngleExtractor::new(exercise.triplets.clone()),
            machine: RepStateMachine::new(RepThresholds::new(exercise, &config.rep_detection)),
            scorer: FormScorer::new(config.scoring.clone()),
            model,
            reps_scored: 0,
            quality_total: 0.0,
            last_symmetry: None,
            completed: false,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn exercise_id(&self) -> &str {
        &self.exercise_id
    }

    pub fn rep_count(&self) -> u32 {
        self.machine.rep_count()
    }

    pub fn phase(&self) -> RepPhase {
        self.machine.phase()
    }

    pub fn is_complete(&self) -> bool {
        self.completed
    }

    /// Bilateral symmetry of the last frame with a usable detection
    pub fn last_symmetry(&self) -> Option<f64> {
        self.last_symmetry
    }

    pub fn started_event(&self) -> SessionEvent {
        SessionEvent::Started {
            session_id: self.id,
            exercise_id: self.exercise_id.clone(),
            target_reps: self.target_reps,
            at: Utc::now(),
        }
    }

    /// Process one frame; returns the events it produced.
    ///
    /// Frames without a usable detection are skipped and leave the state
    /// machine untouched. Frames after completion are ignored.
    pub fn process_frame(&mut self, frame: &Frame) -> Vec<SessionEvent> {
        if self.completed {
            return Vec::new();
        }
        let Some(landmarks) = frame.landmarks.as_ref() else {
            tracing::debug!("No person detected, frame skipped");
            return Vec::new();
        };
        let sample = match self.extractor.extract(landmarks, frame.width, frame.height) {
            Ok(sample) => sample,
            Err(e) => {
                tracing::debug!("Frame skipped: {}", e);
                return Vec::new();
            }
        };
        self.last_symmetry = sample.symmetry;

        let mut events = Vec::new();
        match self.machine.step(sample.angle) {
            StepOutcome::Continue => {}
            StepOutcome::RepCompleted { rep_number, rep } => {
                let result = self.scorer.score_rep(&rep.raw_trajectory, &self.model);
                self.reps_scored += 1;
                self.quality_total += result.quality_score;
                tracing::info!(
                    "Rep {} scored {:.0} ({})",
                    rep_number,
                    result.quality_score,
                    result.feedback.text()
                );
                events.push(SessionEvent::RepScored {
                    session_id: self.id,
                    rep_number,
                    target_reps: self.target_reps,
                    result,
                    at: Utc::now(),
                });
                self.check_target(rep_number, &mut events);
            }
            StepOutcome::RepDiscarded { rep_number, .. } => {
                self.check_target(rep_number, &mut events);
            }
        }
        events
    }

    fn check_target(&mut self, rep_number: u32, events: &mut Vec<SessionEvent>) {
        if self.target_reps > 0 && rep_number >= self.target_reps {
            self.completed = true;
            tracing::info!("Session {} reached {} reps", self.id, rep_number);
            events.push(SessionEvent::SessionComplete {
                session_id: self.id,
                total_reps: rep_number,
                at: Utc::now(),
            });
        }
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            session_id: self.id,
            exercise_id: self.exercise_id.clone(),
            target_reps: self.target_reps,
            reps_counted: self.machine.rep_count(),
            reps_scored: self.reps_scored,
            mean_quality: (self.reps_scored > 0).then(|| self.quality_total / self.reps_scored as f64),
            completed: self.completed,
        }
    }

    /// Drive the session from a frame channel until the source ends, the
    /// target is reached or `cancel` fires.
    ///
    /// Cancellation is checked at every frame boundary. A rep in progress
    /// when the loop stops is dropped, never scored. Events go out without
    /// waiting on the receiver; a closed event channel does not stop the loop.
    pub async fn run(
        mut self,
        mut frames: mpsc::Receiver<Frame>,
        events: mpsc::UnboundedSender<SessionEvent>,
        cancel: CancellationToken,
    ) -> SessionSummary {
        let _ = events.send(self.started_event());

        loop {
            let frame = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::info!("Session {} cancelled", self.id);
                    break;
                }
                frame = frames.recv() => match frame {
                    Some(frame) => frame,
                    None => break,
                },
            };

            for event in self.process_frame(&frame) {
                if events.send(event).is_err() {
                    tracing::debug!("Event receiver closed");
                }
            }
            if self.completed {
                break;
            }
        }

        if self.machine.pending_samples() > 0 {
            tracing::debug!(
                "Dropping partial rep with {} samples",
                self.machine.pending_samples()
            );
        }
        self.machine.reset();

        let summary = self.summary();
        tracing::info!(
            "Session {} finished: {} reps counted, {} scored",
            summary.session_id,
            summary.reps_counted,
            summary.reps_scored
        );
        summary
    }
}
