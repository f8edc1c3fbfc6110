/// Online Rep-Boundary Detection
///
/// Consumes one angle sample per live frame and reports each completed rep
/// once. Hysteresis between the flexed and extended thresholds plus a
/// finishing window keeps jitter near either boundary from double counting.
///
/// ```text
/// Idle --(> extended)--> Top --(< flexed)--> Descending
///   --(> extended)--> Finishing --(F frames or > extended + margin)--> Top
/// ```

use std::collections::VecDeque;

use crate::config::{ExerciseConfig, RepDetectionConfig};
use crate::models::{argmin, Rep};

/// Current phase of the live rep
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepPhase {
    /// No rep started yet
    Idle,
    /// Extended, waiting for the descent
    Top,
    /// Between the start of the descent and the return above the extended threshold
    Descending,
    /// Absorbing the lockout before the rep is counted
    Finishing,
}

/// What a single sample did to the machine
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    Continue,
    /// A rep was counted and is long enough to score
    RepCompleted { rep_number: u32, rep: Rep },
    /// A rep was counted but had too few samples to score
    RepDiscarded { rep_number: u32, samples: usize },
}

/// Thresholds the machine runs with
#[derive(Debug, Clone, PartialEq)]
pub struct RepThresholds {
    pub extended_deg: f64,
    pub flexed_deg: f64,
    pub lockout_margin_deg: f64,
    pub dwell_samples: usize,
    pub finish_frames: usize,
    pub min_rep_samples: usize,
}

impl RepThresholds {
    pub fn new(exercise: &ExerciseConfig, detection: &RepDetectionConfig) -> Self {
        Self {
            extended_deg: exercise.extended_threshold_deg,
            flexed_deg: exercise.flexed_threshold_deg,
            lockout_margin_deg: detection.lockout_margin_deg,
            dwell_samples: detection.dwell_samples,
            finish_frames: detection.finish_frames,
            min_rep_samples: detection.min_rep_samples,
        }
    }
}

/// Live rep-boundary state machine, owned by one processing loop
#[derive(Debug, Clone)]
pub struct RepStateMachine {
    thresholds: RepThresholds,
    phase: RepPhase,
    /// Most recent samples seen at the top, bounded by dwell_samples
    dwell: VecDeque<f64>,
    /// Samples of the rep in progress
    buffer: Vec<f64>,
    rep_start: usize,
    finishing_frames: usize,
    samples_seen: usize,
    rep_count: u32,
}

impl RepStateMachine {
    pub fn new(thresholds: RepThresholds) -> Self {
        let dwell = VecDeque::with_capacity(thresholds.dwell_samples.max(1));
        Self {
            thresholds,
            phase: RepPhase::Idle,
            dwell,
            buffer: Vec::new(),
            rep_start: 0,
            finishing_frames: 0,
            samples_seen: 0,
            rep_count: 0,
        }
    }

    pub fn phase(&self) -> RepPhase {
        self.phase
    }

    /// Reps counted so far, including discarded ones
    pub fn rep_count(&self) -> u32 {
        self.rep_count
    }

    /// Samples of the rep in progress
    pub fn pending_samples(&self) -> usize {
        self.buffer.len()
    }

    /// Feed one angle sample
    pub fn step(&mut self, angle: f64) -> StepOutcome {
        let index = self.samples_seen;
        self.samples_seen += 1;
        let t = &self.thresholds;

        match self.phase {
            RepPhase::Idle => {
                if angle > t.extended_deg {
                    self.enter_top(angle);
                }
                StepOutcome::Continue
            }
            RepPhase::Top => {
                if angle < t.flexed_deg {
                    self.buffer = self.dwell.drain(..).collect();
                    self.rep_start = index - self.buffer.len();
                    self.buffer.push(angle);
                    self.transition(RepPhase::Descending);
                } else {
                    self.push_dwell(angle);
                }
                StepOutcome::Continue
            }
            RepPhase::Descending => {
                self.buffer.push(angle);
                if angle > t.extended_deg {
                    self.finishing_frames = 0;
                    self.transition(RepPhase::Finishing);
                }
                StepOutcome::Continue
            }
            RepPhase::Finishing => {
                self.buffer.push(angle);
                self.finishing_frames += 1;
                if self.finishing_frames >= t.finish_frames
                    || angle > t.extended_deg + t.lockout_margin_deg
                {
                    let outcome = self.complete_rep(index);
                    self.enter_top(angle);
                    outcome
                } else {
                    StepOutcome::Continue
                }
            }
        }
    }

    /// Drop any rep in progress; nothing partial is ever emitted
    pub fn reset(&mut self) {
        self.phase = RepPhase::Idle;
        self.dwell.clear();
        self.buffer.clear();
        self.finishing_frames = 0;
    }

    fn complete_rep(&mut self, end_index: usize) -> StepOutcome {
        self.rep_count += 1;
        let raw_trajectory = std::mem::take(&mut self.buffer);

        if raw_trajectory.len() <= self.thresholds.min_rep_samples {
            tracing::warn!(
                "Rep {} discarded as noise ({} samples)",
                self.rep_count,
                raw_trajectory.len()
            );
            return StepOutcome::RepDiscarded {
                rep_number: self.rep_count,
                samples: raw_trajectory.len(),
            };
        }

        let valley_index = self.rep_start + argmin(&raw_trajectory);
        tracing::info!(
            "Rep {} completed ({} samples)",
            self.rep_count,
            raw_trajectory.len()
        );
        StepOutcome::RepCompleted {
            rep_number: self.rep_count,
            rep: Rep {
                start_index: self.rep_start,
                end_index,
                valley_index,
                raw_trajectory,
            },
        }
    }

    fn enter_top(&mut self, angle: f64) {
        self.dwell.clear();
        self.push_dwell(angle);
        self.transition(RepPhase::Top);
    }

    fn push_dwell(&mut self, angle: f64) {
        if self.dwell.len() >= self.thresholds.dwell_samples {
            self.dwell.pop_front();
        }
        if self.thresholds.dwell_samples > 0 {
            self.dwell.push_back(angle);
        }
    }

    fn transition(&mut self, next: RepPhase) {
        tracing::debug!("Rep phase {:?} -> {:?}", self.phase, next);
        self.phase = next;
    }
}
