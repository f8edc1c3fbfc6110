/// Spoken Feedback Scheduling
///
/// Turns session events into short utterances, gates each category by its
/// cooldown and hands them to a speech sink in priority order. Audio
/// rendering lives behind `SpeechSink`; this module only decides what gets
/// said and when.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::FeedbackConfig;
use crate::error::Result;
use crate::models::{FeedbackCue, Praise, SessionEvent, Severity};

/// Cooldown bucket of an utterance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackCategory {
    RepCount,
    FormFeedback,
    ErrorWarning,
    Milestone,
    Encouragement,
}

/// Speaking priority; `High` is spoken first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    Normal,
    Low,
}

impl Priority {
    fn rank(self) -> u8 {
        match self {
            Self::High => 2,
            Self::Normal => 1,
            Self::Low => 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Utterance {
    pub text: String,
    pub category: FeedbackCategory,
    pub priority: Priority,
}

impl Utterance {
    pub fn new(text: impl Into<String>, category: FeedbackCategory, priority: Priority) -> Self {
        Self {
            text: text.into(),
            category,
            priority,
        }
    }
}

#[derive(Debug)]
struct Queued {
    sequence: u64,
    utterance: Utterance,
}

// Max-heap: higher priority first, then earlier arrival
impl Ord for Queued {
    fn cmp(&self, other: &Self) -> Ordering {
        self.utterance
            .priority
            .rank()
            .cmp(&other.utterance.priority.rank())
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

impl PartialOrd for Queued {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Queued {
    fn eq(&self, other: &Self) -> bool {
        self.sequence == other.sequence
    }
}

impl Eq for Queued {}

/// Cooldown gate plus priority queue, owned by one session's feedback worker
#[derive(Debug)]
pub struct FeedbackScheduler {
    cooldowns: HashMap<FeedbackCategory, Duration>,
    last_spoken: HashMap<FeedbackCategory, Instant>,
    pending: BinaryHeap<Queued>,
    sequence: u64,
}

impl FeedbackScheduler {
    pub fn new(config: &FeedbackConfig) -> Self {
        let secs = |s: f64| Duration::from_secs_f64(s.max(0.0));
        let cooldowns = HashMap::from([
            (FeedbackCategory::RepCount, secs(config.rep_count_secs)),
            (FeedbackCategory::FormFeedback, secs(config.form_feedback_secs)),
            (FeedbackCategory::ErrorWarning, secs(config.error_warning_secs)),
            (FeedbackCategory::Milestone, secs(config.milestone_secs)),
            (FeedbackCategory::Encouragement, secs(config.encouragement_secs)),
        ]);

        Self {
            cooldowns,
            last_spoken: HashMap::new(),
            pending: BinaryHeap::new(),
            sequence: 0,
        }
    }

    pub fn cooldown(&self, category: FeedbackCategory) -> Duration {
        self.cooldowns.get(&category).copied().unwrap_or_default()
    }

    /// Queue an utterance unless its category is still cooling down at `now`
    pub fn offer(&mut self, utterance: Utterance, now: Instant) -> bool {
        let cooldown = self.cooldown(utterance.category);
        if let Some(last) = self.last_spoken.get(&utterance.category) {
            if now.saturating_duration_since(*last) < cooldown {
                tracing::debug!(
                    "Dropped '{}': {:?} cooling down",
                    utterance.text,
                    utterance.category
                );
                return false;
            }
        }

        self.last_spoken.insert(utterance.category, now);
        self.sequence += 1;
        self.pending.push(Queued {
            sequence: self.sequence,
            utterance,
        });
        true
    }

    /// Next utterance to speak
    pub fn next(&mut self) -> Option<Utterance> {
        self.pending.pop().map(|q| q.utterance)
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Offer the utterances an event calls for; returns how many were queued
    pub fn schedule_event(&mut self, event: &SessionEvent, now: Instant) -> usize {
        utterances_for(event)
            .into_iter()
            .filter(|u| self.offer(u.clone(), now))
            .count()
    }
}

/// Utterances a session event calls for, before cooldown gating
pub fn utterances_for(event: &SessionEvent) -> Vec<Utterance> {
    match event {
        SessionEvent::Started { .. } => Vec::new(),
        SessionEvent::RepScored {
            rep_number,
            target_reps,
            result,
            ..
        } => {
            let mut utterances = vec![Utterance::new(
                rep_number.to_string(),
                FeedbackCategory::RepCount,
                Priority::Low,
            )];

            match &result.feedback {
                FeedbackCue::Correction { text, severity, .. } => {
                    let priority = if *severity == Severity::High {
                        Priority::High
                    } else {
                        Priority::Normal
                    };
                    utterances.push(Utterance::new(
                        text.clone(),
                        FeedbackCategory::ErrorWarning,
                        priority,
                    ));
                }
                FeedbackCue::Encouragement { text, praise } => {
                    let priority = match praise {
                        Praise::Perfect => Some(Priority::Normal),
                        Praise::VeryGood => Some(Priority::Low),
                        Praise::Good => None,
                    };
                    if let Some(priority) = priority {
                        utterances.push(Utterance::new(
                            text.clone(),
                            FeedbackCategory::FormFeedback,
                            priority,
                        ));
                    }
                }
            }

            if let Some(milestone) = milestone(*rep_number, *target_reps) {
                utterances.push(milestone);
            }
            utterances
        }
        SessionEvent::SessionComplete { .. } => vec![Utterance::new(
            "Set complete! Great work!",
            FeedbackCategory::Milestone,
            Priority::High,
        )],
    }
}

/// Progress phrase for reaching `current` of `target` reps.
///
/// Reaching the target itself is announced by the session-complete event.
pub fn milestone(current: u32, target: u32) -> Option<Utterance> {
    if target == 0 || current >= target {
        return None;
    }
    let remaining = target - current;
    let text = if remaining == 5 {
        "5 reps to go!"
    } else if remaining == 1 {
        "Last rep!"
    } else if current == target / 2 {
        "Halfway there!"
    } else {
        return None;
    };
    Some(Utterance::new(text, FeedbackCategory::Milestone, Priority::Normal))
}

/// Where utterances end up: a speech engine, a log, a test buffer
pub trait SpeechSink: Send + 'static {
    fn speak(&mut self, utterance: &Utterance) -> Result<()>;
}

/// Sink that logs each utterance instead of playing audio
#[derive(Debug, Default, Clone)]
pub struct LoggingSpeechSink;

impl SpeechSink for LoggingSpeechSink {
    fn speak(&mut self, utterance: &Utterance) -> Result<()> {
        tracing::info!(
            category = ?utterance.category,
            priority = ?utterance.priority,
            "Speaking: {}",
            utterance.text
        );
        Ok(())
    }
}

impl SpeechSink for Vec<Utterance> {
    fn speak(&mut self, utterance: &Utterance) -> Result<()> {
        self.push(utterance.clone());
        Ok(())
    }
}

/// Spawn the worker that drains session events into `sink`.
///
/// Runs until the event channel closes or `cancel` fires, then hands the
/// sink back. Sending an event never waits on speech.
pub fn spawn_feedback_worker<S: SpeechSink>(
    mut scheduler: FeedbackScheduler,
    mut events: mpsc::UnboundedReceiver<SessionEvent>,
    mut sink: S,
    cancel: CancellationToken,
) -> JoinHandle<S> {
    tokio::spawn(async move {
        loop {
            let event = tokio::select! {
                _ = cancel.cancelled() => break,
                event = events.recv() => match event {
                    Some(event) => event,
                    None => break,
                },
            };

            scheduler.schedule_event(&event, Instant::now());
            while let Some(utterance) = scheduler.next() {
                if let Err(e) = sink.speak(&utterance) {
                    tracing::warn!("Failed to speak '{}': {}", utterance.text, e);
                }
            }
        }

        tracing::debug!("Feedback worker stopped");
        sink
    })
}
