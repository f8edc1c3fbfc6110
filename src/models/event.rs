use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::score::ScoreResult;

/// Payload emitted by a live session to the feedback boundary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    Started {
        session_id: Uuid,
        exercise_id: String,
        target_reps: u32,
        at: DateTime<Utc>,
    },
    RepScored {
        session_id: Uuid,
        rep_number: u32,
        target_reps: u32,
        result: ScoreResult,
        at: DateTime<Utc>,
    },
    SessionComplete {
        session_id: Uuid,
        total_reps: u32,
        at: DateTime<Utc>,
    },
}

impl SessionEvent {
    pub fn session_id(&self) -> Uuid {
        match self {
            Self::Started { session_id, .. } => *session_id,
            Self::RepScored { session_id, .. } => *session_id,
            Self::SessionComplete { session_id, .. } => *session_id,
        }
    }
}

/// End-of-session statistics returned by the session driver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: Uuid,
    pub exercise_id: String,
    pub target_reps: u32,
    /// Reps counted by the state machine, including ones too short to score
    pub reps_counted: u32,
    pub reps_scored: u32,
    pub mean_quality: Option<f64>,
    pub completed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_is_tagged_json() {
        let event = SessionEvent::SessionComplete {
            session_id: Uuid::nil(),
            total_reps: 10,
            at: Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "session_complete");
        assert_eq!(json["total_reps"], 10);
        assert_eq!(event.session_id(), Uuid::nil());
    }
}
