/// Scoring output types
///
/// A `ScoreResult` is produced once per scored rep and handed to the feedback
/// boundary; nothing here is persisted.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where in the motion a deviation was found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviationCategory {
    Depth,
    Tempo,
    Smoothness,
    EarlyPhase,
    LatePhase,
}

impl fmt::Display for DeviationCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Depth => "depth",
            Self::Tempo => "tempo",
            Self::Smoothness => "smoothness",
            Self::EarlyPhase => "early_phase",
            Self::LatePhase => "late_phase",
        };
        write!(f, "{}", s)
    }
}

/// Deviation severity, ordered low < medium < high
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        };
        write!(f, "{}", s)
    }
}

/// One localized form problem in a scored rep
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deviation {
    pub category: DeviationCategory,
    pub severity: Severity,
    pub description: String,
    /// Short phrase suitable for spoken feedback
    pub feedback: String,
}

impl Deviation {
    pub fn new(category: DeviationCategory, severity: Severity, description: &str, feedback: &str) -> Self {
        Self {
            category,
            severity,
            description: description.to_string(),
            feedback: feedback.to_string(),
        }
    }
}

/// Similarity tier used in reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rating {
    Excellent,
    Good,
    Fair,
    Average,
    NeedsWork,
}

impl Rating {
    pub fn from_similarity(similarity_percent: f64) -> Self {
        if similarity_percent >= 90.0 {
            Self::Excellent
        } else if similarity_percent >= 80.0 {
            Self::Good
        } else if similarity_percent >= 70.0 {
            Self::Fair
        } else if similarity_percent >= 60.0 {
            Self::Average
        } else {
            Self::NeedsWork
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Excellent => "Excellent",
            Self::Good => "Very good",
            Self::Fair => "Fairly good",
            Self::Average => "Keep practicing",
            Self::NeedsWork => "Review your technique",
        }
    }
}

/// Praise tier of a rep without deviations, chosen from its quality score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Praise {
    Perfect,
    VeryGood,
    Good,
}

impl Praise {
    pub fn phrase(self) -> &'static str {
        match self {
            Self::Perfect => "Perfect!",
            Self::VeryGood => "Very good!",
            Self::Good => "Good!",
        }
    }
}

/// The single phrase surfaced for a scored rep
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FeedbackCue {
    /// No deviations
    Encouragement { text: String, praise: Praise },
    /// The most severe deviation's phrase
    Correction { text: String, severity: Severity, category: DeviationCategory },
}

impl FeedbackCue {
    pub fn encouragement(praise: Praise) -> Self {
        Self::Encouragement {
            text: praise.phrase().to_string(),
            praise,
        }
    }

    pub fn text(&self) -> &str {
        match self {
            Self::Encouragement { text, .. } => text,
            Self::Correction { text, .. } => text,
        }
    }
}

/// Measurements behind the deviations, kept for reports and charts
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreDetails {
    pub cosine_similarity: f64,
    pub correlation: f64,
    pub user_depth: f64,
    pub reference_depth: f64,
    pub user_tempo_ratio: f64,
    pub reference_tempo_ratio: f64,
    pub user_curvature: f64,
    pub reference_curvature: f64,
    /// Curve indices whose localized z-score exceeded the threshold
    pub deviating_indices: Vec<usize>,
}

/// Result of comparing one rep against the reference model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub similarity_percent: f64,
    pub quality_score: f64,
    pub deviations: Vec<Deviation>,
    pub feedback: FeedbackCue,
    pub rating: Rating,
    pub details: ScoreDetails,
}

impl ScoreResult {
    /// The highest-severity deviation, first one found on ties
    pub fn primary_deviation(&self) -> Option<&Deviation> {
        highest_severity(&self.deviations)
    }

    /// Multi-line text report for one rep
    pub fn report(&self, rep_number: u32) -> String {
        let mut report = format!("Rep {}: {:.0} points\n", rep_number, self.quality_score);
        if self.deviations.is_empty() {
            report.push_str("No significant issues\n");
        } else {
            report.push_str("Needs work:\n");
            for deviation in &self.deviations {
                report.push_str(&format!("  - {}\n", deviation.description));
            }
        }
        report
    }
}

pub(crate) fn highest_severity(deviations: &[Deviation]) -> Option<&Deviation> {
    deviations.iter().fold(None, |best: Option<&Deviation>, d| match best {
        Some(b) if b.severity >= d.severity => Some(b),
        _ => Some(d),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::High > Severity::Medium);
        assert!(Severity::Medium > Severity::Low);
    }

    #[test]
    fn test_highest_severity_first_wins_on_ties() {
        let deviations = vec![
            Deviation::new(DeviationCategory::Smoothness, Severity::Medium, "a", "first"),
            Deviation::new(DeviationCategory::Tempo, Severity::Medium, "b", "second"),
            Deviation::new(DeviationCategory::LatePhase, Severity::Low, "c", "third"),
        ];
        assert_eq!(highest_severity(&deviations).unwrap().feedback, "first");
        assert!(highest_severity(&[]).is_none());
    }

    #[test]
    fn test_rating_tiers() {
        assert_eq!(Rating::from_similarity(95.0), Rating::Excellent);
        assert_eq!(Rating::from_similarity(80.0), Rating::Good);
        assert_eq!(Rating::from_similarity(71.2), Rating::Fair);
        assert_eq!(Rating::from_similarity(60.0), Rating::Average);
        assert_eq!(Rating::from_similarity(12.0), Rating::NeedsWork);
    }

    #[test]
    fn test_report_lists_deviations() {
        let result = ScoreResult {
            similarity_percent: 90.0,
            quality_score: 75.0,
            deviations: vec![Deviation::new(
                DeviationCategory::Depth,
                Severity::High,
                "Insufficient depth",
                "Go deeper",
            )],
            feedback: FeedbackCue::Correction {
                text: "Go deeper".to_string(),
                severity: Severity::High,
                category: DeviationCategory::Depth,
            },
            rating: Rating::Excellent,
            details: ScoreDetails::default(),
        };
        let report = result.report(3);
        assert!(report.starts_with("Rep 3: 75 points"));
        assert!(report.contains("  - Insufficient depth"));
    }
}
