/// Form Scoring and Deviation Analysis
///
/// Compares one candidate rep against a reference model:
/// - Similarity from cosine similarity and Pearson correlation
/// - Depth, tempo and smoothness checks against the reference curve
/// - Localized z-score deviations bucketed into early/late phase
/// - Severity-weighted penalties and a single feedback phrase

use crate::config::ScoringConfig;
use crate::models::{
    argmin, highest_severity, Deviation, DeviationCategory, FeedbackCue, Praise, Rating,
    ReferenceModel, ScoreDetails, ScoreResult, Severity,
};
use crate::services::trajectory_normalizer::{normalize_trajectory, resample};

/// Scores reps with the configured thresholds and penalties.
///
/// Holds no per-rep state, so one scorer can serve any number of sessions.
#[derive(Debug, Clone, Default)]
pub struct FormScorer {
    config: ScoringConfig,
}

impl FormScorer {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Score a raw rep trajectory.
    ///
    /// The candidate is normalized to the model's length. Fewer than two
    /// samples normalize to zeros, which scores as a maximal depth deviation.
    pub fn score_rep(&self, raw_trajectory: &[f64], model: &ReferenceModel) -> ScoreResult {
        let candidate = normalize_trajectory(raw_trajectory, model.len());
        self.analyze_normalized(&candidate, model)
    }

    /// Score an already normalized curve against the model
    pub fn analyze_normalized(&self, candidate: &[f64], model: &ReferenceModel) -> ScoreResult {
        let cfg = &self.config;
        let reference = model.mean_curve.as_slice();
        let spread = model.std_curve.as_slice();

        let resampled;
        let user = if candidate.len() == reference.len() {
            candidate
        } else {
            resampled = resample(candidate, reference.len());
            resampled.as_slice()
        };

        let cosine = cosine_similarity(user, reference);
        let correlation = pearson_correlation(user, reference);
        let similarity_percent =
            round1(100.0 * (0.5 * cosine + 0.5 * correlation.max(0.0))).clamp(0.0, 100.0);

        let mut deviations = Vec::new();

        // Depth
        let user_depth = depth(user);
        let reference_depth = depth(reference);
        if user_depth < reference_depth * cfg.depth_high_ratio {
            deviations.push(Deviation::new(
                DeviationCategory::Depth,
                Severity::High,
                "Insufficient depth",
                "Go deeper",
            ));
        } else if user_depth < reference_depth * cfg.depth_low_ratio {
            deviations.push(Deviation::new(
                DeviationCategory::Depth,
                Severity::Low,
                "Could go slightly deeper",
                "Push a little deeper",
            ));
        }

        // Tempo: descending over ascending phase length, valley shared by both
        let user_tempo_ratio = phase_ratio(user);
        let reference_tempo_ratio = phase_ratio(reference);
        if user_tempo_ratio < reference_tempo_ratio * cfg.tempo_fast_descent_ratio {
            deviations.push(Deviation::new(
                DeviationCategory::Tempo,
                Severity::High,
                "Descending too fast",
                "Slow down on the way down",
            ));
        } else if user_tempo_ratio > reference_tempo_ratio * cfg.tempo_fast_ascent_ratio {
            deviations.push(Deviation::new(
                DeviationCategory::Tempo,
                Severity::Medium,
                "Ascending too fast",
                "Control the way up",
            ));
        }

        // Smoothness
        let user_curvature = mean_abs_second_difference(user);
        let reference_curvature = mean_abs_second_difference(reference);
        if user_curvature > reference_curvature * cfg.smoothness_ratio {
            deviations.push(Deviation::new(
                DeviationCategory::Smoothness,
                Severity::Medium,
                "Jerky movement",
                "Move more smoothly",
            ));
        }

        // Localized z-score; mid-curve deviations are not reported
        let deviating_indices: Vec<usize> = user
            .iter()
            .zip(reference)
            .zip(spread)
            .enumerate()
            .filter(|(_, ((u, c), s))| (*u - *c).abs() / (*s + cfg.z_std_floor) > cfg.z_threshold)
            .map(|(i, _)| i)
            .collect();
        if !deviating_indices.is_empty() {
            let mean_index =
                deviating_indices.iter().sum::<usize>() as f64 / deviating_indices.len() as f64;
            let position = mean_index / reference.len() as f64;
            if position < cfg.early_phase_limit {
                deviations.push(Deviation::new(
                    DeviationCategory::EarlyPhase,
                    Severity::Low,
                    "Starting phase off technique",
                    "Watch the start of the rep",
                ));
            } else if position > cfg.late_phase_limit {
                deviations.push(Deviation::new(
                    DeviationCategory::LatePhase,
                    Severity::Low,
                    "Finishing phase off technique",
                    "Finish the rep with control",
                ));
            }
        }

        let penalty: f64 = deviations.iter().map(|d| self.penalty(d.severity)).sum();
        let quality_score = (similarity_percent - penalty).clamp(0.0, 100.0);
        let feedback = self.select_feedback(&deviations, quality_score);

        tracing::debug!(
            "Scored rep: similarity {:.1}, quality {:.1}, {} deviations",
            similarity_percent,
            quality_score,
            deviations.len()
        );

        ScoreResult {
            similarity_percent,
            quality_score,
            deviations,
            feedback,
            rating: Rating::from_similarity(similarity_percent),
            details: ScoreDetails {
                cosine_similarity: cosine,
                correlation,
                user_depth,
                reference_depth,
                user_tempo_ratio,
                reference_tempo_ratio,
                user_curvature,
                reference_curvature,
                deviating_indices,
            },
        }
    }

    fn penalty(&self, severity: Severity) -> f64 {
        match severity {
            Severity::High => self.config.high_penalty,
            Severity::Medium => self.config.medium_penalty,
            Severity::Low => self.config.low_penalty,
        }
    }

    fn select_feedback(&self, deviations: &[Deviation], quality_score: f64) -> FeedbackCue {
        match highest_severity(deviations) {
            Some(primary) => FeedbackCue::Correction {
                text: primary.feedback.clone(),
                severity: primary.severity,
                category: primary.category,
            },
            None => {
                let praise = if quality_score >= self.config.perfect_score {
                    Praise::Perfect
                } else if quality_score >= self.config.very_good_score {
                    Praise::VeryGood
                } else {
                    Praise::Good
                };
                FeedbackCue::encouragement(praise)
            }
        }
    }
}

/// Cosine similarity; zero when either vector has zero norm
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// Pearson correlation; zero when undefined (constant input or too short)
pub fn pearson_correlation(a: &[f64], b: &[f64]) -> f64 {
    let n = a.len().min(b.len());
    if n < 2 {
        return 0.0;
    }
    let mean_a = a[..n].iter().sum::<f64>() / n as f64;
    let mean_b = b[..n].iter().sum::<f64>() / n as f64;

    let (mut cov, mut var_a, mut var_b) = (0.0, 0.0, 0.0);
    for (x, y) in a[..n].iter().zip(&b[..n]) {
        let (dx, dy) = (x - mean_a, y - mean_b);
        cov += dx * dy;
        var_a += dx * dx;
        var_b += dy * dy;
    }
    if var_a == 0.0 || var_b == 0.0 {
        return 0.0;
    }
    let r = cov / (var_a.sqrt() * var_b.sqrt());
    if r.is_finite() {
        r.clamp(-1.0, 1.0)
    } else {
        0.0
    }
}

/// Mean absolute second difference, a discrete curvature proxy for jerk
pub fn mean_abs_second_difference(values: &[f64]) -> f64 {
    if values.len() < 3 {
        return 0.0;
    }
    let total: f64 = values
        .windows(3)
        .map(|w| (w[2] - 2.0 * w[1] + w[0]).abs())
        .sum();
    total / (values.len() - 2) as f64
}

/// Descending phase length over ascending phase length, split at the minimum
fn phase_ratio(curve: &[f64]) -> f64 {
    let valley = argmin(curve);
    let descending = valley + 1;
    let ascending = curve.len().saturating_sub(valley);
    descending as f64 / ascending.max(1) as f64
}

/// `1 - min` of a normalized curve; a flat curve has no depth at all
fn depth(curve: &[f64]) -> f64 {
    let min = curve.iter().copied().fold(f64::INFINITY, f64::min);
    let max = curve.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if max > min {
        1.0 - min
    } else {
        0.0
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::reference_model_builder::ReferenceModelBuilder;
    use chrono::Utc;
    use pretty_assertions::assert_eq;

    /// A smooth rep: 170 down to `bottom` and back, valley at `valley_at` of `len`
    fn rep_curve(len: usize, valley_at: usize, bottom: f64) -> Vec<f64> {
        (0..len)
            .map(|i| {
                let t = if i <= valley_at {
                    i as f64 / valley_at as f64
                } else {
                    1.0 - (i - valley_at) as f64 / (len - 1 - valley_at) as f64
                };
                let shape = (t * std::f64::consts::FRAC_PI_2).sin();
                170.0 - (170.0 - bottom) * shape
            })
            .collect()
    }

    fn model_from(raw: &[f64], std: f64) -> ReferenceModel {
        let mut model = ReferenceModelBuilder::new("pushup", 50)
            .build_from_trajectories(&[raw.to_vec()])
            .unwrap();
        model.std_curve = vec![std; model.len()];
        model
    }

    #[test]
    fn test_self_similarity() {
        let raw = rep_curve(60, 30, 85.0);
        let model = ReferenceModelBuilder::new("pushup", 50)
            .build_from_trajectories(&[raw.clone()])
            .unwrap();
        let result = FormScorer::default().score_rep(&raw, &model);
        assert_eq!(result.similarity_percent, 100.0);
        assert!(result.deviations.is_empty());
        assert_eq!(result.quality_score, 100.0);
        assert_eq!(result.rating, Rating::Excellent);
        assert_eq!(result.feedback.text(), "Perfect!");
    }

    #[test]
    fn test_shallow_candidate_triggers_high_depth() {
        let reference: Vec<f64> = vec![1.0, 0.5, 0.0, 0.5, 1.0];
        let model = ReferenceModel {
            exercise_id: "squat".to_string(),
            mean_curve: reference,
            std_curve: vec![0.1; 5],
            sample_count: 3,
            bottom_angle: None,
            trained_at: Utc::now(),
        };
        let candidate = vec![1.0, 0.75, 0.5, 0.75, 1.0];
        let result = FormScorer::default().analyze_normalized(&candidate, &model);
        let depth = result
            .deviations
            .iter()
            .find(|d| d.category == DeviationCategory::Depth)
            .unwrap();
        assert_eq!(depth.severity, Severity::High);
        assert_eq!(result.feedback.text(), "Go deeper");
        assert!((result.details.user_depth - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_slightly_shallow_is_low_severity() {
        let model = ReferenceModel {
            exercise_id: "squat".to_string(),
            mean_curve: vec![1.0, 0.5, 0.0, 0.5, 1.0],
            std_curve: vec![1.0; 5],
            sample_count: 3,
            bottom_angle: None,
            trained_at: Utc::now(),
        };
        let candidate = vec![1.0, 0.55, 0.15, 0.55, 1.0];
        let result = FormScorer::default().analyze_normalized(&candidate, &model);
        assert_eq!(result.deviations.len(), 1);
        assert_eq!(result.deviations[0].category, DeviationCategory::Depth);
        assert_eq!(result.deviations[0].severity, Severity::Low);
        assert!((result.quality_score - (result.similarity_percent - 3.0)).abs() < 1e-9);
    }

    #[test]
    fn test_fast_descent() {
        let model = model_from(&rep_curve(60, 30, 85.0), 1.0);
        // Valley at sample 6 of 60: the descent takes a tenth of the rep
        let result = FormScorer::default().score_rep(&rep_curve(60, 6, 85.0), &model);
        let tempo = result
            .deviations
            .iter()
            .find(|d| d.category == DeviationCategory::Tempo)
            .unwrap();
        assert_eq!(tempo.severity, Severity::High);
        assert_eq!(tempo.description, "Descending too fast");
    }

    #[test]
    fn test_fast_ascent() {
        let model = model_from(&rep_curve(60, 30, 85.0), 1.0);
        let result = FormScorer::default().score_rep(&rep_curve(60, 50, 85.0), &model);
        let tempo = result
            .deviations
            .iter()
            .find(|d| d.category == DeviationCategory::Tempo)
            .unwrap();
        assert_eq!(tempo.severity, Severity::Medium);
        assert_eq!(tempo.feedback, "Control the way up");
    }

    #[test]
    fn test_jerky_movement() {
        let smooth = rep_curve(60, 30, 85.0);
        let model = model_from(&smooth, 1.0);
        let jerky: Vec<f64> = smooth
            .iter()
            .enumerate()
            .map(|(i, a)| if i % 2 == 0 { a + 6.0 } else { a - 6.0 })
            .collect();
        let result = FormScorer::default().score_rep(&jerky, &model);
        assert!(result
            .deviations
            .iter()
            .any(|d| d.category == DeviationCategory::Smoothness && d.severity == Severity::Medium));
    }

    #[test]
    fn test_localized_deviation_buckets() {
        let reference = vec![0.5; 10];
        let model = ReferenceModel {
            exercise_id: "pushup".to_string(),
            mean_curve: reference.clone(),
            std_curve: vec![0.0; 10],
            sample_count: 1,
            bottom_angle: None,
            trained_at: Utc::now(),
        };
        let scorer = FormScorer::default();

        let mut early = reference.clone();
        early[0] = 0.6;
        early[1] = 0.6;
        let result = scorer.analyze_normalized(&early, &model);
        assert_eq!(result.details.deviating_indices, vec![0, 1]);
        assert!(result.deviations.iter().any(|d| d.category == DeviationCategory::EarlyPhase));

        let mut late = reference.clone();
        late[9] = 0.6;
        let result = scorer.analyze_normalized(&late, &model);
        assert!(result.deviations.iter().any(|d| d.category == DeviationCategory::LatePhase));

        let mut middle = reference;
        middle[5] = 0.6;
        let result = scorer.analyze_normalized(&middle, &model);
        assert_eq!(result.details.deviating_indices, vec![5]);
        assert!(!result
            .deviations
            .iter()
            .any(|d| matches!(d.category, DeviationCategory::EarlyPhase | DeviationCategory::LatePhase)));
    }

    #[test]
    fn test_severity_weighted_penalties() {
        let model = ReferenceModel {
            exercise_id: "squat".to_string(),
            mean_curve: vec![1.0, 0.5, 0.0, 0.5, 1.0],
            std_curve: vec![1.0; 5],
            sample_count: 3,
            bottom_angle: None,
            trained_at: Utc::now(),
        };
        let result = FormScorer::default().analyze_normalized(&[1.0, 0.8, 0.6, 0.8, 1.0], &model);
        let penalty: f64 = result
            .deviations
            .iter()
            .map(|d| match d.severity {
                Severity::High => 15.0,
                Severity::Medium => 8.0,
                Severity::Low => 3.0,
            })
            .sum();
        let expected = (result.similarity_percent - penalty).clamp(0.0, 100.0);
        assert!((result.quality_score - expected).abs() < 1e-9);
    }

    #[test]
    fn test_degenerate_candidate_is_defined() {
        let model = model_from(&rep_curve(60, 30, 85.0), 0.1);
        let result = FormScorer::default().score_rep(&[120.0], &model);
        assert!(result.quality_score >= 0.0 && result.quality_score <= 100.0);
        assert_eq!(result.similarity_percent, 0.0);
        assert!(result
            .deviations
            .iter()
            .any(|d| d.category == DeviationCategory::Depth && d.severity == Severity::High));
    }

    #[test]
    fn test_encouragement_tiers() {
        let scorer = FormScorer::default();
        assert_eq!(scorer.select_feedback(&[], 95.0).text(), "Perfect!");
        assert_eq!(scorer.select_feedback(&[], 85.0).text(), "Very good!");
        assert_eq!(scorer.select_feedback(&[], 40.0).text(), "Good!");
    }

    #[test]
    fn test_praise_tier_follows_configured_cutoffs() {
        let scorer = FormScorer::new(ScoringConfig {
            perfect_score: 70.0,
            very_good_score: 50.0,
            ..ScoringConfig::default()
        });
        assert_eq!(scorer.select_feedback(&[], 75.0), FeedbackCue::encouragement(Praise::Perfect));
        assert_eq!(scorer.select_feedback(&[], 55.0), FeedbackCue::encouragement(Praise::VeryGood));
        assert_eq!(scorer.select_feedback(&[], 45.0), FeedbackCue::encouragement(Praise::Good));
    }

    #[test]
    fn test_similarity_helpers() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
        assert_eq!(pearson_correlation(&[1.0, 1.0, 1.0], &[0.0, 1.0, 2.0]), 0.0);
        assert!((pearson_correlation(&[0.0, 1.0, 2.0], &[2.0, 1.0, 0.0]) + 1.0).abs() < 1e-12);
        assert_eq!(mean_abs_second_difference(&[0.0, 1.0]), 0.0);
        assert!((mean_abs_second_difference(&[0.0, 1.0, 0.0, 1.0]) - 2.0).abs() < 1e-12);
    }
}
