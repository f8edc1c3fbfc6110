use proptest::prelude::*;

use rep_coach::models::{DeviationCategory, Severity};
use rep_coach::services::{normalize_trajectory, FormScorer, ReferenceModelBuilder};

/// Raw angle sequence that is guaranteed not to be flat
fn rep_trajectory() -> impl Strategy<Value = Vec<f64>> {
    (prop::collection::vec(30.0f64..180.0, 2..200), 0.0f64..1.0).prop_map(|(mut raw, split)| {
        let bottom = ((raw.len() - 1) as f64 * split) as usize;
        raw[bottom] = 20.0;
        raw[0] = 185.0;
        raw
    })
}

proptest! {
    #[test]
    fn prop_normalized_curve_has_requested_length_and_unit_range(
        raw in prop::collection::vec(0.0f64..180.0, 0..300),
        n in prop::sample::select(vec![2usize, 10, 50, 200]),
    ) {
        let curve = normalize_trajectory(&raw, n);
        prop_assert_eq!(curve.len(), n);
        prop_assert!(curve.iter().all(|v| (0.0..=1.0).contains(v)));

        let max = curve.iter().copied().fold(0.0, f64::max);
        let all_zero = curve.iter().all(|v| *v == 0.0);
        prop_assert!(all_zero || max == 1.0);
    }

    #[test]
    fn prop_scores_are_bounded(
        corpus in prop::collection::vec(rep_trajectory(), 1..6),
        candidate in prop::collection::vec(0.0f64..1.0, 1..120),
    ) {
        let model = ReferenceModelBuilder::new("pushup", 50)
            .build_from_trajectories(&corpus)
            .unwrap();
        let result = FormScorer::default().analyze_normalized(&candidate, &model);

        prop_assert!((0.0..=100.0).contains(&result.similarity_percent));
        prop_assert!((0.0..=100.0).contains(&result.quality_score));
        prop_assert!(result.quality_score <= result.similarity_percent);
    }

    #[test]
    fn prop_reference_mean_scores_perfectly_against_itself(raw in rep_trajectory()) {
        let model = ReferenceModelBuilder::new("pushup", 50)
            .build_from_trajectories(&[raw])
            .unwrap();
        let result = FormScorer::default().analyze_normalized(&model.mean_curve, &model);

        prop_assert!(result.similarity_percent >= 99.9);
        prop_assert!(result.deviations.is_empty());
        prop_assert_eq!(result.feedback.text(), "Perfect!");
    }

    #[test]
    fn prop_half_depth_rep_is_flagged(raw in rep_trajectory()) {
        let model = ReferenceModelBuilder::new("pushup", 50)
            .build_from_trajectories(&[raw])
            .unwrap();
        let shallow: Vec<f64> = model.mean_curve.iter().map(|v| 0.5 + 0.5 * v).collect();
        let result = FormScorer::default().analyze_normalized(&shallow, &model);

        let depth = result
            .deviations
            .iter()
            .find(|d| d.category == DeviationCategory::Depth);
        prop_assert!(depth.is_some());
        prop_assert_eq!(depth.map(|d| d.severity), Some(Severity::High));
        prop_assert_eq!(result.feedback.text(), "Go deeper");
    }

    #[test]
    fn prop_reference_ignores_corpus_order(corpus in prop::collection::vec(rep_trajectory(), 1..8)) {
        let builder = ReferenceModelBuilder::new("squat", 50);
        let forward = builder.build_from_trajectories(&corpus).unwrap();
        let mut reversed_corpus = corpus.clone();
        reversed_corpus.reverse();
        let reversed = builder.build_from_trajectories(&reversed_corpus).unwrap();

        prop_assert_eq!(forward.sample_count, reversed.sample_count);
        for (a, b) in forward.mean_curve.iter().zip(&reversed.mean_curve) {
            prop_assert!((a - b).abs() < 1e-9);
        }
        for (a, b) in forward.std_curve.iter().zip(&reversed.std_curve) {
            prop_assert!((a - b).abs() < 1e-9);
        }
    }
}
