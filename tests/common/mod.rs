#![allow(dead_code)]

use rep_coach::models::{Landmark, LandmarkSet, RecordedFrame, Recording};

/// Landmark set with both elbows bent to `deg`
pub fn pushup_landmarks(deg: f64) -> LandmarkSet {
    let mut landmarks = vec![Landmark::new(0.0, 0.0); 33];
    let rad = deg.to_radians();
    for (shoulder, elbow, wrist, x0) in [(11, 13, 15, 0.3f64), (12, 14, 16, 0.6)] {
        landmarks[shoulder] = Landmark::new(x0 as f32, 0.2);
        landmarks[elbow] = Landmark::new(x0 as f32, 0.5);
        landmarks[wrist] = Landmark::new(
            (x0 + 0.3 * rad.sin()) as f32,
            (0.5 - 0.3 * rad.cos()) as f32,
        );
    }
    LandmarkSet::new(landmarks)
}

/// Elbow angle swinging between 80° and 170° with a 40-frame period
pub fn cosine_angle(i: usize) -> f64 {
    125.0 - 45.0 * (2.0 * std::f64::consts::PI * i as f64 / 40.0).cos()
}

/// Expert recording with `cycles` full periods and a few dropped detections
pub fn expert_recording(name: &str, cycles: usize) -> Recording {
    let frames = (0..=cycles * 40)
        .map(|i| RecordedFrame {
            frame: i as u64 + 1,
            landmarks: if i % 17 == 5 {
                None
            } else {
                Some(pushup_landmarks(cosine_angle(i)))
            },
        })
        .collect();
    Recording::new(name, frames)
}

/// Live angle stream: a short hold at the top, then `reps` linear
/// 170° -> 80° -> 170° reps, each followed by a 10-frame hold
pub fn live_angles(reps: usize, noise_deg: f64) -> Vec<f64> {
    let mut angles = vec![170.0; 5];
    for _ in 0..reps {
        angles.extend((1..=30).map(|i| 170.0 - 3.0 * i as f64));
        angles.extend((1..=30).map(|i| 80.0 + 3.0 * i as f64));
        angles.extend(std::iter::repeat(170.0).take(10));
    }
    angles
        .into_iter()
        .enumerate()
        .map(|(i, a)| a + noise_deg * (i as f64 * 1.7).sin())
        .collect()
}
