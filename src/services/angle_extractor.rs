/// Joint Angle Extraction Service
///
/// Converts a landmark set into one scalar joint angle per frame:
/// - Angle at the vertex of each configured triplet, in pixel space
/// - Mean over the triplets (left/right limb)
/// - Bilateral symmetry when exactly two triplets are configured

use crate::error::{CoachError, Result};
use crate::models::{AngleSample, JointTriplet, LandmarkSet};

/// Guards the cosine denominator against zero-length limb vectors
pub const ANGLE_EPSILON: f64 = 1e-6;

/// Calculate the angle at `vertex` formed by `proximal` and `distal`, in degrees
pub fn joint_angle(proximal: (f64, f64), vertex: (f64, f64), distal: (f64, f64)) -> f64 {
    // Vectors from joint to adjacent points
    let v1 = (proximal.0 - vertex.0, proximal.1 - vertex.1);
    let v2 = (distal.0 - vertex.0, distal.1 - vertex.1);

    let dot = v1.0 * v2.0 + v1.1 * v2.1;
    let mag1 = (v1.0 * v1.0 + v1.1 * v1.1).sqrt();
    let mag2 = (v2.0 * v2.0 + v2.1 * v2.1).sqrt();

    let cos_angle = dot / (mag1 * mag2 + ANGLE_EPSILON);
    cos_angle.clamp(-1.0, 1.0).acos().to_degrees()
}

/// Symmetry between two limb angles, 100 meaning identical
pub fn symmetry(left: f64, right: f64) -> f64 {
    (100.0 - (left - right).abs()).max(0.0)
}

/// Extracts the representative joint angle for one exercise
#[derive(Debug, Clone)]
pub struct AngleExtractor {
    triplets: Vec<JointTriplet>,
}

impl AngleExtractor {
    pub fn new(triplets: Vec<JointTriplet>) -> Self {
        Self { triplets }
    }

    pub fn triplets(&self) -> &[JointTriplet] {
        &self.triplets
    }

    /// Check that a landmark set carries every index this extractor reads
    pub fn can_extract(&self, landmarks: &LandmarkSet) -> bool {
        !self.triplets.is_empty() && landmarks.has_triplets(&self.triplets)
    }

    /// Compute the frame's angle sample.
    ///
    /// Coordinates are scaled by `width`/`height` before the angle is taken, so
    /// normalized landmarks on a non-square frame give true image angles.
    /// Returns `MissingDetection` when required landmarks are absent or any
    /// coordinate they carry is not finite.
    pub fn extract(&self, landmarks: &LandmarkSet, width: f64, height: f64) -> Result<AngleSample> {
        if !self.can_extract(landmarks) {
            return Err(CoachError::MissingDetection);
        }

        let point = |idx: usize| {
            let (x, y) = landmarks.landmarks[idx].to_pixels(width, height);
            if x.is_finite() && y.is_finite() {
                Ok((x, y))
            } else {
                Err(CoachError::MissingDetection)
            }
        };

        let angles = self
            .triplets
            .iter()
            .map(|t| {
                let angle = joint_angle(point(t.proximal)?, point(t.vertex)?, point(t.distal)?);
                if angle.is_finite() {
                    Ok(angle)
                } else {
                    Err(CoachError::MissingDetection)
                }
            })
            .collect::<Result<Vec<f64>>>()?;

        let angle = angles.iter().sum::<f64>() / angles.len() as f64;
        let symmetry = match angles.as_slice() {
            [left, right] => Some(symmetry(*left, *right)),
            _ => None,
        };

        Ok(AngleSample { angle, symmetry })
    }

    /// Angle sequence for a whole recording; frames without the required
    /// landmarks are skipped, matching how recordings only keep detected frames
    pub fn extract_sequence<'a, I>(&self, frames: I, width: f64, height: f64) -> Vec<f64>
    where
        I: IntoIterator<Item = &'a LandmarkSet>,
    {
        let mut skipped = 0usize;
        let angles: Vec<f64> = frames
            .into_iter()
            .filter_map(|frame| match self.extract(frame, width, height) {
                Ok(sample) => Some(sample.angle),
                Err(_) => {
                    skipped += 1;
                    None
                }
            })
            .collect();

        if skipped > 0 {
            tracing::debug!("Skipped {} frames without required landmarks", skipped);
        }
        angles
    }
}
