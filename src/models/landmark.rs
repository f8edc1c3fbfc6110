/// Landmark data structures
///
/// A landmark set is what the external pose estimator hands us for one frame.
/// The core only reads it; angles are derived in `services::angle_extractor`.

use serde::{Deserialize, Serialize};

/// Single body keypoint in image-plane coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    /// X coordinate (normalized 0-1 or pixel coordinates)
    pub x: f32,
    /// Y coordinate (normalized 0-1 or pixel coordinates)
    pub y: f32,
    /// Visibility / presence confidence (0-1), when the estimator reports one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<f32>,
}

impl Landmark {
    /// Create a landmark without a visibility signal
    pub fn new(x: f32, y: f32) -> Self {
        Self {
            x,
            y,
            visibility: None,
        }
    }

    /// Create a landmark with a visibility signal
    pub fn with_visibility(x: f32, y: f32, visibility: f32) -> Self {
        Self {
            x,
            y,
            visibility: Some(visibility),
        }
    }

    /// Coordinates scaled to pixel space
    pub fn to_pixels(&self, width: f64, height: f64) -> (f64, f64) {
        (self.x as f64 * width, self.y as f64 * height)
    }
}

/// All landmarks detected for one frame, indexed by estimator landmark id
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LandmarkSet {
    pub landmarks: Vec<Landmark>,
}

impl LandmarkSet {
    pub fn new(landmarks: Vec<Landmark>) -> Self {
        Self { landmarks }
    }

    /// Get landmark by estimator index
    pub fn get(&self, index: usize) -> Option<&Landmark> {
        self.landmarks.get(index)
    }

    pub fn len(&self) -> usize {
        self.landmarks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.landmarks.is_empty()
    }

    /// Check that every index needed by the given triplets is present
    pub fn has_triplets(&self, triplets: &[JointTriplet]) -> bool {
        triplets
            .iter()
            .all(|t| t.indices().iter().all(|&idx| idx < self.landmarks.len()))
    }
}

/// Three landmarks forming an angle at the vertex
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "[usize; 3]", into = "[usize; 3]")]
pub struct JointTriplet {
    pub proximal: usize,
    pub vertex: usize,
    pub distal: usize,
}

impl JointTriplet {
    pub const fn new(proximal: usize, vertex: usize, distal: usize) -> Self {
        Self {
            proximal,
            vertex,
            distal,
        }
    }

    pub fn from_landmarks(proximal: PoseLandmark, vertex: PoseLandmark, distal: PoseLandmark) -> Self {
        Self::new(proximal as usize, vertex as usize, distal as usize)
    }

    pub fn indices(&self) -> [usize; 3] {
        [self.proximal, self.vertex, self.distal]
    }
}

impl From<[usize; 3]> for JointTriplet {
    fn from(idx: [usize; 3]) -> Self {
        Self::new(idx[0], idx[1], idx[2])
    }
}

impl From<JointTriplet> for [usize; 3] {
    fn from(t: JointTriplet) -> Self {
        t.indices()
    }
}

/// MediaPipe-style 33 landmark indices
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoseLandmark {
    Nose = 0,
    LeftEyeInner = 1,
    LeftEye = 2,
    LeftEyeOuter = 3,
    RightEyeInner = 4,
    RightEye = 5,
    RightEyeOuter = 6,
    LeftEar = 7,
    RightEar = 8,
    MouthLeft = 9,
    MouthRight = 10,
    LeftShoulder = 11,
    RightShoulder = 12,
    LeftElbow = 13,
    RightElbow = 14,
    LeftWrist = 15,
    RightWrist = 16,
    LeftPinky = 17,
    RightPinky = 18,
    LeftIndex = 19,
    RightIndex = 20,
    LeftThumb = 21,
    RightThumb = 22,
    LeftHip = 23,
    RightHip = 24,
    LeftKnee = 25,
    RightKnee = 26,
    LeftAnkle = 27,
    RightAnkle = 28,
    LeftHeel = 29,
    RightHeel = 30,
    LeftFootIndex = 31,
    RightFootIndex = 32,
}

impl PoseLandmark {
    /// Number of landmarks the estimator reports per frame
    pub const COUNT: usize = 33;

    /// Get landmark name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Nose => "nose",
            Self::LeftEyeInner => "left_eye_inner",
            Self::LeftEye => "left_eye",
            Self::LeftEyeOuter => "left_eye_outer",
            Self::RightEyeInner => "right_eye_inner",
            Self::RightEye => "right_eye",
            Self::RightEyeOuter => "right_eye_outer",
            Self::LeftEar => "left_ear",
            Self::RightEar => "right_ear",
            Self::MouthLeft => "mouth_left",
            Self::MouthRight => "mouth_right",
            Self::LeftShoulder => "left_shoulder",
            Self::RightShoulder => "right_shoulder",
            Self::LeftElbow => "left_elbow",
            Self::RightElbow => "right_elbow",
            Self::LeftWrist => "left_wrist",
            Self::RightWrist => "right_wrist",
            Self::LeftPinky => "left_pinky",
            Self::RightPinky => "right_pinky",
            Self::LeftIndex => "left_index",
            Self::RightIndex => "right_index",
            Self::LeftThumb => "left_thumb",
            Self::RightThumb => "right_thumb",
            Self::LeftHip => "left_hip",
            Self::RightHip => "right_hip",
            Self::LeftKnee => "left_knee",
            Self::RightKnee => "right_knee",
            Self::LeftAnkle => "left_ankle",
            Self::RightAnkle => "right_ankle",
            Self::LeftHeel => "left_heel",
            Self::RightHeel => "right_heel",
            Self::LeftFootIndex => "left_foot_index",
            Self::RightFootIndex => "right_foot_index",
        }
    }
}

/// Joint angle for one processed frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AngleSample {
    /// Representative angle in degrees (mean of all configured triplets)
    pub angle: f64,
    /// Bilateral symmetry in percent, only when exactly two triplets exist
    pub symmetry: Option<f64>,
}
