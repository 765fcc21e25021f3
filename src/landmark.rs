use serde::{Deserialize, Serialize};

/// COCO keypoint order, as emitted by YOLOv8-pose.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LandmarkKind {
    Nose,
    LeftEye,
    RightEye,
    LeftEar,
    RightEar,
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftWrist,
    RightWrist,
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
    LeftAnkle,
    RightAnkle,
}

pub const NUM_LANDMARKS: usize = 17;

impl LandmarkKind {
    pub const ALL: [LandmarkKind; NUM_LANDMARKS] = [
        LandmarkKind::Nose,
        LandmarkKind::LeftEye,
        LandmarkKind::RightEye,
        LandmarkKind::LeftEar,
        LandmarkKind::RightEar,
        LandmarkKind::LeftShoulder,
        LandmarkKind::RightShoulder,
        LandmarkKind::LeftElbow,
        LandmarkKind::RightElbow,
        LandmarkKind::LeftWrist,
        LandmarkKind::RightWrist,
        LandmarkKind::LeftHip,
        LandmarkKind::RightHip,
        LandmarkKind::LeftKnee,
        LandmarkKind::RightKnee,
        LandmarkKind::LeftAnkle,
        LandmarkKind::RightAnkle,
    ];

    pub fn idx(self) -> usize {
        self as usize
    }
}

/// A keypoint in normalized image coordinates (`0.0..=1.0` on both axes).
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub score: f32,
}

impl Landmark {
    pub fn new(x: f32, y: f32, score: f32) -> Self {
        Self { x, y, score }
    }
}

/// Keypoints of the most confident person in one frame. Keypoints the
/// detector was not confident about are stored as `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct LandmarkSet {
    points: [Option<Landmark>; NUM_LANDMARKS],
    width: u32,
    height: u32,
}

impl LandmarkSet {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            points: [None; NUM_LANDMARKS],
            width,
            height,
        }
    }

    pub fn with(mut self, kind: LandmarkKind, x: f32, y: f32) -> Self {
        self.insert(kind, Landmark::new(x, y, 1.0));
        self
    }

    pub fn insert(&mut self, kind: LandmarkKind, landmark: Landmark) {
        self.points[kind.idx()] = Some(landmark);
    }

    pub fn get(&self, kind: LandmarkKind) -> Option<Landmark> {
        self.points[kind.idx()]
    }

    /// Position of a keypoint in frame pixels.
    pub fn pixel(&self, kind: LandmarkKind) -> Option<(f32, f32)> {
        self.get(kind)
            .map(|l| (l.x * self.width as f32, l.y * self.height as f32))
    }

    pub fn frame_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn is_empty(&self) -> bool {
        self.points.iter().all(Option::is_none)
    }
}
