//! Geometric posture heuristics over a single frame's landmarks.
//!
//! Everything here is a pure function. Missing landmarks make a heuristic
//! indeterminate (`None`) rather than guessing.

use crate::landmark::{LandmarkKind, LandmarkSet};
use serde::{Deserialize, Serialize};

pub type Point = (f32, f32);

const MIN_SPAN: f32 = 1e-6;

/// Body measurement used for distance estimation.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceSpan {
    Shoulders,
    Eyes,
}

/// Apparent size of `span` at a known distance. The product of the two is
/// the calibration constant of the pinhole model.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistanceCalibration {
    pub span: DistanceSpan,
    pub reference_px: f32,
    pub reference_cm: f32,
}

impl Default for DistanceCalibration {
    /// ~650 px focal length and 30 cm average shoulder width.
    fn default() -> Self {
        Self {
            span: DistanceSpan::Shoulders,
            reference_px: 300.0,
            reference_cm: 65.0,
        }
    }
}

impl DistanceCalibration {
    /// Same focal length, 6.3 cm average interpupillary distance.
    pub fn interocular() -> Self {
        Self {
            span: DistanceSpan::Eyes,
            reference_px: 63.0,
            reference_cm: 65.0,
        }
    }

    pub fn constant(&self) -> f32 {
        self.reference_px * self.reference_cm
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub elbow_min_deg: f32,
    pub elbow_max_deg: f32,
    pub distance_min_cm: f32,
    pub distance_max_cm: f32,
    pub calibration: DistanceCalibration,
    pub gaze_dead_band: f32,
}

impl Default for Thresholds {
    fn default() -> Self {
        crate::config::Config::default().thresholds()
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gaze {
    Left,
    Center,
    Right,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum DistanceReading {
    Estimate(f32),
    /// The reference landmarks were found but collapse onto each other.
    Degenerate,
}

#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct PostureReading {
    pub elbow_angle: Option<f32>,
    pub distance: Option<DistanceReading>,
    pub gaze: Option<Gaze>,
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub enum ElbowStatus {
    Ok(f32),
    Adjust(f32),
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub enum DistanceStatus {
    Ok(f32),
    TooClose(f32),
    TooFar(f32),
    Recenter,
}

/// Angle at `elbow` between the segments towards `shoulder` and `wrist`,
/// in degrees.
pub fn elbow_angle(
    shoulder: Option<Point>,
    elbow: Option<Point>,
    wrist: Option<Point>,
) -> Option<f32> {
    let (s, e, w) = (shoulder?, elbow?, wrist?);
    let a = (s.0 - e.0, s.1 - e.1);
    let b = (w.0 - e.0, w.1 - e.1);
    let na = a.0.hypot(a.1);
    let nb = b.0.hypot(b.1);
    if !(na > MIN_SPAN && nb > MIN_SPAN) {
        return None;
    }
    let cos = (a.0 * b.0 + a.1 * b.1) / (na * nb);
    if !cos.is_finite() {
        return None;
    }
    Some(cos.clamp(-1.0, 1.0).acos().to_degrees().clamp(0.0, 180.0))
}

/// Elbow angle of the arm whose least visible joint is most visible.
pub fn best_elbow_angle(landmarks: &LandmarkSet) -> Option<f32> {
    use LandmarkKind::*;

    let arms = [
        (LeftShoulder, LeftElbow, LeftWrist),
        (RightShoulder, RightElbow, RightWrist),
    ];
    let mut candidates: Vec<(f32, f32)> = arms
        .iter()
        .filter_map(|&(s, e, w)| {
            let score = [s, e, w]
                .iter()
                .map(|&k| landmarks.get(k).map(|l| l.score))
                .collect::<Option<Vec<_>>>()?
                .into_iter()
                .fold(f32::INFINITY, f32::min);
            let angle = elbow_angle(landmarks.pixel(s), landmarks.pixel(e), landmarks.pixel(w))?;
            Some((score, angle))
        })
        .collect();
    candidates.sort_by(|a, b| b.0.total_cmp(&a.0));
    candidates.first().map(|&(_, angle)| angle)
}

/// Pinhole estimate `constant / span_px`. `None` when the span is too small
/// for the result to be meaningful.
pub fn estimate_distance_cm(span_px: f32, constant: f32) -> Option<f32> {
    if !(span_px > MIN_SPAN) {
        return None;
    }
    let distance = constant / span_px;
    (distance.is_finite() && distance > 0.0).then_some(distance)
}

pub fn measure_span(landmarks: &LandmarkSet, span: DistanceSpan) -> Option<f32> {
    let (a, b) = match span {
        DistanceSpan::Shoulders => (LandmarkKind::LeftShoulder, LandmarkKind::RightShoulder),
        DistanceSpan::Eyes => (LandmarkKind::LeftEye, LandmarkKind::RightEye),
    };
    let (a, b) = (landmarks.pixel(a)?, landmarks.pixel(b)?);
    Some((a.0 - b.0).hypot(a.1 - b.1))
}

pub fn distance_reading(
    landmarks: &LandmarkSet,
    calibration: &DistanceCalibration,
) -> Option<DistanceReading> {
    let span = measure_span(landmarks, calibration.span)?;
    Some(match estimate_distance_cm(span, calibration.constant()) {
        Some(cm) => DistanceReading::Estimate(cm),
        None => DistanceReading::Degenerate,
    })
}

/// Horizontal position of `pupil_x` inside the box spanned by `edge_a` and
/// `edge_b`, re-centred to `-0.5..=0.5` (0 is the middle of the box).
pub fn gaze_offset(pupil_x: f32, edge_a: f32, edge_b: f32) -> Option<f32> {
    let (left, right) = (edge_a.min(edge_b), edge_a.max(edge_b));
    let width = right - left;
    if !(width > MIN_SPAN) {
        return None;
    }
    Some((pupil_x - left) / width - 0.5)
}

pub fn classify_gaze(offset: f32, dead_band: f32) -> Gaze {
    if offset < -dead_band {
        Gaze::Left
    } else if offset > dead_band {
        Gaze::Right
    } else {
        Gaze::Center
    }
}

/// Eye midpoint inside the ear-to-ear box, or the nose inside the shoulders
/// when the ears are not visible.
pub fn gaze_direction(landmarks: &LandmarkSet, dead_band: f32) -> Option<Gaze> {
    use LandmarkKind::*;

    let eyes = || {
        let (le, re) = (landmarks.get(LeftEye)?, landmarks.get(RightEye)?);
        let (la, ra) = (landmarks.get(LeftEar)?, landmarks.get(RightEar)?);
        gaze_offset((le.x + re.x) / 2.0, la.x, ra.x)
    };
    let nose = || {
        let n = landmarks.get(Nose)?;
        let (ls, rs) = (landmarks.get(LeftShoulder)?, landmarks.get(RightShoulder)?);
        gaze_offset(n.x, ls.x, rs.x)
    };
    eyes().or_else(nose).map(|offset| classify_gaze(offset, dead_band))
}

pub fn read_posture(landmarks: &LandmarkSet, thresholds: &Thresholds) -> PostureReading {
    PostureReading {
        elbow_angle: best_elbow_angle(landmarks),
        distance: distance_reading(landmarks, &thresholds.calibration),
        gaze: gaze_direction(landmarks, thresholds.gaze_dead_band),
    }
}

pub fn classify_elbow(angle: f32, thresholds: &Thresholds) -> ElbowStatus {
    if (thresholds.elbow_min_deg..=thresholds.elbow_max_deg).contains(&angle) {
        ElbowStatus::Ok(angle)
    } else {
        ElbowStatus::Adjust(angle)
    }
}

pub fn classify_distance(reading: DistanceReading, thresholds: &Thresholds) -> DistanceStatus {
    match reading {
        DistanceReading::Degenerate => DistanceStatus::Recenter,
        DistanceReading::Estimate(cm) if cm < thresholds.distance_min_cm => {
            DistanceStatus::TooClose(cm)
        }
        DistanceReading::Estimate(cm) if cm > thresholds.distance_max_cm => {
            DistanceStatus::TooFar(cm)
        }
        DistanceReading::Estimate(cm) => DistanceStatus::Ok(cm),
    }
}
