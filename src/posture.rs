use crate::heuristics::{
    classify_distance, classify_elbow, read_posture, DistanceReading, DistanceStatus, ElbowStatus,
    Gaze, Thresholds,
};
use crate::landmark::LandmarkSet;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::trace;

/// Longest smoothing history kept, about six seconds at the default frame
/// interval.
pub const MAX_SMOOTHING_WINDOW: usize = 120;

/// Classification of one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Assessment {
    NoPerson,
    Person {
        elbow: Option<ElbowStatus>,
        distance: Option<DistanceStatus>,
        gaze: Option<Gaze>,
    },
}

/// Turns per-frame landmarks into classifications, optionally filtering the
/// readings over the last `window` frames.
pub struct PostureAnalyzer {
    thresholds: Thresholds,
    window: usize,
    angles: VecDeque<f32>,
    distances: VecDeque<f32>,
    gazes: VecDeque<Gaze>,
}

impl PostureAnalyzer {
    pub fn new(thresholds: Thresholds, window: usize) -> Self {
        Self {
            thresholds,
            window: window.clamp(1, MAX_SMOOTHING_WINDOW),
            angles: VecDeque::new(),
            distances: VecDeque::new(),
            gazes: VecDeque::new(),
        }
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    pub fn assess(&mut self, landmarks: Option<&LandmarkSet>) -> Assessment {
        let Some(landmarks) = landmarks.filter(|l| !l.is_empty()) else {
            self.reset();
            return Assessment::NoPerson;
        };
        let reading = read_posture(landmarks, &self.thresholds);
        trace!(?reading, "posture reading");

        let elbow = reading.elbow_angle.map(|angle| {
            let angle = push_median(&mut self.angles, self.window, angle);
            classify_elbow(angle, &self.thresholds)
        });
        let distance = reading.distance.map(|reading| match reading {
            DistanceReading::Estimate(cm) => {
                let cm = push_median(&mut self.distances, self.window, cm);
                classify_distance(DistanceReading::Estimate(cm), &self.thresholds)
            }
            DistanceReading::Degenerate => classify_distance(reading, &self.thresholds),
        });
        let gaze = reading
            .gaze
            .map(|gaze| push_majority(&mut self.gazes, self.window, gaze));

        Assessment::Person { elbow, distance, gaze }
    }

    pub fn reset(&mut self) {
        self.angles.clear();
        self.distances.clear();
        self.gazes.clear();
    }
}

fn push_bounded<T>(history: &mut VecDeque<T>, window: usize, value: T) {
    history.push_back(value);
    while history.len() > window {
        history.pop_front();
    }
}

fn push_median(history: &mut VecDeque<f32>, window: usize, value: f32) -> f32 {
    push_bounded(history, window, value);
    let mut sorted: Vec<f32> = history.iter().copied().collect();
    sorted.sort_by(f32::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Most frequent bucket; ties go to the most recent one.
fn push_majority(history: &mut VecDeque<Gaze>, window: usize, value: Gaze) -> Gaze {
    push_bounded(history, window, value);
    let mut best = (value, 0);
    for &candidate in history.iter().rev() {
        let count = history.iter().filter(|&&g| g == candidate).count();
        if count > best.1 {
            best = (candidate, count);
        }
    }
    best.0
}
