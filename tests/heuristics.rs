use proptest::prelude::*;
use sit_smart_coach::heuristics::{
    best_elbow_angle, classify_distance, classify_elbow, classify_gaze, distance_reading,
    elbow_angle, estimate_distance_cm, gaze_direction, gaze_offset, DistanceCalibration,
    DistanceReading, DistanceStatus, ElbowStatus, Gaze, Thresholds,
};
use sit_smart_coach::landmark::{LandmarkKind, LandmarkSet};

fn close(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-3
}

proptest! {
    #[test]
    fn elbow_angle_stays_in_range(
        sx in -1000f32..1000.0, sy in -1000f32..1000.0,
        ex in -1000f32..1000.0, ey in -1000f32..1000.0,
        wx in -1000f32..1000.0, wy in -1000f32..1000.0,
    ) {
        if let Some(angle) = elbow_angle(Some((sx, sy)), Some((ex, ey)), Some((wx, wy))) {
            prop_assert!((0.0..=180.0).contains(&angle), "angle {angle}");
        }
    }

    #[test]
    fn gaze_sweep_never_skips_center(dead_band in 0.05f32..0.4, steps in 20usize..400) {
        let buckets: Vec<Gaze> = (0..=steps)
            .map(|i| i as f32 / steps as f32)
            .map(|x| classify_gaze(gaze_offset(x, 0.0, 1.0).unwrap(), dead_band))
            .collect();
        let mut compact = buckets.clone();
        compact.dedup();
        prop_assert_eq!(compact, vec![Gaze::Left, Gaze::Center, Gaze::Right]);
    }
}

#[test]
fn elbow_angle_is_indeterminate_without_a_joint() {
    assert_eq!(elbow_angle(None, Some((0.0, 0.0)), Some((1.0, 0.0))), None);
    assert_eq!(elbow_angle(Some((0.0, 1.0)), None, Some((1.0, 0.0))), None);
    assert_eq!(elbow_angle(Some((0.0, 1.0)), Some((0.0, 0.0)), None), None);
}

#[test]
fn elbow_angle_of_degenerate_segment_is_indeterminate() {
    assert_eq!(elbow_angle(Some((1.0, 1.0)), Some((1.0, 1.0)), Some((2.0, 0.0))), None);
}

#[test]
fn elbow_angle_matches_known_geometry() {
    let right = elbow_angle(Some((0.0, -1.0)), Some((0.0, 0.0)), Some((1.0, 0.0))).unwrap();
    assert!(close(right, 90.0));
    let straight = elbow_angle(Some((-1.0, 0.0)), Some((0.0, 0.0)), Some((1.0, 0.0))).unwrap();
    assert!(close(straight, 180.0));
    let folded = elbow_angle(Some((1.0, 0.0)), Some((0.0, 0.0)), Some((2.0, 0.0))).unwrap();
    assert!(close(folded, 0.0));
}

#[test]
fn best_elbow_angle_prefers_the_more_visible_arm() {
    use sit_smart_coach::landmark::Landmark;
    let mut set = LandmarkSet::new(100, 100);
    // Left arm straight, weakly seen.
    set.insert(LandmarkKind::LeftShoulder, Landmark::new(0.2, 0.5, 0.6));
    set.insert(LandmarkKind::LeftElbow, Landmark::new(0.4, 0.5, 0.6));
    set.insert(LandmarkKind::LeftWrist, Landmark::new(0.6, 0.5, 0.6));
    // Right arm bent at 90°, clearly seen.
    set.insert(LandmarkKind::RightShoulder, Landmark::new(0.5, 0.2, 0.9));
    set.insert(LandmarkKind::RightElbow, Landmark::new(0.5, 0.5, 0.9));
    set.insert(LandmarkKind::RightWrist, Landmark::new(0.8, 0.5, 0.9));
    assert!(close(best_elbow_angle(&set).unwrap(), 90.0));
}

#[test]
fn interocular_span_at_65_cm_is_in_range() {
    let calibration = DistanceCalibration::interocular();
    let thresholds = Thresholds {
        calibration,
        ..Thresholds::default()
    };
    let span_px = calibration.constant() / 65.0;
    let cm = estimate_distance_cm(span_px, calibration.constant()).unwrap();
    assert!(close(cm, 65.0));
    assert_eq!(
        classify_distance(DistanceReading::Estimate(cm), &thresholds),
        DistanceStatus::Ok(cm)
    );
}

#[test]
fn distance_outside_band_is_too_close_or_too_far() {
    let thresholds = Thresholds::default();
    assert_eq!(
        classify_distance(DistanceReading::Estimate(40.0), &thresholds),
        DistanceStatus::TooClose(40.0)
    );
    assert_eq!(
        classify_distance(DistanceReading::Estimate(95.0), &thresholds),
        DistanceStatus::TooFar(95.0)
    );
    assert_eq!(
        classify_distance(DistanceReading::Estimate(50.0), &thresholds),
        DistanceStatus::Ok(50.0)
    );
}

#[test]
fn distance_estimate_is_positive_or_absent() {
    assert_eq!(estimate_distance_cm(0.0, 19_500.0), None);
    assert_eq!(estimate_distance_cm(-3.0, 19_500.0), None);
    assert_eq!(estimate_distance_cm(f32::NAN, 19_500.0), None);
    assert!(estimate_distance_cm(300.0, 19_500.0).unwrap() > 0.0);
}

#[test]
fn shoulder_span_drives_default_distance() {
    // 300 px apart on a 640 px wide frame is the 65 cm reference.
    let set = LandmarkSet::new(640, 480)
        .with(LandmarkKind::LeftShoulder, 170.0 / 640.0, 0.6)
        .with(LandmarkKind::RightShoulder, 470.0 / 640.0, 0.6);
    match distance_reading(&set, &DistanceCalibration::default()) {
        Some(DistanceReading::Estimate(cm)) => assert!(close(cm, 65.0)),
        other => panic!("unexpected reading {other:?}"),
    }
}

#[test]
fn overlapping_shoulders_ask_to_recenter() {
    let set = LandmarkSet::new(640, 480)
        .with(LandmarkKind::LeftShoulder, 0.5, 0.6)
        .with(LandmarkKind::RightShoulder, 0.5, 0.6);
    let reading = distance_reading(&set, &DistanceCalibration::default());
    assert_eq!(reading, Some(DistanceReading::Degenerate));
    assert_eq!(
        classify_distance(DistanceReading::Degenerate, &Thresholds::default()),
        DistanceStatus::Recenter
    );
}

#[test]
fn elbow_classification_uses_threshold_band() {
    let thresholds = Thresholds::default();
    assert_eq!(classify_elbow(45.0, &thresholds), ElbowStatus::Adjust(45.0));
    assert_eq!(classify_elbow(95.0, &thresholds), ElbowStatus::Ok(95.0));
}

#[test]
fn gaze_uses_eyes_inside_ears() {
    let looking = |eye_mid: f32| {
        LandmarkSet::new(640, 480)
            .with(LandmarkKind::LeftEar, 0.6, 0.3)
            .with(LandmarkKind::RightEar, 0.4, 0.3)
            .with(LandmarkKind::LeftEye, eye_mid + 0.02, 0.3)
            .with(LandmarkKind::RightEye, eye_mid - 0.02, 0.3)
    };
    assert_eq!(gaze_direction(&looking(0.5), 0.08), Some(Gaze::Center));
    assert_eq!(gaze_direction(&looking(0.43), 0.08), Some(Gaze::Left));
    assert_eq!(gaze_direction(&looking(0.57), 0.08), Some(Gaze::Right));
}

#[test]
fn gaze_falls_back_to_nose_between_shoulders() {
    let set = LandmarkSet::new(640, 480)
        .with(LandmarkKind::Nose, 0.35, 0.3)
        .with(LandmarkKind::LeftShoulder, 0.7, 0.6)
        .with(LandmarkKind::RightShoulder, 0.3, 0.6);
    assert_eq!(gaze_direction(&set, 0.08), Some(Gaze::Left));
}

#[test]
fn gaze_without_landmarks_is_indeterminate() {
    let set = LandmarkSet::new(640, 480).with(LandmarkKind::Nose, 0.5, 0.3);
    assert_eq!(gaze_direction(&set, 0.08), None);
}
