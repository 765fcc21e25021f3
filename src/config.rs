use crate::heuristics::{DistanceCalibration, Thresholds};
use crate::posture::MAX_SMOOTHING_WINDOW;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use std::{env, fs, io, path::PathBuf};
use tracing::{debug, warn};

pub const APP_NAME: &str = "SitSmartCoach";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    pub camera_index: u32,
    pub frame_interval_ms: u64,
    pub ui_refresh_ms: u64,
    pub retry_initial_ms: u64,
    pub retry_max_ms: u64,
    /// Consecutive capture failures before the loop gives up; 0 retries forever.
    pub max_camera_failures: u32,
    pub elbow_min_deg: f32,
    pub elbow_max_deg: f32,
    pub distance_min_cm: f32,
    pub distance_max_cm: f32,
    pub calibration: DistanceCalibration,
    pub gaze_dead_band: f32,
    pub smoothing_window: usize,
    pub detection_threshold: f32,
    pub keypoint_threshold: f32,
    pub model_path: PathBuf,
    pub model_repo: String,
    pub model_repo_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            camera_index: 0,
            frame_interval_ms: 50,
            ui_refresh_ms: 400,
            retry_initial_ms: 500,
            retry_max_ms: 5_000,
            max_camera_failures: 60,
            elbow_min_deg: 50.0,
            elbow_max_deg: 180.0,
            distance_min_cm: 50.0,
            distance_max_cm: 80.0,
            calibration: DistanceCalibration::default(),
            gaze_dead_band: 0.08,
            smoothing_window: 1,
            detection_threshold: 0.5,
            keypoint_threshold: 0.5,
            model_path: PathBuf::from("yolov8n-pose.onnx"),
            model_repo: "Xenova/yolov8n-pose".to_string(),
            model_repo_file: "onnx/model.onnx".to_string(),
        }
    }
}

impl Config {
    pub fn thresholds(&self) -> Thresholds {
        Thresholds {
            elbow_min_deg: self.elbow_min_deg,
            elbow_max_deg: self.elbow_max_deg,
            distance_min_cm: self.distance_min_cm,
            distance_max_cm: self.distance_max_cm,
            calibration: self.calibration,
            gaze_dead_band: self.gaze_dead_band,
        }
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }

    pub fn ui_refresh(&self) -> Duration {
        Duration::from_millis(self.ui_refresh_ms.max(16))
    }
}

/// Directory holding the executable, where the config, log and bundled
/// assets live.
pub fn app_dir() -> PathBuf {
    env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("."))
}

pub fn config_path() -> PathBuf {
    env::var_os("SITSMART_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|| app_dir().join(format!("{APP_NAME}.json")))
}

pub fn load_config() -> Config {
    let path = config_path();
    match fs::read(&path) {
        Ok(data) => match serde_json::from_slice(&data) {
            Ok(cfg) => {
                debug!(path = %path.display(), "loaded configuration");
                return sanitize(cfg);
            }
            Err(e) => warn!(path = %path.display(), "ignoring malformed config: {e}"),
        },
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no config file, using defaults")
        }
        Err(e) => warn!(path = %path.display(), "failed to read config: {e}"),
    }
    Config::default()
}

fn sanitize(mut cfg: Config) -> Config {
    if cfg.smoothing_window > MAX_SMOOTHING_WINDOW {
        warn!(
            requested = cfg.smoothing_window,
            max = MAX_SMOOTHING_WINDOW,
            "smoothing window too large, clamping"
        );
        cfg.smoothing_window = MAX_SMOOTHING_WINDOW;
    }
    cfg
}

pub fn save_config(cfg: &Config) -> io::Result<PathBuf> {
    let path = config_path();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let data = serde_json::to_vec_pretty(cfg)?;
    fs::write(&path, data)?;
    Ok(path)
}
