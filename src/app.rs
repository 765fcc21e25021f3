use crate::capture::WebcamSource;
use crate::config::Config;
use crate::detector::{model_is_local, OnnxPoseDetector};
use crate::feedback::{Feedback, Icon};
use crate::frame_loop::{FrameLoop, LoopSettings};
use crate::handoff::{LatestSlot, LoopState, Snapshot};
use crate::instance;
use crate::posture::PostureAnalyzer;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

const JOIN_TIMEOUT: Duration = Duration::from_millis(1500);

/// Runs the monitor until the popup is closed, a `quit` command arrives, or
/// (headless) Ctrl-C is pressed.
pub fn run_app(cfg: Config, headless: bool) {
    info!("SitSmart Coach starting");
    debug!(?cfg, "effective configuration");

    let _lock = match instance::acquire() {
        Ok(Some(lock)) => Some(lock),
        Ok(None) => {
            info!("another instance is running; exiting");
            return;
        }
        Err(e) => {
            warn!("instance lock unavailable, continuing without it: {e}");
            None
        }
    };

    let slot: Arc<LatestSlot<Snapshot>> = Arc::new(LatestSlot::new());
    let stop = Arc::new(AtomicBool::new(false));

    #[cfg(unix)]
    let owns_socket = match crate::ipc::claim_instance() {
        Ok(Some(listener)) => {
            crate::ipc::spawn_control_thread(listener, slot.clone(), stop.clone());
            true
        }
        Ok(None) => {
            info!("another instance is running; exiting");
            return;
        }
        Err(e) => {
            warn!("control socket unavailable, running without it: {e}");
            false
        }
    };
    #[cfg(not(unix))]
    let owns_socket = false;

    slot.publish(Snapshot::starting());
    let worker = spawn_worker(cfg.clone(), slot.clone(), stop.clone());

    present(&cfg, headless, slot, stop.clone());

    stop.store(true, Ordering::Relaxed);
    join_worker(worker);
    if owns_socket {
        release_socket();
    }
    info!("UI closed. Goodbye.");
}

pub fn spawn_worker(
    cfg: Config,
    slot: Arc<LatestSlot<Snapshot>>,
    stop: Arc<AtomicBool>,
) -> JoinHandle<()> {
    std::thread::spawn(move || {
        let worker_slot = slot.clone();
        run_supervised(&slot, move || run_worker(cfg, worker_slot, stop));
    })
}

/// Runs `body`, turning a panic into a terminal snapshot so the UI does not
/// keep showing stale feedback. Returns `false` if `body` panicked.
pub fn run_supervised<F: FnOnce()>(slot: &LatestSlot<Snapshot>, body: F) -> bool {
    match panic::catch_unwind(AssertUnwindSafe(body)) {
        Ok(()) => true,
        Err(payload) => {
            let reason = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            error!("worker crashed: {reason}");
            slot.publish(Snapshot::new(LoopState::Terminated, Feedback::internal_error()));
            false
        }
    }
}

fn run_worker(cfg: Config, slot: Arc<LatestSlot<Snapshot>>, stop: Arc<AtomicBool>) {
    if !model_is_local(&cfg) {
        slot.publish(Snapshot::new(
            LoopState::Starting,
            Feedback::single(Icon::Info, "Downloading pose model…"),
        ));
    }
    let detector = match OnnxPoseDetector::load(&cfg) {
        Ok(d) => d,
        Err(e) => {
            error!("failed to load pose model: {e}");
            slot.publish(Snapshot::new(LoopState::Terminated, Feedback::model_unavailable()));
            return;
        }
    };
    let frame_loop = FrameLoop::new(
        WebcamSource::new(cfg.camera_index),
        detector,
        PostureAnalyzer::new(cfg.thresholds(), cfg.smoothing_window),
        LoopSettings::from(&cfg),
        slot,
        stop,
    );
    if let Err(e) = frame_loop.run() {
        error!("frame loop terminated: {e}");
    }
}

#[cfg(unix)]
fn release_socket() {
    crate::ipc::release_instance();
}

#[cfg(not(unix))]
fn release_socket() {}

fn join_worker(worker: JoinHandle<()>) {
    let deadline = Instant::now() + JOIN_TIMEOUT;
    while !worker.is_finished() && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(20));
    }
    if !worker.is_finished() {
        warn!("frame loop still busy, not waiting for it");
        return;
    }
    if worker.join().is_err() {
        error!("frame loop panicked");
    }
}

#[cfg(feature = "gui")]
fn present(cfg: &Config, headless: bool, slot: Arc<LatestSlot<Snapshot>>, stop: Arc<AtomicBool>) {
    if headless {
        run_headless(slot, stop, cfg.ui_refresh());
    } else if let Err(e) = crate::popup::run_popup(slot, stop, cfg.ui_refresh()) {
        error!("popup failed: {e}");
    }
}

#[cfg(not(feature = "gui"))]
fn present(cfg: &Config, headless: bool, slot: Arc<LatestSlot<Snapshot>>, stop: Arc<AtomicBool>) {
    if !headless {
        info!("built without the popup, running headless");
    }
    run_headless(slot, stop, cfg.ui_refresh());
}

/// Logs every change of feedback until stopped or the loop terminates.
pub fn run_headless(slot: Arc<LatestSlot<Snapshot>>, stop: Arc<AtomicBool>, refresh: Duration) {
    let handler_stop = stop.clone();
    if let Err(e) = ctrlc::set_handler(move || handler_stop.store(true, Ordering::Relaxed)) {
        warn!("failed to install Ctrl-C handler: {e}");
    }

    let mut seen = 0;
    let mut shown: Option<Feedback> = None;
    while !stop.load(Ordering::Relaxed) {
        if let Some(snapshot) = slot.newer_than(&mut seen) {
            if shown.as_ref() != Some(&snapshot.feedback) {
                let text = snapshot.feedback.to_string().replace('\n', " | ");
                info!(state = ?snapshot.state, "{text}");
                shown = Some(snapshot.feedback);
            }
            if snapshot.state == LoopState::Terminated {
                break;
            }
        }
        std::thread::sleep(refresh);
    }
}
