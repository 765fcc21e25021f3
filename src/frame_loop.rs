use crate::capture::FrameSource;
use crate::config::Config;
use crate::detector::PoseDetector;
use crate::error::LoopError;
use crate::feedback::{present, Feedback};
use crate::handoff::{LatestSlot, LoopState, Snapshot};
use crate::posture::PostureAnalyzer;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, trace, warn};

const STOP_POLL: Duration = Duration::from_millis(50);

#[derive(Debug, Copy, Clone)]
pub struct LoopSettings {
    pub frame_interval: Duration,
    pub retry_initial: Duration,
    pub retry_max: Duration,
    /// 0 keeps retrying until stopped.
    pub max_failures: u32,
}

impl From<&Config> for LoopSettings {
    fn from(cfg: &Config) -> Self {
        Self {
            frame_interval: cfg.frame_interval(),
            retry_initial: Duration::from_millis(cfg.retry_initial_ms),
            retry_max: Duration::from_millis(cfg.retry_max_ms),
            max_failures: cfg.max_camera_failures,
        }
    }
}

/// Exponential retry delay.
#[derive(Debug)]
struct Backoff {
    initial: Duration,
    max: Duration,
    next: Duration,
}

impl Backoff {
    fn new(initial: Duration, max: Duration) -> Self {
        Self {
            initial,
            max: max.max(initial),
            next: initial,
        }
    }

    fn next_delay(&mut self) -> Duration {
        let delay = self.next;
        self.next = (self.next * 2).min(self.max);
        delay
    }

    fn reset(&mut self) {
        self.next = self.initial;
    }
}

/// Capture → detect → evaluate → publish, until stopped or the camera is
/// gone for good.
pub struct FrameLoop<S, D> {
    source: S,
    detector: D,
    analyzer: PostureAnalyzer,
    settings: LoopSettings,
    slot: Arc<LatestSlot<Snapshot>>,
    stop: Arc<AtomicBool>,
}

impl<S: FrameSource, D: PoseDetector> FrameLoop<S, D> {
    pub fn new(
        source: S,
        detector: D,
        analyzer: PostureAnalyzer,
        settings: LoopSettings,
        slot: Arc<LatestSlot<Snapshot>>,
        stop: Arc<AtomicBool>,
    ) -> Self {
        Self {
            source,
            detector,
            analyzer,
            settings,
            slot,
            stop,
        }
    }

    pub fn run(mut self) -> Result<(), LoopError> {
        let mut backoff = Backoff::new(self.settings.retry_initial, self.settings.retry_max);
        let mut failures = 0u32;
        let mut frames = 0u64;
        info!("frame loop started");

        while !self.stop.load(Ordering::Relaxed) {
            let started = Instant::now();
            let frame = match self.source.next_frame() {
                Ok(frame) => frame,
                Err(e) => {
                    failures += 1;
                    self.source.release();
                    if self.settings.max_failures > 0 && failures >= self.settings.max_failures {
                        error!(failures, "giving up on camera: {e}");
                        self.publish(LoopState::Terminated, Feedback::camera_lost());
                        return Err(LoopError::CameraLost {
                            attempts: failures,
                            source: e,
                        });
                    }
                    let delay = backoff.next_delay();
                    warn!(failures, retry_in = ?delay, "camera unavailable: {e}");
                    self.publish(LoopState::PausedOnFault, Feedback::camera_retrying());
                    self.sleep(delay);
                    continue;
                }
            };
            if failures > 0 {
                info!(failures, "camera recovered");
                failures = 0;
                backoff.reset();
            }

            let landmarks = match self.detector.detect(&frame) {
                Ok(landmarks) => landmarks,
                Err(e) => {
                    warn!("pose detection failed: {e}");
                    None
                }
            };
            let assessment = self.analyzer.assess(landmarks.as_ref());
            let feedback = present(&assessment);
            debug!(?assessment, "frame assessed");
            self.publish(LoopState::Running, feedback);

            frames += 1;
            if frames % 100 == 0 {
                debug!(frames, took = ?started.elapsed(), "frame loop progress");
            }
            self.sleep(self.settings.frame_interval.saturating_sub(started.elapsed()));
        }

        self.source.release();
        info!(frames, "frame loop stopped");
        Ok(())
    }

    fn publish(&self, state: LoopState, feedback: Feedback) {
        let generation = self.slot.publish(Snapshot::new(state, feedback));
        trace!(generation, ?state, "snapshot published");
    }

    /// Sleeps in short steps so a stop request is honored promptly.
    fn sleep(&self, total: Duration) {
        let deadline = Instant::now() + total;
        loop {
            if self.stop.load(Ordering::Relaxed) {
                return;
            }
            let left = deadline.saturating_duration_since(Instant::now());
            if left.is_zero() {
                return;
            }
            std::thread::sleep(left.min(STOP_POLL));
        }
    }
}
