pub mod app;
pub mod capture;
pub mod cli;
pub mod config;
pub mod detector;
pub mod error;
pub mod feedback;
pub mod frame_loop;
pub mod handoff;
pub mod heuristics;
pub mod instance;
#[cfg(unix)]
pub mod ipc;
pub mod landmark;
pub mod logging;
#[cfg(feature = "gui")]
pub mod popup;
pub mod posture;
pub mod startup;

pub use cli::{execute, run_cli, Cli, Commands, ConfigAction, StartupAction};
pub use config::{load_config, save_config, Config};
pub use feedback::{present, Feedback};
pub use frame_loop::{FrameLoop, LoopSettings};
pub use handoff::{LatestSlot, LoopState, Snapshot};
pub use posture::{Assessment, PostureAnalyzer};
