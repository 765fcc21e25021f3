use crate::config::{app_dir, APP_NAME};
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;
use std::{env, io};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Log file next to the executable, so a build without a console can still
/// be debugged.
pub fn log_path() -> PathBuf {
    env::var_os("SITSMART_LOG")
        .map(PathBuf::from)
        .unwrap_or_else(|| app_dir().join(format!("{APP_NAME}.log")))
}

pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path())
        .ok();
    let file_layer = file.map(|f| fmt::layer().with_ansi(false).with_writer(Mutex::new(f)));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .try_init();
}
