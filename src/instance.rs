use crate::config::APP_NAME;
use crate::logging::log_path;
use std::fs::{File, OpenOptions, TryLockError};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::{env, io};
use tracing::debug;

/// Lock file next to the log, unless `SITSMART_LOCK` points elsewhere.
pub fn lock_path() -> PathBuf {
    env::var_os("SITSMART_LOCK")
        .map(PathBuf::from)
        .unwrap_or_else(|| log_path().with_file_name(format!("{APP_NAME}.lock")))
}

/// Exclusive lock held for the lifetime of the running instance. The OS
/// drops it when the process exits, so a crash never leaves it stuck.
#[derive(Debug)]
pub struct InstanceLock {
    file: File,
    path: PathBuf,
}

impl InstanceLock {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for InstanceLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
        debug!(path = %self.path.display(), "instance lock released");
    }
}

/// Takes the instance lock, or returns `None` while another process holds it.
pub fn acquire() -> io::Result<Option<InstanceLock>> {
    let path = lock_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(&path)?;
    match file.try_lock() {
        Ok(()) => {}
        Err(TryLockError::WouldBlock) => return Ok(None),
        Err(TryLockError::Error(e)) => return Err(e),
    }
    file.set_len(0)?;
    write!(file, "{}", std::process::id())?;
    debug!(path = %path.display(), "instance lock taken");
    Ok(Some(InstanceLock { file, path }))
}
