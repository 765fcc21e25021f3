use crate::handoff::{LatestSlot, Snapshot};
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use std::net::Shutdown;
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::{env, fs, io};
use tracing::{debug, error, trace};

#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub enum ControlMessage {
    Status,
    Quit,
}

pub fn socket_path() -> PathBuf {
    if let Some(path) = env::var_os("SITSMART_SOCKET") {
        return PathBuf::from(path);
    }
    env::var_os("XDG_RUNTIME_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(env::temp_dir)
        .join("sitsmart.sock")
}

pub fn send_command(msg: ControlMessage) -> io::Result<Option<String>> {
    let mut stream = UnixStream::connect(socket_path())?;
    serde_json::to_writer(&mut stream, &msg)?;
    stream.flush()?;
    let _ = stream.shutdown(Shutdown::Write);

    if matches!(msg, ControlMessage::Status) {
        let mut buf = String::new();
        stream.read_to_string(&mut buf)?;
        Ok(Some(buf))
    } else {
        Ok(None)
    }
}

/// Latest snapshot of the running instance.
pub fn query_status() -> io::Result<Option<Snapshot>> {
    match send_command(ControlMessage::Status)? {
        Some(reply) if !reply.is_empty() => Ok(Some(serde_json::from_str(&reply)?)),
        _ => Ok(None),
    }
}

/// Binds the control socket, or returns `None` when another instance is
/// already answering on it.
pub fn claim_instance() -> io::Result<Option<UnixListener>> {
    let path = socket_path();
    if UnixStream::connect(&path).is_ok() {
        return Ok(None);
    }
    if fs::remove_file(&path).is_ok() {
        trace!(path = %path.display(), "removed stale socket");
    }
    let listener = UnixListener::bind(&path)?;
    debug!(path = %path.display(), "socket bound");
    Ok(Some(listener))
}

pub fn release_instance() {
    let path = socket_path();
    if fs::remove_file(&path).is_ok() {
        trace!(path = %path.display(), "socket removed");
    }
}

pub fn spawn_control_thread(
    listener: UnixListener,
    slot: Arc<LatestSlot<Snapshot>>,
    stop: Arc<AtomicBool>,
) {
    debug!("starting IPC thread");
    std::thread::spawn(move || {
        for stream in listener.incoming() {
            match stream {
                Ok(mut s) => match serde_json::from_reader::<_, ControlMessage>(&mut s) {
                    Ok(msg) => {
                        debug!(?msg, "received message");
                        match msg {
                            ControlMessage::Status => {
                                let reply = slot
                                    .latest()
                                    .and_then(|snapshot| serde_json::to_vec(&snapshot).ok())
                                    .unwrap_or_default();
                                if let Err(e) = s.write_all(&reply) {
                                    error!("failed to send status: {e}");
                                }
                            }
                            ControlMessage::Quit => {
                                debug!("quit requested");
                                stop.store(true, Ordering::Relaxed);
                            }
                        }
                    }
                    Err(e) => debug!("ignoring malformed message: {e}"),
                },
                Err(e) => error!("failed to accept connection: {e}"),
            }
        }
    });
}
