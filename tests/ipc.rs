#![cfg(unix)]

use serial_test::serial;
use sit_smart_coach::feedback::Feedback;
use sit_smart_coach::ipc::{
    claim_instance, query_status, release_instance, send_command, socket_path, spawn_control_thread,
    ControlMessage,
};
use sit_smart_coach::{LatestSlot, LoopState, Snapshot};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tempfile::tempdir;

#[test]
#[serial]
fn socket_uses_env_variable() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("sockenv");
    std::env::set_var("SITSMART_SOCKET", &path);
    std::env::remove_var("XDG_RUNTIME_DIR");
    assert_eq!(socket_path(), path);
    std::env::remove_var("SITSMART_SOCKET");
}

#[test]
#[serial]
fn socket_uses_runtime_dir() {
    let dir = tempdir().unwrap();
    std::env::remove_var("SITSMART_SOCKET");
    std::env::set_var("XDG_RUNTIME_DIR", dir.path());
    assert_eq!(socket_path(), dir.path().join("sitsmart.sock"));
    std::env::remove_var("XDG_RUNTIME_DIR");
}

#[test]
#[serial]
fn socket_falls_back_to_tempdir() {
    std::env::remove_var("SITSMART_SOCKET");
    std::env::remove_var("XDG_RUNTIME_DIR");
    assert_eq!(socket_path(), std::env::temp_dir().join("sitsmart.sock"));
}

#[test]
#[serial]
fn running_instance_answers_status_and_quit() {
    let dir = tempdir().unwrap();
    std::env::set_var("SITSMART_SOCKET", dir.path().join("sock"));

    let slot = Arc::new(LatestSlot::new());
    let stop = Arc::new(AtomicBool::new(false));
    let snapshot = Snapshot::new(LoopState::Running, Feedback::neutral());
    slot.publish(snapshot.clone());

    let listener = claim_instance().unwrap().expect("socket should be free");
    spawn_control_thread(listener, slot, stop.clone());

    assert!(claim_instance().unwrap().is_none(), "second instance must be refused");
    assert_eq!(query_status().unwrap(), Some(snapshot));

    assert_eq!(send_command(ControlMessage::Quit).unwrap(), None);
    let deadline = Instant::now() + Duration::from_secs(2);
    while !stop.load(Ordering::Relaxed) && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(10));
    }
    assert!(stop.load(Ordering::Relaxed));

    release_instance();
    assert!(!dir.path().join("sock").exists());
    std::env::remove_var("SITSMART_SOCKET");
}

#[test]
#[serial]
fn stale_socket_is_reclaimed() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("sock");
    std::env::set_var("SITSMART_SOCKET", &path);
    drop(std::os::unix::net::UnixListener::bind(&path).unwrap());
    assert!(path.exists());

    assert!(claim_instance().unwrap().is_some());
    release_instance();
    std::env::remove_var("SITSMART_SOCKET");
}
