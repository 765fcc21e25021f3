use serial_test::serial;
use sit_smart_coach::startup::{autostart_dir, EntryKind, StartupEntry};
use std::fs;
use tempfile::tempdir;

fn entry_in(dir: &std::path::Path, kind: EntryKind) -> StartupEntry {
    StartupEntry::new(dir, "SitSmartCoach", "/opt/sitsmart/sit-smart-coach", kind)
}

#[test]
fn register_twice_leaves_one_entry() {
    let dir = tempdir().unwrap();
    let entry = entry_in(&dir.path().join("autostart"), EntryKind::Desktop);

    let first = entry.register().unwrap();
    let after_once = fs::read_to_string(&first).unwrap();
    let second = entry.register().unwrap();

    assert_eq!(first, second);
    assert_eq!(fs::read_to_string(&second).unwrap(), after_once);
    assert_eq!(fs::read_dir(dir.path().join("autostart")).unwrap().count(), 1);
    assert!(entry.is_registered());
}

#[test]
fn register_rewrites_stale_entry() {
    let dir = tempdir().unwrap();
    let entry = entry_in(dir.path(), EntryKind::Desktop);
    fs::write(entry.path(), "stale").unwrap();
    entry.register().unwrap();
    assert_eq!(fs::read_to_string(entry.path()).unwrap(), entry.contents());
}

#[test]
fn unregister_when_absent_is_a_no_op() {
    let dir = tempdir().unwrap();
    let entry = entry_in(dir.path(), EntryKind::WindowsScript);
    assert!(!entry.unregister().unwrap());
    assert!(!entry.is_registered());
}

#[test]
fn unregister_removes_the_entry() {
    let dir = tempdir().unwrap();
    let entry = entry_in(dir.path(), EntryKind::LaunchAgent);
    entry.register().unwrap();
    assert!(entry.unregister().unwrap());
    assert!(!entry.is_registered());
    assert!(!entry.unregister().unwrap());
}

#[test]
fn entries_launch_the_executable() {
    let dir = tempdir().unwrap();
    for (kind, ext) in [
        (EntryKind::Desktop, "desktop"),
        (EntryKind::LaunchAgent, "plist"),
        (EntryKind::WindowsScript, "cmd"),
    ] {
        let entry = entry_in(dir.path(), kind);
        assert_eq!(entry.path(), dir.path().join(format!("SitSmartCoach.{ext}")));
        assert!(entry.contents().contains("/opt/sitsmart/sit-smart-coach"));
    }
}

#[test]
#[serial]
fn autostart_dir_uses_override() {
    let dir = tempdir().unwrap();
    std::env::set_var("SITSMART_AUTOSTART_DIR", dir.path());
    assert_eq!(autostart_dir(EntryKind::Desktop).unwrap(), dir.path());
    std::env::remove_var("SITSMART_AUTOSTART_DIR");
}

#[test]
#[serial]
fn desktop_dir_follows_xdg_config_home() {
    let dir = tempdir().unwrap();
    std::env::remove_var("SITSMART_AUTOSTART_DIR");
    std::env::set_var("XDG_CONFIG_HOME", dir.path());
    assert_eq!(
        autostart_dir(EntryKind::Desktop).unwrap(),
        dir.path().join("autostart")
    );
    std::env::remove_var("XDG_CONFIG_HOME");
}
