//! Per-user auto-start registration.
//!
//! Every platform is handled with a plain file in a well-known directory,
//! so registering is a write and unregistering is a delete.

use crate::config::APP_NAME;
use crate::error::StartupError;
use std::path::{Path, PathBuf};
use std::{env, fs, io};
use tracing::{debug, info};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum EntryKind {
    /// XDG `.desktop` file.
    Desktop,
    /// launchd `.plist`.
    LaunchAgent,
    /// Launcher script in the Windows Startup folder.
    WindowsScript,
}

impl EntryKind {
    pub fn native() -> Self {
        if cfg!(windows) {
            EntryKind::WindowsScript
        } else if cfg!(target_os = "macos") {
            EntryKind::LaunchAgent
        } else {
            EntryKind::Desktop
        }
    }

    fn extension(self) -> &'static str {
        match self {
            EntryKind::Desktop => "desktop",
            EntryKind::LaunchAgent => "plist",
            EntryKind::WindowsScript => "cmd",
        }
    }
}

#[derive(Debug, Clone)]
pub struct StartupEntry {
    dir: PathBuf,
    name: String,
    exe: PathBuf,
    kind: EntryKind,
}

impl StartupEntry {
    pub fn new(
        dir: impl Into<PathBuf>,
        name: impl Into<String>,
        exe: impl Into<PathBuf>,
        kind: EntryKind,
    ) -> Self {
        Self {
            dir: dir.into(),
            name: name.into(),
            exe: exe.into(),
            kind,
        }
    }

    /// Entry launching the running executable, in the platform's auto-start
    /// directory (or `SITSMART_AUTOSTART_DIR`).
    pub fn for_current_exe() -> Result<Self, StartupError> {
        let exe = env::current_exe().map_err(StartupError::CurrentExe)?;
        let kind = EntryKind::native();
        Ok(Self::new(autostart_dir(kind)?, APP_NAME, exe, kind))
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(format!("{}.{}", self.name, self.kind.extension()))
    }

    pub fn contents(&self) -> String {
        let exe = self.exe.display();
        match self.kind {
            EntryKind::Desktop => format!(
                "[Desktop Entry]\nType=Application\nName={}\nExec=\"{exe}\"\n\
                 Terminal=false\nX-GNOME-Autostart-enabled=true\n",
                self.name
            ),
            EntryKind::LaunchAgent => format!(
                "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
                 <!DOCTYPE plist PUBLIC \"-//Apple//DTD PLIST 1.0//EN\" \
                 \"http://www.apple.com/DTDs/PropertyList-1.0.dtd\">\n\
                 <plist version=\"1.0\">\n<dict>\n\
                 \t<key>Label</key>\n\t<string>{}</string>\n\
                 \t<key>ProgramArguments</key>\n\t<array>\n\t\t<string>{exe}</string>\n\t</array>\n\
                 \t<key>RunAtLoad</key>\n\t<true/>\n\
                 </dict>\n</plist>\n",
                self.name
            ),
            EntryKind::WindowsScript => format!("@echo off\r\nstart \"\" \"{exe}\"\r\n"),
        }
    }

    pub fn is_registered(&self) -> bool {
        self.path().is_file()
    }

    /// Writes the entry. Registering again leaves the same single entry.
    pub fn register(&self) -> Result<PathBuf, StartupError> {
        let path = self.path();
        let contents = self.contents();
        if fs::read_to_string(&path).is_ok_and(|existing| existing == contents) {
            debug!(path = %path.display(), "startup entry already present");
            return Ok(path);
        }
        fs::create_dir_all(&self.dir).map_err(|e| StartupError::CreateDir(e, self.dir.clone()))?;
        fs::write(&path, contents).map_err(|e| StartupError::Write(e, path.clone()))?;
        info!(path = %path.display(), "added to startup");
        Ok(path)
    }

    /// Removes the entry; returns whether there was one.
    pub fn unregister(&self) -> Result<bool, StartupError> {
        let path = self.path();
        match fs::remove_file(&path) {
            Ok(()) => {
                info!(path = %path.display(), "removed from startup");
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no startup entry to remove");
                Ok(false)
            }
            Err(e) => Err(StartupError::Remove(e, path)),
        }
    }
}

fn env_dir(var: &'static str) -> Result<PathBuf, StartupError> {
    env::var_os(var)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .ok_or(StartupError::MissingEnv(var))
}

pub fn autostart_dir(kind: EntryKind) -> Result<PathBuf, StartupError> {
    if let Ok(dir) = env_dir("SITSMART_AUTOSTART_DIR") {
        return Ok(dir);
    }
    match kind {
        EntryKind::WindowsScript => Ok(env_dir("APPDATA")?
            .join(Path::new("Microsoft/Windows/Start Menu/Programs/Startup"))),
        EntryKind::LaunchAgent => Ok(env_dir("HOME")?.join("Library/LaunchAgents")),
        EntryKind::Desktop => env_dir("XDG_CONFIG_HOME")
            .or_else(|_| env_dir("HOME").map(|home| home.join(".config")))
            .map(|dir| dir.join("autostart")),
    }
}

/// Adds or removes the entry for the running executable.
pub fn set_enabled(enabled: bool) -> Result<PathBuf, StartupError> {
    let entry = StartupEntry::for_current_exe()?;
    if enabled {
        entry.register()
    } else {
        entry.unregister().map(|_| entry.path())
    }
}
