//! MuteStore - persistent per-category deduplication flags.
//!
//! Each category is backed by a single file whose entire content is "0" or
//! "1". Reads fail open: absent files, unreadable files, and garbage content
//! all report UNMUTED, so a corrupted flag can never permanently silence
//! alerting. Flags are never deleted automatically; clearing a stuck mute is
//! a deliberate external action.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MuteState {
    Muted,
    Unmuted,
}

pub trait MuteStore {
    /// Pure read; never mutates the stored state.
    fn status(&self, category: &str) -> MuteState;
    fn mute(&self, category: &str);
    fn unmute(&self, category: &str);
}

/// Stable identifier for a device, usable in category keys and filenames.
pub fn device_id(device: &str) -> String {
    let name = Path::new(device)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| device.to_string());
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect()
}

pub fn alert_category(device_id: &str) -> String {
    format!("alert:{}", device_id)
}

pub fn reboot_category(device_id: &str) -> String {
    format!("reboot:{}", device_id)
}

/// File-backed store, one flag file per category.
pub struct FileMuteStore {
    dir: PathBuf,
}

impl FileMuteStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn flag_path(&self, category: &str) -> PathBuf {
        // Category keys use ':' which is fine on unix filesystems, but keep
        // filenames portable anyway.
        let name: String = category
            .chars()
            .map(|c| if c == ':' { '.' } else { c })
            .collect();
        self.dir.join(format!("{}.mute", name))
    }

    /// Lazily create the backing flag with no asserted state.
    fn ensure(&self, path: &Path) {
        if path.exists() {
            return;
        }
        let created = fs::create_dir_all(&self.dir)
            .and_then(|_| fs::OpenOptions::new().append(true).create(true).open(path).map(|_| ()));
        if let Err(e) = created {
            error!("Unable to instantiate mute file {}: {}", path.display(), e);
        }
    }
}

impl MuteStore for FileMuteStore {
    fn status(&self, category: &str) -> MuteState {
        let path = self.flag_path(category);
        self.ensure(&path);
        let content = match fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) => {
                error!(
                    "Unable to read mute file {}: {} - defaulting to UNMUTED",
                    path.display(),
                    e
                );
                return MuteState::Unmuted;
            }
        };
        debug!("{} content: {:?}", path.display(), content);
        match content.as_str() {
            "1" => MuteState::Muted,
            "0" => MuteState::Unmuted,
            // No content means no asserted state.
            "" => MuteState::Unmuted,
            other => {
                warn!(
                    "Mute file {} gave unexpected content {:?} - defaulting to UNMUTED",
                    path.display(),
                    other
                );
                MuteState::Unmuted
            }
        }
    }

    fn mute(&self, category: &str) {
        let path = self.flag_path(category);
        self.ensure(&path);
        if let Err(e) = fs::write(&path, "1") {
            error!("Unable to write mute file {}: {}", path.display(), e);
        }
    }

    fn unmute(&self, category: &str) {
        let path = self.flag_path(category);
        self.ensure(&path);
        if let Err(e) = fs::write(&path, "0") {
            error!("Unable to write mute file {}: {}", path.display(), e);
        }
    }
}

/// In-memory store for tests.
#[derive(Default)]
pub struct MemoryMuteStore {
    flags: RefCell<HashMap<String, MuteState>>,
}

impl MemoryMuteStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MuteStore for MemoryMuteStore {
    fn status(&self, category: &str) -> MuteState {
        self.flags
            .borrow()
            .get(category)
            .copied()
            .unwrap_or(MuteState::Unmuted)
    }

    fn mute(&self, category: &str) {
        self.flags
            .borrow_mut()
            .insert(category.to_string(), MuteState::Muted);
    }

    fn unmute(&self, category: &str) {
        self.flags
            .borrow_mut()
            .insert(category.to_string(), MuteState::Unmuted);
    }
}
