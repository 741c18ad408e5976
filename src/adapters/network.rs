//! Network presence check.

use std::path::PathBuf;

/// Reports whether the device has any network link besides loopback.
pub trait NetworkPresence: Send + Sync {
    fn is_online(&self) -> bool;
}

/// [`NetworkPresence`] that lists interface entries under a sysfs directory.
///
/// Any entry other than `lo` counts as a network link. An unreadable
/// directory reports offline.
#[derive(Debug, Clone)]
pub struct SysfsInterfaces {
    root: PathBuf,
}

impl SysfsInterfaces {
    /// Reads `/sys/class/net`.
    pub fn new() -> Self {
        Self::at("/sys/class/net")
    }

    /// Reads interface entries from `root`.
    pub fn at(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl Default for SysfsInterfaces {
    fn default() -> Self {
        Self::new()
    }
}

impl NetworkPresence for SysfsInterfaces {
    fn is_online(&self) -> bool {
        let Ok(entries) = std::fs::read_dir(&self.root) else {
            tracing::debug!(root = %self.root.display(), "interface directory unreadable");
            return false;
        };
        entries
            .filter_map(Result::ok)
            .any(|entry| entry.file_name() != "lo")
    }
}
