//! Per-run session state: where screenshots go and what area is captured.
//!
//! Nothing here is persisted; a restart returns to the defaults.

use crate::capture::Region;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

/// Folder text shown when no override is set.
pub const DEFAULT_FOLDER_LABEL: &str = "Desktop/Screenshots (default)";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionConfig {
    /// Overrides the default `~/Desktop/Screenshots` base folder.
    pub base_folder: Option<PathBuf>,
    /// Crop applied to every capture; `None` captures the full display.
    pub region: Option<Region>,
}

impl SessionConfig {
    pub fn area_text(&self) -> String {
        match &self.region {
            None => "full display".to_string(),
            Some(r) => format!("rect {}x{} @ ({},{})", r.width(), r.height(), r.left, r.top),
        }
    }

    /// Panel status line, e.g. `Saving to: /tmp/shots | Area: rect 100x50 @ (10,20)`.
    pub fn status_text(&self) -> String {
        let folder = match &self.base_folder {
            Some(path) => path.display().to_string(),
            None => DEFAULT_FOLDER_LABEL.to_string(),
        };
        format!("Saving to: {} | Area: {}", folder, self.area_text())
    }
}

/// Shared handle to the session, safe to touch from the panel, the tray and
/// the hotkey handler.
///
/// Readers get a cloned snapshot so the folder/region pair is never torn.
#[derive(Debug, Default)]
pub struct Session {
    inner: Mutex<SessionConfig>,
}

impl Session {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            inner: Mutex::new(config),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SessionConfig> {
        // Every write is a single field assignment, so a poisoned guard
        // still holds a consistent value.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn snapshot(&self) -> SessionConfig {
        self.lock().clone()
    }

    pub fn set_base_folder(&self, folder: Option<PathBuf>) {
        self.lock().base_folder = folder;
    }

    pub fn set_region(&self, region: Option<Region>) {
        self.lock().region = region;
    }

    pub fn status_text(&self) -> String {
        self.lock().status_text()
    }
}
