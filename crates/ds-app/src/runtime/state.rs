use ds_core::app::App;
use ds_core::device::Device;
use ds_core::ids::{AppId, DeviceId};
use ds_core::remote::{RemoteFile, RemotePath};
use ds_core::selection::{FileItem, SelectionSet};

/// Browser state owned by the coordinator.
#[derive(Debug, Clone)]
pub struct BrowserState {
    pub devices: Vec<Device>,
    pub active_device: Option<DeviceId>,
    pub apps: Vec<App>,
    pub active_app: Option<AppId>,
    pub current_path: RemotePath,
    pub files: Vec<RemoteFile>,
    pub last_error: Option<String>,
    /// Bumped whenever the browsing context changes, so listings that were
    /// started for an older context can be recognized and dropped.
    pub(crate) generation: u64,
    /// Bumped only when the active device changes; app lists are checked
    /// against it, so browsing inside the same device keeps them valid.
    pub(crate) device_generation: u64,
}

impl Default for BrowserState {
    fn default() -> Self {
        Self {
            devices: Vec::new(),
            active_device: None,
            apps: Vec::new(),
            active_app: None,
            current_path: RemotePath::documents(),
            files: Vec::new(),
            last_error: None,
            generation: 0,
            device_generation: 0,
        }
    }
}

impl BrowserState {
    pub fn active_app_context(&self) -> Option<(DeviceId, AppId)> {
        Some((self.active_device.clone()?, self.active_app.clone()?))
    }

    pub(crate) fn next_generation(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    /// Drop the active device and everything browsed under it.
    pub(crate) fn clear_active_device(&mut self) {
        self.active_device = None;
        self.device_generation += 1;
        self.clear_active_app();
        self.apps.clear();
    }

    pub(crate) fn clear_active_app(&mut self) {
        self.active_app = None;
        self.files.clear();
        self.current_path = RemotePath::documents();
        self.next_generation();
    }
}

/// Published view of the coordinator state.
#[derive(Debug, Clone)]
pub struct BrowserSnapshot {
    pub devices: Vec<Device>,
    pub active_device: Option<DeviceId>,
    pub apps: Vec<App>,
    pub active_app: Option<AppId>,
    pub current_path: RemotePath,
    pub files: Vec<RemoteFile>,
    pub last_error: Option<String>,
    pub selection: Vec<FileItem>,
    pub selection_version: u64,
}

impl BrowserSnapshot {
    pub fn capture(state: &BrowserState, selection: &SelectionSet) -> Self {
        Self {
            devices: state.devices.clone(),
            active_device: state.active_device.clone(),
            apps: state.apps.clone(),
            active_app: state.active_app.clone(),
            current_path: state.current_path.clone(),
            files: state.files.clone(),
            last_error: state.last_error.clone(),
            selection: selection.snapshot(),
            selection_version: selection.version(),
        }
    }
}
