#![forbid(unsafe_code)]

//! Status panel: device, version, storage, and mount environment.

use hmui_core::status::{DeviceInfo, StorageStatus, SystemInfo, VersionInfo, display_partitions};
use hmui_core::{AppConfig, Module, OverlayMode, module};

/// One load pass worth of status data.
///
/// The four records are fetched in a single task; any failure aborts the
/// pass and every record keeps its prior value.
#[derive(Debug, Clone, Default)]
pub struct StatusBundle {
    pub device: DeviceInfo,
    pub version: VersionInfo,
    pub storage: StorageStatus,
    pub system: SystemInfo,
}

/// Plain last-known-good status state. Not a reconciling store: nothing
/// here is edited or tracked for dirtiness, it is display data only.
#[derive(Debug, Default)]
pub struct StatusPanel {
    pub device: DeviceInfo,
    pub version: VersionInfo,
    pub storage: StorageStatus,
    pub system: SystemInfo,
    pub loading: bool,
}

impl StatusPanel {
    pub fn absorb(&mut self, bundle: StatusBundle) {
        self.device = bundle.device;
        self.version = bundle.version;
        self.storage = bundle.storage;
        self.system = bundle.system;
    }

    /// Active backing storage, if the backend has mounted anything yet.
    #[must_use]
    pub fn storage_kind(&self) -> Option<OverlayMode> {
        self.storage.kind
    }

    /// Mounted module count for the dashboard card.
    #[must_use]
    pub fn mounted_count(&self, modules: &[Module]) -> usize {
        modules.iter().filter(|m| m.is_mounted).count()
    }

    /// Per-mode counts for the dashboard card.
    #[must_use]
    pub fn mode_stats(&self, modules: &[Module]) -> module::ModeStats {
        module::mode_stats(modules)
    }

    /// Partition chips: built-ins plus configured extras.
    #[must_use]
    pub fn partitions(&self, config: &AppConfig) -> Vec<String> {
        display_partitions(config)
    }
}
