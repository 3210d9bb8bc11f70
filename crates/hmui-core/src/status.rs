#![forbid(unsafe_code)]

//! Device, system, and storage status records with display derivations.

use serde::{Deserialize, Serialize};

use crate::config::{AppConfig, OverlayMode};

/// Partitions always shown on the status panel, before any configured extras.
pub const BUILTIN_PARTITIONS: &[&str] = &[
    "system",
    "vendor",
    "product",
    "system_ext",
    "odm",
    "oem",
    "apex",
    "mi_ext",
    "my_product",
    "my_preload",
    "my_stock",
    "optics",
    "prism",
];

fn dash() -> String {
    "-".to_string()
}

/// Basic device identity as reported by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceInfo {
    #[serde(default = "dash")]
    pub model: String,
    #[serde(default = "dash")]
    pub android: String,
    #[serde(default = "dash")]
    pub kernel: String,
    #[serde(default = "dash")]
    pub selinux: String,
}

impl Default for DeviceInfo {
    fn default() -> Self {
        Self {
            model: dash(),
            android: dash(),
            kernel: dash(),
            selinux: dash(),
        }
    }
}

/// Backend daemon version.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct VersionInfo {
    #[serde(default)]
    pub version: String,
}

/// Overlay storage usage snapshot.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StorageStatus {
    /// Active backing storage, `None` before the first mount.
    #[serde(rename = "type", default)]
    pub kind: Option<OverlayMode>,
    /// Modes the storage layer reports as usable on this device.
    #[serde(default)]
    pub supported_modes: Option<Vec<OverlayMode>>,
    #[serde(default)]
    pub used_bytes: Option<u64>,
    #[serde(default)]
    pub total_bytes: Option<u64>,
}

/// Mount environment details.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemInfo {
    #[serde(default = "dash")]
    pub kernel: String,
    #[serde(default = "dash")]
    pub selinux: String,
    #[serde(default = "dash")]
    pub mount_base: String,
    #[serde(default)]
    pub active_mounts: Vec<String>,
    /// Denylist enforcement flag from the external zygisk implementation.
    /// Anything other than empty or `"0"` means enforcement is active.
    #[serde(default)]
    pub zygisksu_enforce: String,
    #[serde(default)]
    pub supported_overlay_modes: Option<Vec<OverlayMode>>,
    #[serde(default)]
    pub tmpfs_xattr_supported: Option<bool>,
}

impl Default for SystemInfo {
    fn default() -> Self {
        Self {
            kernel: dash(),
            selinux: dash(),
            mount_base: dash(),
            active_mounts: Vec::new(),
            zygisksu_enforce: String::new(),
            supported_overlay_modes: None,
            tmpfs_xattr_supported: None,
        }
    }
}

/// Partition list for display: built-ins unioned with configured extras,
/// order-preserving and de-duplicated.
#[must_use]
pub fn display_partitions(config: &AppConfig) -> Vec<String> {
    let mut seen = Vec::with_capacity(BUILTIN_PARTITIONS.len() + config.partitions.len());
    for name in BUILTIN_PARTITIONS
        .iter()
        .copied()
        .chain(config.partitions.iter().map(String::as_str))
    {
        if !seen.iter().any(|s: &String| s == name) {
            seen.push(name.to_string());
        }
    }
    seen
}

/// Overlay modes the user may select.
///
/// The storage layer's report wins; the system info report is the fallback,
/// and all modes are offered when neither reports. `Tmpfs` is removed when
/// the kernel lacks xattr support on tmpfs.
#[must_use]
pub fn available_overlay_modes(storage: &StorageStatus, system: &SystemInfo) -> Vec<OverlayMode> {
    let mut modes = storage
        .supported_modes
        .clone()
        .or_else(|| system.supported_overlay_modes.clone())
        .unwrap_or_else(|| OverlayMode::ALL.to_vec());
    if system.tmpfs_xattr_supported == Some(false) {
        modes.retain(|m| *m != OverlayMode::Tmpfs);
    }
    modes
}
