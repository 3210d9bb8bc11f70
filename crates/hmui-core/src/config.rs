#![forbid(unsafe_code)]

//! Backend configuration model.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Default module directory on device.
pub const DEFAULT_MODULE_DIR: &str = "/data/adb/modules";

/// Default global mount source namespace.
pub const DEFAULT_MOUNT_SOURCE: &str = "KSU";

/// Backing storage strategy for the overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverlayMode {
    /// RAM-backed. Fastest I/O, reset on reboot.
    #[default]
    Tmpfs,
    /// Loopback image. Persistent, saves RAM.
    Ext4,
    /// Read-only compressed. High performance, space saving.
    Erofs,
}

impl OverlayMode {
    /// All modes, in display order.
    pub const ALL: [OverlayMode; 3] = [OverlayMode::Tmpfs, OverlayMode::Ext4, OverlayMode::Erofs];

    /// Lowercase wire name for this mode.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            OverlayMode::Tmpfs => "tmpfs",
            OverlayMode::Ext4 => "ext4",
            OverlayMode::Erofs => "erofs",
        }
    }
}

impl fmt::Display for OverlayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Editable backend configuration.
///
/// This is the value round-tripped through the remote service. The client
/// edits a local copy, tracks its dirtiness against the last loaded
/// baseline, and persists the whole object with `save_config`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directory where modules are stored. Must be rooted at `/`.
    pub moduledir: String,
    /// Global mount source namespace (e.g. `KSU`).
    pub mountsource: String,
    /// Extra partitions to mount, beyond the built-in set.
    #[serde(default)]
    pub partitions: Vec<String>,
    /// Backing storage strategy.
    #[serde(default)]
    pub overlay_mode: OverlayMode,
    /// Skip unmounting overlays for denylisted processes.
    #[serde(default)]
    pub disable_umount: bool,
    /// Opt-in to coexist with an external denylist enforcer.
    #[serde(default)]
    pub allow_umount_coexistence: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            moduledir: DEFAULT_MODULE_DIR.to_string(),
            mountsource: DEFAULT_MOUNT_SOURCE.to_string(),
            partitions: Vec::new(),
            overlay_mode: OverlayMode::default(),
            disable_umount: false,
            allow_umount_coexistence: false,
        }
    }
}

/// Boolean configuration fields reachable through the optimistic toggle path.
///
/// Toggles write the new value into the store immediately and persist the
/// whole config asynchronously; on failure the rollback decision needs to
/// re-read exactly this field, so the field identity travels with the
/// in-flight write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleField {
    DisableUmount,
    AllowUmountCoexistence,
}

impl ToggleField {
    /// Stable key for logging.
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            ToggleField::DisableUmount => "disable_umount",
            ToggleField::AllowUmountCoexistence => "allow_umount_coexistence",
        }
    }

    /// Read this field from a config.
    #[must_use]
    pub fn get(self, config: &AppConfig) -> bool {
        match self {
            ToggleField::DisableUmount => config.disable_umount,
            ToggleField::AllowUmountCoexistence => config.allow_umount_coexistence,
        }
    }

    /// Write this field into a config.
    pub fn set(self, config: &mut AppConfig, value: bool) {
        match self {
            ToggleField::DisableUmount => config.disable_umount = value,
            ToggleField::AllowUmountCoexistence => config.allow_umount_coexistence = value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_points_at_modules_dir() {
        let config = AppConfig::default();
        assert_eq!(config.moduledir, "/data/adb/modules");
        assert!(!config.disable_umount);
    }

    #[test]
    fn overlay_mode_serializes_lowercase() {
        let json = serde_json::to_string(&OverlayMode::Erofs).unwrap();
        assert_eq!(json, "\"erofs\"");
    }

    #[test]
    fn missing_optional_fields_deserialize_to_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{"moduledir":"/data/adb/mods","mountsource":"KSU"}"#).unwrap();
        assert_eq!(config.overlay_mode, OverlayMode::Tmpfs);
        assert!(config.partitions.is_empty());
    }

    #[test]
    fn toggle_field_roundtrip() {
        let mut config = AppConfig::default();
        ToggleField::DisableUmount.set(&mut config, true);
        assert!(ToggleField::DisableUmount.get(&config));
        assert!(!ToggleField::AllowUmountCoexistence.get(&config));
    }
}
