#![forbid(unsafe_code)]

//! Local validation and the guarded unmount invariant.

use crate::config::AppConfig;
use crate::error::ControlError;
use crate::status::SystemInfo;

/// A path field is acceptable when empty or absolute with at least one
/// component. A bare `/` is rejected.
#[must_use]
pub fn is_valid_path(path: &str) -> bool {
    path.is_empty() || (path.starts_with('/') && path.len() > 1)
}

/// Validate a config before any save is issued.
pub fn validate_config(config: &AppConfig) -> Result<(), ControlError> {
    if !is_valid_path(&config.moduledir) {
        return Err(ControlError::Validation(format!(
            "module directory must be an absolute path, got {:?}",
            config.moduledir
        )));
    }
    Ok(())
}

/// Whether the external denylist enforcer is active.
#[must_use]
pub fn umount_enforced(system: &SystemInfo) -> bool {
    !system.zygisksu_enforce.is_empty() && system.zygisksu_enforce != "0"
}

/// Whether `disable_umount` is pinned by the enforcement flag.
///
/// Active enforcement without the coexistence opt-in locks the field:
/// it is forced on and may not be toggled off.
#[must_use]
pub fn umount_locked(system: &SystemInfo, config: &AppConfig) -> bool {
    umount_enforced(system) && !config.allow_umount_coexistence
}

/// Whether the reactive invariant pass must force `disable_umount` on.
///
/// Evaluated whenever either input changes, not only at initial load.
#[must_use]
pub fn forced_disable_umount(system: &SystemInfo, config: &AppConfig) -> bool {
    umount_locked(system, config) && !config.disable_umount
}
