#![forbid(unsafe_code)]

//! In-memory backend for the demo binary and the integration tests.
//!
//! Holds the same state a real daemon would and answers synchronously.
//! Failure injection flips individual calls into errors so tests can drive
//! every rollback and abort path deterministically.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use hmui_core::config::AppConfig;
use hmui_core::module::{ActiveMode, Module, ModuleRules, MountMode};
use hmui_core::service::{Service, ServiceError, ServiceResult};
use hmui_core::status::{DeviceInfo, StorageStatus, SystemInfo, VersionInfo};
use hmui_core::OverlayMode;

struct DemoState {
    config: AppConfig,
    modules: Vec<Module>,
    device: DeviceInfo,
    version: VersionInfo,
    storage: StorageStatus,
    system: SystemInfo,
}

/// Deterministic in-memory [`Service`].
pub struct DemoService {
    state: Mutex<DemoState>,
    fail_load_config: AtomicBool,
    fail_save_config: AtomicBool,
    fail_scan: AtomicBool,
    fail_rules_for: Mutex<Option<String>>,
    save_config_calls: AtomicUsize,
    rule_calls: Mutex<Vec<String>>,
    reboots: AtomicUsize,
}

fn sample_module(id: &str, name: &str, mounted: bool, mode: ActiveMode) -> Module {
    Module {
        id: id.to_string(),
        name: name.to_string(),
        version: "1.2.0".to_string(),
        description: format!("{name} module"),
        is_mounted: mounted,
        mode,
        rules: ModuleRules::default(),
    }
}

impl DemoService {
    #[must_use]
    pub fn new() -> Self {
        let modules = vec![
            sample_module("zygisk_lsposed", "LSPosed", true, ActiveMode::Auto),
            sample_module("playintegrityfix", "Play Integrity Fix", true, ActiveMode::Auto),
            sample_module("font_sans", "Sans Font Pack", true, ActiveMode::Magic),
            sample_module("systemless_hosts", "Systemless Hosts", true, ActiveMode::Auto),
            sample_module("busybox_ndk", "BusyBox NDK", false, ActiveMode::Auto),
            sample_module("audio_patch", "Audio Patch", false, ActiveMode::Magic),
        ];
        Self {
            state: Mutex::new(DemoState {
                config: AppConfig::default(),
                modules,
                device: DeviceInfo {
                    model: "Pixel 8 Pro".to_string(),
                    android: "15".to_string(),
                    kernel: "6.1.99-android14".to_string(),
                    selinux: "Enforcing".to_string(),
                },
                version: VersionInfo {
                    version: "v2.1.0".to_string(),
                },
                storage: StorageStatus {
                    kind: Some(OverlayMode::Tmpfs),
                    supported_modes: Some(OverlayMode::ALL.to_vec()),
                    used_bytes: Some(48 * 1024 * 1024),
                    total_bytes: Some(512 * 1024 * 1024),
                },
                system: SystemInfo {
                    kernel: "6.1.99-android14".to_string(),
                    selinux: "Enforcing".to_string(),
                    mount_base: "/debug_ramdisk".to_string(),
                    active_mounts: vec!["system".to_string(), "product".to_string()],
                    ..SystemInfo::default()
                },
            }),
            fail_load_config: AtomicBool::new(false),
            fail_save_config: AtomicBool::new(false),
            fail_scan: AtomicBool::new(false),
            fail_rules_for: Mutex::new(None),
            save_config_calls: AtomicUsize::new(0),
            rule_calls: Mutex::new(Vec::new()),
            reboots: AtomicUsize::new(0),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, DemoState> {
        // Lock poisoning cannot outlive a test process in any useful way.
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    // ---- failure injection & inspection --------------------------------

    pub fn set_fail_load_config(&self, fail: bool) {
        self.fail_load_config.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_save_config(&self, fail: bool) {
        self.fail_save_config.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_scan(&self, fail: bool) {
        self.fail_scan.store(fail, Ordering::SeqCst);
    }

    /// Make `save_module_rules` fail for one module id.
    pub fn set_fail_rules_for(&self, id: Option<&str>) {
        if let Ok(mut slot) = self.fail_rules_for.lock() {
            *slot = id.map(str::to_string);
        }
    }

    /// Replace the module inventory.
    pub fn set_modules(&self, modules: Vec<Module>) {
        self.lock().modules = modules;
    }

    /// Override the reported system info.
    pub fn set_system(&self, system: SystemInfo) {
        self.lock().system = system;
    }

    /// How many `save_config` calls were attempted.
    #[must_use]
    pub fn save_config_calls(&self) -> usize {
        self.save_config_calls.load(Ordering::SeqCst)
    }

    /// Module ids `save_module_rules` was called with, in order.
    #[must_use]
    pub fn rule_calls(&self) -> Vec<String> {
        self.rule_calls.lock().map(|v| v.clone()).unwrap_or_default()
    }

    /// The config as the backend currently holds it.
    #[must_use]
    pub fn stored_config(&self) -> AppConfig {
        self.lock().config.clone()
    }

    /// The rules the backend currently holds for a module.
    #[must_use]
    pub fn stored_rules(&self, id: &str) -> Option<ModuleRules> {
        self.lock()
            .modules
            .iter()
            .find(|m| m.id == id)
            .map(|m| m.rules.clone())
    }

    #[must_use]
    pub fn reboot_requests(&self) -> usize {
        self.reboots.load(Ordering::SeqCst)
    }
}

impl Default for DemoService {
    fn default() -> Self {
        Self::new()
    }
}

impl Service for DemoService {
    fn name(&self) -> &str {
        "demo"
    }

    fn load_config(&self) -> ServiceResult<AppConfig> {
        if self.fail_load_config.load(Ordering::SeqCst) {
            return Err(ServiceError::new("config read failed"));
        }
        Ok(self.lock().config.clone())
    }

    fn save_config(&self, config: &AppConfig) -> ServiceResult<()> {
        self.save_config_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_save_config.load(Ordering::SeqCst) {
            return Err(ServiceError::new("config write failed"));
        }
        self.lock().config = config.clone();
        Ok(())
    }

    fn reset_config(&self) -> ServiceResult<()> {
        self.lock().config = AppConfig::default();
        Ok(())
    }

    fn scan_modules(&self) -> ServiceResult<Vec<Module>> {
        if self.fail_scan.load(Ordering::SeqCst) {
            return Err(ServiceError::new("module scan failed"));
        }
        Ok(self.lock().modules.clone())
    }

    fn save_module_rules(&self, id: &str, rules: &ModuleRules) -> ServiceResult<()> {
        if let Ok(mut calls) = self.rule_calls.lock() {
            calls.push(id.to_string());
        }
        let failing = self
            .fail_rules_for
            .lock()
            .ok()
            .and_then(|slot| slot.clone());
        if failing.as_deref() == Some(id) {
            return Err(ServiceError::new(format!("failed to write rules for {id}")));
        }
        let mut state = self.lock();
        if let Some(module) = state.modules.iter_mut().find(|m| m.id == id) {
            module.rules = rules.clone();
            Ok(())
        } else {
            Err(ServiceError::new(format!("unknown module {id}")))
        }
    }

    fn device_status(&self) -> ServiceResult<DeviceInfo> {
        Ok(self.lock().device.clone())
    }

    fn version(&self) -> ServiceResult<VersionInfo> {
        Ok(self.lock().version.clone())
    }

    fn storage_usage(&self) -> ServiceResult<StorageStatus> {
        Ok(self.lock().storage.clone())
    }

    fn system_info(&self) -> ServiceResult<SystemInfo> {
        Ok(self.lock().system.clone())
    }

    fn reboot(&self) -> ServiceResult<()> {
        self.reboots.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Build a minimal module for tests and demos.
#[must_use]
pub fn demo_module(id: &str, name: &str, mounted: bool, mode: ActiveMode) -> Module {
    sample_module(id, name, mounted, mode)
}

/// A rules value differing from the default, for exercising dirtiness.
#[must_use]
pub fn magic_rules() -> ModuleRules {
    ModuleRules {
        default_mode: MountMode::Magic,
        ..ModuleRules::default()
    }
}
