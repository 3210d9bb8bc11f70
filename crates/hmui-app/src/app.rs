#![forbid(unsafe_code)]

//! Top-level application model and message routing.
//!
//! [`AppModel`] owns the panel sub-models, the swipe controller, the toast
//! slot, preferences, and the locale catalog, and routes every message
//! through one `update`. Remote calls leave as task commands carrying an
//! `Arc` of the service; their results come back as messages, so all state
//! mutation happens on the update path.

use std::sync::Arc;
use std::time::Duration;

use hmui_core::policy;
use hmui_core::{
    AppConfig, ControlError, ModeFilter, Module, MountMode, OverlayMode, Service, ServiceResult,
    ToggleField,
};
use hmui_runtime::prefs::PrefsBackend;
use hmui_runtime::{
    Catalog, Cmd, Model, MoveAction, Prefs, SwipeNav, SwipeOutcome, TOAST_DURATION, ToastId,
    ToastKind, ToastSlot,
};
use hmui_sync::mutation;
use hmui_sync::store::SyncError;
use tracing::{debug, info, warn};

use crate::panels::{
    ConfigPanel, ModulesPanel, PANELS, PanelId, StatusBundle, StatusPanel,
};

/// One offset recomputation per frame at most.
const FRAME_INTERVAL: Duration = Duration::from_millis(16);

const LOCALE_EN_US: &str = include_str!("../locales/en-US.json");
const LOCALE_ZH_CN: &str = include_str!("../locales/zh-CN.json");

/// Every input the application responds to.
pub enum Msg {
    // Gesture navigation.
    TouchStart { x: f64, y: f64 },
    TouchMove { x: f64, y: f64 },
    TouchEnd { width: Option<f64> },
    TouchCancel,
    SwipeFrame,
    SelectPanel(PanelId),

    // Status panel.
    ReloadStatus,
    StatusLoaded(ServiceResult<StatusBundle>),
    Reboot,
    Rebooted(ServiceResult<()>),

    // Config panel.
    ReloadConfig,
    ConfigLoaded {
        result: ServiceResult<AppConfig>,
        forced: bool,
    },
    EditModuleDir(String),
    EditMountSource(String),
    SetPartitions(Vec<String>),
    SetOverlayMode(OverlayMode),
    SaveConfig,
    ConfigSaved(ServiceResult<()>),
    ResetConfig,
    ConfigReset(ServiceResult<()>),
    Toggle(ToggleField),
    ToggleSaved {
        field: ToggleField,
        previous: bool,
        attempted: bool,
        result: ServiceResult<()>,
    },

    // Modules panel.
    ReloadModules,
    ModulesLoaded {
        result: ServiceResult<Vec<Module>>,
        forced: bool,
    },
    QueryInput(String),
    SettleQuery,
    SetModeFilter(ModeFilter),
    ToggleShowUnmounted,
    EndSentinelVisible,
    ToggleExpand(String),
    SetDefaultMode { id: String, mode: MountMode },
    SetPathRule {
        id: String,
        path: String,
        mode: Option<MountMode>,
    },
    SaveRules,
    RulesSaved(ServiceResult<usize>),

    // UI chrome.
    ToastExpired(ToastId),
    SetLang(String),
    ToggleBottomNavPin,
    Quit,
}

/// The assembled control surface.
pub struct AppModel {
    service: Arc<dyn Service>,
    pub nav: SwipeNav,
    pub toasts: ToastSlot,
    pub prefs: Prefs,
    pub catalog: Catalog,
    pub status: StatusPanel,
    pub config: ConfigPanel,
    pub modules: ModulesPanel,
}

impl AppModel {
    pub fn new(
        service: Arc<dyn Service>,
        prefs_backend: Box<dyn PrefsBackend>,
    ) -> Result<Self, SyncError> {
        let mut catalog = Catalog::new();
        for (code, src) in [("en-US", LOCALE_EN_US), ("zh-CN", LOCALE_ZH_CN)] {
            if let Err(e) = catalog.insert_json(code, src) {
                warn!(lang = code, error = %e, "skipping malformed locale table");
            }
        }
        Ok(Self {
            service,
            nav: SwipeNav::new(PANELS.len()),
            toasts: ToastSlot::new(),
            prefs: Prefs::load(prefs_backend),
            catalog,
            status: StatusPanel::default(),
            config: ConfigPanel::new()?,
            modules: ModulesPanel::new()?,
        })
    }

    /// The panel the swipe track currently rests on.
    #[must_use]
    pub fn active_panel(&self) -> PanelId {
        PanelId::from_index(self.nav.active())
    }

    /// Localized text for `key` in the selected language.
    #[must_use]
    pub fn tr(&self, key: &str, default: &str) -> String {
        self.catalog.text(self.prefs.lang(), key, default).to_string()
    }

    /// Overlay modes the mode selector offers, derived from the latest
    /// status reports.
    #[must_use]
    pub fn available_modes(&self) -> Vec<OverlayMode> {
        hmui_core::status::available_overlay_modes(&self.status.storage, &self.status.system)
    }

    fn toast_key(&mut self, kind: ToastKind, key: &str, default: &str) -> Cmd<Msg> {
        let text = self.tr(key, default);
        self.toast_text(kind, text)
    }

    fn toast_text(&mut self, kind: ToastKind, text: String) -> Cmd<Msg> {
        let id = self.toasts.show(text, kind);
        Cmd::tick(TOAST_DURATION, move || Msg::ToastExpired(id))
    }

    /// Log a classified failure and raise its toast. Every non-fatal
    /// failure path ends here; stores already hold last-known-good state.
    fn surface(&mut self, error: ControlError, key: &str, default: &str) -> Cmd<Msg> {
        warn!(error = %error, "surfacing failure");
        self.toast_key(ToastKind::Error, key, default)
    }

    fn surface_text(&mut self, error: ControlError, text: String) -> Cmd<Msg> {
        warn!(error = %error, "surfacing failure");
        self.toast_text(ToastKind::Error, text)
    }

    fn load_status(&mut self) -> Cmd<Msg> {
        self.status.loading = true;
        let svc = Arc::clone(&self.service);
        Cmd::task(move || {
            let bundle: ServiceResult<StatusBundle> = (|| {
                Ok(StatusBundle {
                    device: svc.device_status()?,
                    version: svc.version()?,
                    storage: svc.storage_usage()?,
                    system: svc.system_info()?,
                })
            })();
            Msg::StatusLoaded(bundle)
        })
    }

    fn load_config(&mut self, forced: bool) -> Cmd<Msg> {
        self.config.store.set_loading(true);
        let svc = Arc::clone(&self.service);
        Cmd::task(move || Msg::ConfigLoaded {
            result: svc.load_config(),
            forced,
        })
    }

    fn load_modules(&mut self, forced: bool) -> Cmd<Msg> {
        self.modules.store.set_loading(true);
        let svc = Arc::clone(&self.service);
        Cmd::task(move || Msg::ModulesLoaded {
            result: svc.scan_modules(),
            forced,
        })
    }

    /// Re-evaluate the guarded unmount invariant.
    ///
    /// Runs whenever either input (system info, config) may have changed:
    /// while enforcement is active and coexistence is not opted in,
    /// `disable_umount` is forced on locally.
    fn apply_umount_policy(&mut self) {
        let config = self.config.store.snapshot();
        if policy::forced_disable_umount(&self.status.system, &config) {
            debug!("enforcement active without coexistence, forcing disable_umount on");
            self.config.edit(|c| c.disable_umount = true);
        }
    }
}

impl Model for AppModel {
    type Message = Msg;

    fn init(&mut self) -> Cmd<Msg> {
        info!(lang = self.prefs.lang(), "control surface starting");
        let status = self.load_status();
        let config = self.load_config(false);
        let modules = self.load_modules(false);
        Cmd::batch(vec![status, config, modules])
    }

    fn update(&mut self, msg: Msg) -> Cmd<Msg> {
        match msg {
            // ---- gesture navigation -------------------------------------
            Msg::TouchStart { x, y } => {
                self.nav.on_start(x, y);
                Cmd::none()
            }
            Msg::TouchMove { x, y } => match self.nav.on_move(x, y) {
                MoveAction::Scheduled => Cmd::tick(FRAME_INTERVAL, || Msg::SwipeFrame),
                MoveAction::Coalesced | MoveAction::Ignored => Cmd::none(),
            },
            Msg::SwipeFrame => {
                self.nav.on_frame();
                Cmd::none()
            }
            Msg::TouchEnd { width } => {
                if let SwipeOutcome::Committed(index) = self.nav.on_end(width) {
                    debug!(panel = ?PanelId::from_index(index), "swipe committed");
                }
                Cmd::none()
            }
            Msg::TouchCancel => {
                self.nav.on_cancel();
                Cmd::none()
            }
            Msg::SelectPanel(panel) => {
                self.nav.set_active(panel.index());
                Cmd::none()
            }

            // ---- status panel -------------------------------------------
            Msg::ReloadStatus => self.load_status(),
            Msg::StatusLoaded(result) => {
                self.status.loading = false;
                match result {
                    Ok(bundle) => {
                        self.status.absorb(bundle);
                        self.apply_umount_policy();
                    }
                    Err(e) => {
                        // Silent on the surface, like the rest of the
                        // dashboard: prior values stay up.
                        let err = ControlError::Load(e);
                        warn!(error = %err, "status load failed");
                    }
                }
                Cmd::none()
            }
            Msg::Reboot => {
                let svc = Arc::clone(&self.service);
                Cmd::task(move || Msg::Rebooted(svc.reboot()))
            }
            Msg::Rebooted(result) => match result {
                Ok(()) => {
                    info!("reboot requested");
                    Cmd::none()
                }
                Err(e) => {
                    let text = e.message().to_string();
                    self.surface_text(ControlError::Save(e), text)
                }
            },

            // ---- config panel -------------------------------------------
            Msg::ReloadConfig => self.load_config(true),
            Msg::ConfigLoaded { result, forced } => {
                self.config.store.set_loading(false);
                match result {
                    Ok(config) => {
                        let pre_load = self.config.store.doc();
                        if let Err(e) = self.config.store.replace(config) {
                            warn!(error = %e, "config commit failed");
                            return Cmd::none();
                        }
                        let loaded = self.config.store.doc();
                        if forced {
                            self.config.baseline.rebaseline(&loaded);
                        } else {
                            self.config.baseline.capture_if_unedited(&pre_load, &loaded);
                        }
                        self.apply_umount_policy();
                        Cmd::none()
                    }
                    Err(e) => self.surface(
                        ControlError::Load(e),
                        "config.loadError",
                        "Failed to load config",
                    ),
                }
            }
            Msg::EditModuleDir(dir) => {
                self.config.edit(|c| c.moduledir = dir);
                Cmd::none()
            }
            Msg::EditMountSource(source) => {
                self.config.edit(|c| c.mountsource = source);
                Cmd::none()
            }
            Msg::SetPartitions(partitions) => {
                self.config.edit(|c| c.partitions = partitions);
                Cmd::none()
            }
            Msg::SetOverlayMode(mode) => {
                self.config.edit(|c| c.overlay_mode = mode);
                Cmd::none()
            }
            Msg::SaveConfig => {
                let config = self.config.store.snapshot();
                if let Err(e) = policy::validate_config(&config) {
                    // Blocked before any remote round-trip.
                    return self.surface(e, "config.invalidPath", "Invalid path");
                }
                self.config.saving = true;
                let svc = Arc::clone(&self.service);
                Cmd::task(move || Msg::ConfigSaved(svc.save_config(&config)))
            }
            Msg::ConfigSaved(result) => {
                self.config.saving = false;
                match result {
                    Ok(()) => {
                        let doc = self.config.store.doc();
                        self.config.baseline.rebaseline(&doc);
                        self.toast_key(ToastKind::Success, "common.saved", "Saved")
                    }
                    Err(e) => self.surface(
                        ControlError::Save(e),
                        "config.saveFailed",
                        "Failed to save config",
                    ),
                }
            }
            Msg::ResetConfig => {
                self.config.saving = true;
                let svc = Arc::clone(&self.service);
                Cmd::task(move || Msg::ConfigReset(svc.reset_config()))
            }
            Msg::ConfigReset(result) => {
                self.config.saving = false;
                match result {
                    Ok(()) => {
                        let reload = self.load_config(true);
                        let toast = self.toast_key(
                            ToastKind::Success,
                            "config.resetSuccess",
                            "Config reset to defaults",
                        );
                        Cmd::batch(vec![reload, toast])
                    }
                    Err(e) => self.surface(
                        ControlError::Save(e),
                        "config.resetFailed",
                        "Failed to reset config",
                    ),
                }
            }
            Msg::Toggle(field) => {
                let config = self.config.store.snapshot();
                if field == ToggleField::DisableUmount
                    && policy::umount_locked(&self.status.system, &config)
                {
                    // Rejected by a standing invariant; remote call never
                    // issued.
                    let violation = ControlError::Policy(format!(
                        "{} is pinned while enforcement is active",
                        field.key()
                    ));
                    return self.surface(
                        violation,
                        "config.coexistenceRequired",
                        "Coexistence required",
                    );
                }
                let previous = field.get(&config);
                let attempted = !previous;
                self.config.edit(|c| field.set(c, attempted));
                self.apply_umount_policy();
                let snapshot = self.config.store.snapshot();
                let svc = Arc::clone(&self.service);
                Cmd::task(move || Msg::ToggleSaved {
                    field,
                    previous,
                    attempted,
                    result: svc.save_config(&snapshot),
                })
            }
            Msg::ToggleSaved {
                field,
                previous,
                attempted,
                result,
            } => match result {
                Ok(()) => Cmd::none(),
                Err(e) => {
                    let current = field.get(&self.config.store.value());
                    if let Some(revert) =
                        mutation::resolve_failed_write(&current, &attempted, &previous)
                    {
                        debug!(field = field.key(), "rolling back optimistic toggle");
                        self.config.edit(|c| field.set(c, revert));
                    }
                    self.surface(
                        ControlError::Save(e),
                        "config.saveFailed",
                        "Failed to update setting",
                    )
                }
            },

            // ---- modules panel ------------------------------------------
            Msg::ReloadModules => self.load_modules(true),
            Msg::ModulesLoaded { result, forced } => {
                self.modules.store.set_loading(false);
                match result {
                    Ok(list) => {
                        let pre_load = self.modules.rules_by_id();
                        if let Err(e) = self.modules.store.replace(list) {
                            warn!(error = %e, "module list commit failed");
                            return Cmd::none();
                        }
                        let loaded = self.modules.rules_by_id();
                        if forced {
                            self.modules.baselines.rebaseline(&loaded);
                        } else {
                            self.modules.baselines.capture_if_unedited(&pre_load, &loaded);
                        }
                        Cmd::none()
                    }
                    Err(e) => self.surface(
                        ControlError::Load(e),
                        "modules.scanError",
                        "Failed to load modules",
                    ),
                }
            }
            Msg::QueryInput(text) => {
                self.modules.window.reset();
                if self.modules.stage_query(text) {
                    Cmd::tick(Duration::ZERO, || Msg::SettleQuery)
                } else {
                    Cmd::none()
                }
            }
            Msg::SettleQuery => {
                self.modules.settle_query();
                Cmd::none()
            }
            Msg::SetModeFilter(filter) => {
                self.modules.mode_filter = filter;
                self.modules.window.reset();
                Cmd::none()
            }
            Msg::ToggleShowUnmounted => {
                self.modules.show_unmounted = !self.modules.show_unmounted;
                self.modules.window.reset();
                Cmd::none()
            }
            Msg::EndSentinelVisible => {
                self.modules.window.grow();
                Cmd::none()
            }
            Msg::ToggleExpand(id) => {
                self.modules.toggle_expand(&id);
                Cmd::none()
            }
            Msg::SetDefaultMode { id, mode } => {
                self.modules.edit_module(&id, |m| m.rules.default_mode = mode);
                Cmd::none()
            }
            Msg::SetPathRule { id, path, mode } => {
                self.modules.edit_module(&id, |m| match mode {
                    Some(mode) => {
                        m.rules.paths.insert(path, mode);
                    }
                    None => {
                        m.rules.paths.remove(&path);
                    }
                });
                Cmd::none()
            }
            Msg::SaveRules => {
                let dirty = self.modules.dirty_records();
                if dirty.is_empty() {
                    return Cmd::none();
                }
                self.modules.saving = true;
                let svc = Arc::clone(&self.service);
                Cmd::task(move || {
                    let result = mutation::write_each(dirty, |(id, rules)| {
                        svc.save_module_rules(id, rules)
                    });
                    Msg::RulesSaved(match result {
                        Ok(written) => Ok(written),
                        Err(abort) => {
                            warn!(written = abort.written, "rule batch aborted");
                            Err(abort.error)
                        }
                    })
                })
            }
            Msg::RulesSaved(result) => {
                self.modules.saving = false;
                match result {
                    Ok(written) => {
                        info!(written, "module rules saved");
                        let reload = self.load_modules(true);
                        let toast = self.toast_key(
                            ToastKind::Success,
                            "modules.saveSuccess",
                            "Saved successfully",
                        );
                        Cmd::batch(vec![reload, toast])
                    }
                    Err(e) => {
                        // No reload here: it would clobber the unwritten
                        // edits. Written records stay written; everything
                        // still dirty is rewritten on the next save.
                        let text = if e.message().is_empty() {
                            self.tr("modules.saveFailed", "Failed to save")
                        } else {
                            e.message().to_string()
                        };
                        self.surface_text(ControlError::Save(e), text)
                    }
                }
            }

            // ---- UI chrome ----------------------------------------------
            Msg::ToastExpired(id) => {
                self.toasts.dismiss(id);
                Cmd::none()
            }
            Msg::SetLang(code) => {
                if !self.catalog.has(&code) {
                    debug!(lang = %code, "no locale table, falling back to en-US");
                }
                self.prefs.set_lang(code);
                Cmd::none()
            }
            Msg::ToggleBottomNavPin => {
                let pinned = !self.prefs.bottom_nav_pinned();
                self.prefs.set_bottom_nav_pinned(pinned);
                let (key, default) = if pinned {
                    ("config.fixBottomNavOn", "Bottom Nav Fix Enabled")
                } else {
                    ("config.fixBottomNavOff", "Bottom Nav Fix Disabled")
                };
                self.toast_key(ToastKind::Info, key, default)
            }
            Msg::Quit => Cmd::quit(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::DemoService;
    use hmui_runtime::{MemoryPrefs, Runtime};

    fn runtime() -> Runtime<AppModel> {
        let service = Arc::new(DemoService::new());
        runtime_with(service)
    }

    fn runtime_with(service: Arc<DemoService>) -> Runtime<AppModel> {
        let model = AppModel::new(service, Box::new(MemoryPrefs::new())).unwrap();
        let mut rt = Runtime::new(model);
        rt.init();
        rt.pump_tasks();
        rt
    }

    #[test]
    fn init_loads_all_three_panels() {
        let rt = runtime();
        assert!(!rt.model().config.store.loading());
        assert!(!rt.model().modules.store.loading());
        assert!(!rt.model().status.loading);
        assert!(!rt.model().modules.store.value().is_empty());
        assert!(!rt.model().config.is_dirty());
    }

    #[test]
    fn swipe_messages_drive_panel_navigation() {
        let mut rt = runtime();
        rt.send(Msg::TouchStart { x: 200.0, y: 100.0 });
        rt.send(Msg::TouchMove { x: 50.0, y: 110.0 });
        rt.fire_all_ticks();
        rt.send(Msg::TouchEnd { width: Some(300.0) });
        assert_eq!(rt.model().active_panel(), PanelId::Config);
    }

    #[test]
    fn toast_expiry_is_token_guarded_through_the_runtime() {
        let mut rt = runtime();
        rt.send(Msg::ToggleBottomNavPin);
        rt.send(Msg::ToggleBottomNavPin);
        // Two toasts queued two expiry ticks; the first is stale.
        assert_eq!(rt.pending_ticks(), 2);
        rt.fire_all_ticks();
        assert!(rt.model().toasts.visible().is_none());
    }

    #[test]
    fn language_switch_persists_and_localizes() {
        let mut rt = runtime();
        rt.send(Msg::SetLang("zh-CN".to_string()));
        assert_eq!(rt.model().prefs.lang(), "zh-CN");
        assert_eq!(rt.model().tr("common.saved", "Saved"), "已保存");
        // Keys missing from the zh table fall back to English.
        assert_eq!(
            rt.model().tr("modules.saveSuccess", "Saved successfully"),
            "Saved successfully"
        );
    }

    #[test]
    fn query_input_resets_window_and_settles_on_idle() {
        let mut rt = runtime();
        rt.send(Msg::EndSentinelVisible);
        assert_eq!(rt.model().modules.window.visible(), 40);
        rt.send(Msg::QueryInput("zyg".to_string()));
        assert_eq!(rt.model().modules.window.visible(), 20);
        assert_eq!(rt.model().modules.settled_query(), "");
        rt.fire_all_ticks();
        assert_eq!(rt.model().modules.settled_query(), "zyg");
    }

    #[test]
    fn newer_query_supersedes_pending_settle() {
        let mut rt = runtime();
        rt.send(Msg::QueryInput("a".to_string()));
        rt.send(Msg::QueryInput("ab".to_string()));
        // One settle tick outstanding, carrying the newest text.
        assert_eq!(rt.pending_ticks(), 1);
        rt.fire_all_ticks();
        assert_eq!(rt.model().modules.settled_query(), "ab");
    }
}
