//! End-to-end module flows: per-record dirtiness, batch saves with abort,
//! deferred search, and pagination.

use std::sync::Arc;

use hmui_app::app::{AppModel, Msg};
use hmui_app::service::{DemoService, demo_module};
use hmui_core::{ActiveMode, MountMode, Service};
use hmui_runtime::{MemoryPrefs, Runtime, ToastKind};

fn harness() -> (Arc<DemoService>, Runtime<AppModel>) {
    let service = Arc::new(DemoService::new());
    let remote: Arc<dyn Service> = service.clone();
    let model = AppModel::new(remote, Box::new(MemoryPrefs::new())).unwrap();
    let mut rt = Runtime::new(model);
    rt.init();
    rt.pump_tasks();
    (service, rt)
}

fn set_default_mode(rt: &mut Runtime<AppModel>, id: &str, mode: MountMode) {
    rt.send(Msg::SetDefaultMode {
        id: id.to_string(),
        mode,
    });
}

#[test]
fn loaded_modules_start_clean_and_edits_dirty_exactly_one() {
    let (_service, mut rt) = harness();
    assert!(!rt.model().modules.is_dirty());

    set_default_mode(&mut rt, "font_sans", MountMode::Ignore);
    assert_eq!(rt.model().modules.dirty_ids(), ["font_sans"]);
    assert!(rt.model().modules.is_module_dirty("font_sans"));
    assert!(!rt.model().modules.is_module_dirty("zygisk_lsposed"));
}

#[test]
fn bulk_save_writes_each_dirty_record_then_rebaselines() {
    let (service, mut rt) = harness();
    set_default_mode(&mut rt, "zygisk_lsposed", MountMode::Magic);
    set_default_mode(&mut rt, "font_sans", MountMode::Ignore);

    rt.send(Msg::SaveRules);
    rt.pump_tasks();

    assert_eq!(service.rule_calls(), ["zygisk_lsposed", "font_sans"]);
    assert_eq!(
        service.stored_rules("zygisk_lsposed").unwrap().default_mode,
        MountMode::Magic
    );
    assert_eq!(
        service.stored_rules("font_sans").unwrap().default_mode,
        MountMode::Ignore
    );
    assert!(!rt.model().modules.is_dirty());
    assert_eq!(
        rt.model().toasts.visible().unwrap().text,
        "Saved successfully"
    );
}

#[test]
fn bulk_save_aborts_on_first_failure_with_partial_success() {
    let (service, mut rt) = harness();
    // List order: zygisk_lsposed, playintegrityfix, font_sans, ...
    set_default_mode(&mut rt, "zygisk_lsposed", MountMode::Magic);
    set_default_mode(&mut rt, "playintegrityfix", MountMode::Magic);
    set_default_mode(&mut rt, "font_sans", MountMode::Ignore);
    service.set_fail_rules_for(Some("playintegrityfix"));

    rt.send(Msg::SaveRules);
    rt.pump_tasks();

    // The batch stopped at the failure: the third write was never issued.
    assert_eq!(service.rule_calls(), ["zygisk_lsposed", "playintegrityfix"]);
    // Partial success is real: the first record is persisted.
    assert_eq!(
        service.stored_rules("zygisk_lsposed").unwrap().default_mode,
        MountMode::Magic
    );
    assert_eq!(
        service.stored_rules("font_sans").unwrap().default_mode,
        MountMode::Overlay
    );

    // One error surfaced, with the failing call's message.
    let toast = rt.model().toasts.visible().unwrap();
    assert_eq!(toast.kind, ToastKind::Error);
    assert!(toast.text.contains("playintegrityfix"));

    // Local edits survive the abort and everything stays dirty, so a retry
    // writes all three again (idempotent for the one already saved).
    let model = rt.model();
    assert_eq!(
        model.modules.store.value()[2].rules.default_mode,
        MountMode::Ignore
    );
    let dirty = model.modules.dirty_ids();
    assert_eq!(dirty, ["zygisk_lsposed", "playintegrityfix", "font_sans"]);
    assert!(!model.modules.saving);
}

#[test]
fn save_with_nothing_dirty_is_a_no_op() {
    let (service, mut rt) = harness();
    rt.send(Msg::SaveRules);
    assert_eq!(rt.pending_tasks(), 0);
    rt.pump_tasks();
    assert!(service.rule_calls().is_empty());
}

#[test]
fn scan_failure_keeps_the_prior_list() {
    let (service, mut rt) = harness();
    let before = rt.model().modules.store.value().len();
    assert!(before > 0);

    service.set_fail_scan(true);
    rt.send(Msg::ReloadModules);
    rt.pump_tasks();

    assert_eq!(rt.model().modules.store.value().len(), before);
    assert!(!rt.model().modules.store.loading());
    assert_eq!(
        rt.model().toasts.visible().unwrap().text,
        "Failed to load modules"
    );
}

#[test]
fn deferred_search_matches_name_and_id_case_insensitive() {
    let (_service, mut rt) = harness();

    rt.send(Msg::QueryInput("LSPOSED".to_string()));
    rt.fire_all_ticks();
    let page = rt.model().modules.page();
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].id, "zygisk_lsposed");

    rt.send(Msg::QueryInput("play".to_string()));
    rt.fire_all_ticks();
    let page = rt.model().modules.page();
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].id, "playintegrityfix");
}

#[test]
fn unmounted_modules_hidden_until_toggled() {
    let (_service, mut rt) = harness();
    let visible: Vec<String> = rt.model().modules.page().iter().map(|m| m.id.clone()).collect();
    assert!(!visible.contains(&"busybox_ndk".to_string()));

    rt.send(Msg::ToggleShowUnmounted);
    let visible: Vec<String> = rt.model().modules.page().iter().map(|m| m.id.clone()).collect();
    assert!(visible.contains(&"busybox_ndk".to_string()));
}

#[test]
fn pagination_grows_by_page_and_resets_on_filter_change() {
    let (service, mut rt) = harness();
    let many = (0..50)
        .map(|i| demo_module(&format!("mod{i:02}"), &format!("Module {i:02}"), true, ActiveMode::Auto))
        .collect();
    service.set_modules(many);
    rt.send(Msg::ReloadModules);
    rt.pump_tasks();

    assert_eq!(rt.model().modules.filtered().len(), 50);
    assert_eq!(rt.model().modules.page().len(), 20);

    rt.send(Msg::EndSentinelVisible);
    assert_eq!(rt.model().modules.window.visible(), 40);
    assert_eq!(rt.model().modules.page().len(), 40);

    // Any filter input change snaps the window back to one page.
    rt.send(Msg::ToggleShowUnmounted);
    assert_eq!(rt.model().modules.window.visible(), 20);
    assert_eq!(rt.model().modules.page().len(), 20);
}

#[test]
fn path_rule_edits_travel_with_the_bulk_save() {
    let (service, mut rt) = harness();
    rt.send(Msg::SetPathRule {
        id: "font_sans".to_string(),
        path: "/system/fonts".to_string(),
        mode: Some(MountMode::Magic),
    });
    assert_eq!(rt.model().modules.dirty_ids(), ["font_sans"]);

    rt.send(Msg::SaveRules);
    rt.pump_tasks();

    let rules = service.stored_rules("font_sans").unwrap();
    assert_eq!(rules.paths.get("/system/fonts"), Some(&MountMode::Magic));
    assert!(!rt.model().modules.is_dirty());
}
