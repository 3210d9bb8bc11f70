#![forbid(unsafe_code)]

//! Demo driver binary: runs the control surface against the in-memory
//! backend and walks the core interactions, printing state after each step.

use std::sync::Arc;

use hmui_app::app::{AppModel, Msg};
use hmui_app::cli::Opts;
use hmui_app::panels::PanelId;
use hmui_app::service::DemoService;
use hmui_core::{Service, ToggleField};
use hmui_runtime::Runtime;
use hmui_runtime::prefs::{FilePrefs, MemoryPrefs, PrefsBackend};
use tracing_subscriber::EnvFilter;

fn main() {
    let opts = Opts::parse();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let service = Arc::new(DemoService::new());
    let backend: Box<dyn PrefsBackend> = match &opts.prefs_path {
        Some(path) => Box::new(FilePrefs::new(path)),
        None => Box::new(MemoryPrefs::new()),
    };

    let remote: Arc<dyn Service> = service.clone();
    let mut model = match AppModel::new(remote, backend) {
        Ok(model) => model,
        Err(e) => {
            eprintln!("failed to initialize: {e}");
            std::process::exit(1);
        }
    };
    if let Some(lang) = opts.lang {
        model.prefs.set_lang(lang);
    }

    let mut rt = Runtime::new(model);
    rt.init();
    rt.pump_tasks();
    print_status(rt.model());

    // Swipe from Status to Config.
    rt.send(Msg::TouchStart { x: 320.0, y: 200.0 });
    rt.send(Msg::TouchMove { x: 60.0, y: 210.0 });
    rt.fire_all_ticks();
    rt.send(Msg::TouchEnd { width: Some(360.0) });
    let panel = rt.model().active_panel();
    println!("\nswiped to: {}", rt.model().tr(panel.title_key(), "Config"));

    // An invalid module directory blocks the save locally.
    rt.send(Msg::EditModuleDir("relative/path".to_string()));
    rt.send(Msg::SaveConfig);
    rt.pump_tasks();
    print_toast(rt.model());
    println!(
        "remote save_config calls so far: {}",
        service.save_config_calls()
    );

    // Fix the path and save for real.
    rt.send(Msg::EditModuleDir("/data/adb/mods".to_string()));
    rt.send(Msg::SaveConfig);
    rt.pump_tasks();
    print_toast(rt.model());
    println!("config dirty after save: {}", rt.model().config.is_dirty());
    println!(
        "backend moduledir: {}",
        service.stored_config().moduledir
    );

    // Optimistic toggle: visible immediately, persisted asynchronously.
    rt.send(Msg::Toggle(ToggleField::DisableUmount));
    println!(
        "\ndisable_umount (optimistic): {}",
        rt.model().config.store.value().disable_umount
    );
    rt.pump_tasks();
    println!(
        "disable_umount (persisted):  {}",
        service.stored_config().disable_umount
    );

    // Modules: deferred search over the scanned list.
    rt.send(Msg::SelectPanel(PanelId::Modules));
    rt.send(Msg::QueryInput("zyg".to_string()));
    rt.fire_all_ticks();
    let page = rt.model().modules.page();
    println!("\nmodules matching \"zyg\": {}", page.len());
    for module in &page {
        println!("  {} ({})", module.name, module.id);
    }

    // Info panel data.
    rt.send(Msg::SelectPanel(PanelId::Info));
    let languages: Vec<&str> = hmui_app::panels::language_options()
        .iter()
        .map(|l| l.code)
        .collect();
    println!("\nlanguages: {}", languages.join(", "));
    println!("selected: {}", rt.model().prefs.lang());

    // Let remaining toast timers expire.
    rt.fire_all_ticks();
}

fn print_status(model: &AppModel) {
    let status = &model.status;
    let modules = model.modules.store.value();
    println!(
        "{} {} · kernel {} · SELinux {}",
        status.device.model, status.device.android, status.device.kernel, status.device.selinux
    );
    if let Some(kind) = status.storage_kind() {
        println!("backend: {kind} ({})", status.version.version);
    }
    let stats = status.mode_stats(&modules);
    println!(
        "modules: {} mounted of {} ({} overlay, {} magic)",
        status.mounted_count(&modules),
        modules.len(),
        stats.auto,
        stats.magic
    );
    let modes: Vec<String> = model
        .available_modes()
        .iter()
        .map(ToString::to_string)
        .collect();
    println!("selectable modes: {}", modes.join(", "));
    let config = model.config.store.value();
    println!("partitions: {}", status.partitions(&config).join(", "));
}

fn print_toast(model: &AppModel) {
    if let Some(toast) = model.toasts.visible() {
        println!("toast[{:?}]: {}", toast.kind, toast.text);
    }
}
