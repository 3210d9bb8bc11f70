#![forbid(unsafe_code)]

//! Modules panel: the module list over a reconciling store with per-record
//! baselines, deferred search, and an incremental pagination window.

use std::collections::HashMap;
use std::sync::Arc;

use hmui_core::{ModeFilter, Module, ModuleQuery, ModuleRules};
use hmui_runtime::{Deferred, PageWindow};
use hmui_sync::store::SyncError;
use hmui_sync::{KeyedBaseline, Store, Value};
use tracing::error;

/// Records shown per page increment.
pub const PAGE_SIZE: usize = 20;

/// Modules panel state.
pub struct ModulesPanel {
    pub store: Store<Vec<Module>>,
    pub baselines: KeyedBaseline,
    /// Search text as typed; always current so the input stays responsive.
    pub query: String,
    /// Search text as filtered on; settles on the next idle tick.
    deferred: Deferred<String>,
    pub mode_filter: ModeFilter,
    pub show_unmounted: bool,
    pub window: PageWindow,
    pub saving: bool,
    pub expanded: Option<String>,
}

impl ModulesPanel {
    pub fn new() -> Result<Self, SyncError> {
        Ok(Self {
            store: Store::new(Vec::new())?,
            baselines: KeyedBaseline::new(),
            query: String::new(),
            deferred: Deferred::new(String::new()),
            mode_filter: ModeFilter::All,
            show_unmounted: false,
            window: PageWindow::new(PAGE_SIZE),
            saving: false,
            expanded: None,
        })
    }

    /// Stage the typed query for deferred settling. Returns `true` when a
    /// settle tick needs scheduling.
    pub fn stage_query(&mut self, text: String) -> bool {
        self.query = text.clone();
        self.deferred.set(text)
    }

    /// Commit the staged query. Returns whether the filter text changed.
    pub fn settle_query(&mut self) -> bool {
        self.deferred.settle()
    }

    /// The query text the filter actually reads.
    #[must_use]
    pub fn settled_query(&self) -> &str {
        self.deferred.value()
    }

    /// Apply a local edit to one module by id.
    pub fn edit_module(&self, id: &str, mutate: impl FnOnce(&mut Module)) {
        let result = self.store.update(|modules| {
            if let Some(module) = modules.iter_mut().find(|m| m.id == id) {
                mutate(module);
            }
        });
        if let Err(e) = result {
            error!(error = %e, "module edit failed to commit");
        }
    }

    /// Rules subtrees keyed by module id, from the committed tree.
    #[must_use]
    pub fn rules_by_id(&self) -> HashMap<String, Arc<Value>> {
        let doc = self.store.doc();
        let mut map = HashMap::new();
        if let Value::List(items) = &*doc {
            for item in items {
                let id = item.get("id").and_then(|v| v.as_str());
                if let (Some(id), Some(rules)) = (id, item.get("rules")) {
                    map.insert(id.to_string(), Arc::clone(rules));
                }
            }
        }
        map
    }

    /// Ids of modules whose rules differ from their baseline, in list order.
    #[must_use]
    pub fn dirty_ids(&self) -> Vec<String> {
        let doc = self.store.doc();
        let mut dirty = Vec::new();
        if let Value::List(items) = &*doc {
            for item in items {
                let id = item.get("id").and_then(|v| v.as_str());
                if let (Some(id), Some(rules)) = (id, item.get("rules"))
                    && self.baselines.is_dirty(id, rules)
                {
                    dirty.push(id.to_string());
                }
            }
        }
        dirty
    }

    /// Whether a module's rules are currently dirty.
    #[must_use]
    pub fn is_module_dirty(&self, id: &str) -> bool {
        self.dirty_ids().iter().any(|d| d == id)
    }

    #[must_use]
    pub fn is_dirty(&self) -> bool {
        !self.dirty_ids().is_empty()
    }

    /// Dirty modules with their rules, in list order, ready for a batch
    /// write.
    #[must_use]
    pub fn dirty_records(&self) -> Vec<(String, ModuleRules)> {
        let ids = self.dirty_ids();
        let modules = self.store.value();
        ids.into_iter()
            .filter_map(|id| {
                modules
                    .iter()
                    .find(|m| m.id == id)
                    .map(|m| (id.clone(), m.rules.clone()))
            })
            .collect()
    }

    /// The filter as currently settled.
    #[must_use]
    pub fn filter(&self) -> ModuleQuery {
        ModuleQuery {
            text: self.settled_query().to_string(),
            mode: self.mode_filter,
            show_unmounted: self.show_unmounted,
        }
    }

    /// Filtered list, unwindowed.
    #[must_use]
    pub fn filtered(&self) -> Vec<Module> {
        let modules = self.store.value();
        let filter = self.filter();
        modules.iter().filter(|m| filter.matches(m)).cloned().collect()
    }

    /// Filtered list cut to the pagination window.
    #[must_use]
    pub fn page(&self) -> Vec<Module> {
        let mut filtered = self.filtered();
        filtered.truncate(self.window.end(filtered.len()));
        filtered
    }

    pub fn toggle_expand(&mut self, id: &str) {
        if self.expanded.as_deref() == Some(id) {
            self.expanded = None;
        } else {
            self.expanded = Some(id.to_string());
        }
    }

    /// Locale key for the empty-list message, when the filtered list is
    /// empty. Points at the "unmounted modules are hidden" hint when the
    /// visibility toggle is what hid them.
    #[must_use]
    pub fn empty_state_key(&self) -> Option<&'static str> {
        if !self.filtered().is_empty() {
            return None;
        }
        let hidden_unmounted = !self.show_unmounted
            && self.store.value().iter().any(|m| !m.is_mounted);
        if hidden_unmounted {
            Some("modules.unmountedHidden")
        } else {
            Some("modules.emptyState")
        }
    }
}
