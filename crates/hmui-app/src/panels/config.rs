#![forbid(unsafe_code)]

//! Config panel: the editable backend configuration over a reconciling
//! store with an entity-level baseline.

use hmui_core::AppConfig;
use hmui_core::policy;
use hmui_sync::store::SyncError;
use hmui_sync::{Baseline, Store};
use tracing::error;

/// Config panel state: one store, one baseline, one saving flag.
pub struct ConfigPanel {
    pub store: Store<AppConfig>,
    pub baseline: Baseline,
    pub saving: bool,
}

impl ConfigPanel {
    pub fn new() -> Result<Self, SyncError> {
        Ok(Self {
            store: Store::new(AppConfig::default())?,
            baseline: Baseline::new(),
            saving: false,
        })
    }

    /// Apply a local edit. Encode failures cannot occur for `AppConfig`
    /// but are logged rather than silently dropped.
    pub fn edit(&self, mutate: impl FnOnce(&mut AppConfig)) {
        if let Err(e) = self.store.update(mutate) {
            error!(error = %e, "config edit failed to commit");
        }
    }

    /// Whether the current config differs from the last load/save baseline.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.baseline.is_dirty(&self.store.doc())
    }

    /// Whether the module directory field currently fails validation.
    #[must_use]
    pub fn moduledir_invalid(&self) -> bool {
        !policy::is_valid_path(&self.store.value().moduledir)
    }
}
