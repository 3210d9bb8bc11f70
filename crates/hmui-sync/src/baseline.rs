#![forbid(unsafe_code)]

//! Baseline snapshots and dirtiness.
//!
//! A baseline is the structural tree captured at the last successful load.
//! It is read-only until replaced by the next capture and exists only for
//! comparison: an entity (or a keyed record) is dirty iff its current tree
//! differs from the baseline at the same key. No baseline means "not yet
//! eligible to be dirty" — nothing reads as edited before the first load
//! lands.

use std::collections::HashMap;
use std::sync::Arc;

use crate::value::{Value, same};

/// Entity-level baseline for a single-valued store.
#[derive(Default)]
pub struct Baseline {
    snap: Option<Arc<Value>>,
}

impl Baseline {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Capture `loaded` after a successful load, unless the user holds
    /// unsaved edits.
    ///
    /// The capture is skipped when a baseline exists and differs from the
    /// pre-load value: that difference is exactly an unsaved edit, and a
    /// concurrent reload must not clobber the baseline it will be judged
    /// against.
    pub fn capture_if_unedited(&mut self, pre_load: &Arc<Value>, loaded: &Arc<Value>) {
        match &self.snap {
            None => self.snap = Some(Arc::clone(loaded)),
            Some(snap) if same(snap, pre_load) => self.snap = Some(Arc::clone(loaded)),
            Some(_) => {
                tracing::debug!("baseline capture skipped, unsaved edits present");
            }
        }
    }

    /// Unconditionally adopt `value` as the baseline (after an explicit
    /// save, reload, or reset).
    pub fn rebaseline(&mut self, value: &Arc<Value>) {
        self.snap = Some(Arc::clone(value));
    }

    pub fn clear(&mut self) {
        self.snap = None;
    }

    /// Whether `current` differs from the baseline. `false` before the
    /// first capture.
    #[must_use]
    pub fn is_dirty(&self, current: &Arc<Value>) -> bool {
        match &self.snap {
            Some(snap) => !same(snap, current),
            None => false,
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> Option<&Arc<Value>> {
        self.snap.as_ref()
    }
}

/// Per-record baselines for a list-valued store, keyed by record id.
#[derive(Default)]
pub struct KeyedBaseline {
    map: HashMap<String, Arc<Value>>,
}

impl KeyedBaseline {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Unconditionally adopt `loaded` as the baseline set. Keys absent from
    /// `loaded` are dropped.
    pub fn rebaseline(&mut self, loaded: &HashMap<String, Arc<Value>>) {
        self.map = loaded.clone();
    }

    /// Guarded capture after a load: each loaded key is adopted unless its
    /// existing baseline differs from the pre-load value for that key
    /// (an unsaved edit). Keys absent from `loaded` are dropped.
    pub fn capture_if_unedited(
        &mut self,
        pre_load: &HashMap<String, Arc<Value>>,
        loaded: &HashMap<String, Arc<Value>>,
    ) {
        let mut next = HashMap::with_capacity(loaded.len());
        for (key, value) in loaded {
            let adopted = match (self.map.get(key), pre_load.get(key)) {
                (Some(snap), Some(pre)) if !same(snap, pre) => Arc::clone(snap),
                _ => Arc::clone(value),
            };
            next.insert(key.clone(), adopted);
        }
        self.map = next;
    }

    /// Whether the record at `key` differs from its baseline. Records with
    /// no baseline entry are clean.
    #[must_use]
    pub fn is_dirty(&self, key: &str, current: &Arc<Value>) -> bool {
        match self.map.get(key) {
            Some(snap) => !same(snap, current),
            None => false,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree(json: serde_json::Value) -> Arc<Value> {
        Value::from_json(json)
    }

    #[test]
    fn nothing_is_dirty_before_first_capture() {
        let baseline = Baseline::new();
        assert!(!baseline.is_dirty(&tree(serde_json::json!({"x": 1}))));
    }

    #[test]
    fn first_capture_always_lands() {
        let mut baseline = Baseline::new();
        let loaded = tree(serde_json::json!({"x": 1}));
        baseline.capture_if_unedited(&tree(serde_json::json!(null)), &loaded);
        assert!(!baseline.is_dirty(&loaded));
    }

    #[test]
    fn edit_makes_entity_dirty_and_reload_capture_is_skipped() {
        let mut baseline = Baseline::new();
        let loaded = tree(serde_json::json!({"x": 1}));
        baseline.capture_if_unedited(&loaded, &loaded);

        // User edits locally; a concurrent reload completes with fresh data.
        let edited = tree(serde_json::json!({"x": 2}));
        assert!(baseline.is_dirty(&edited));

        let reloaded = tree(serde_json::json!({"x": 3}));
        baseline.capture_if_unedited(&edited, &reloaded);
        // Baseline still judges against the original load.
        assert!(baseline.is_dirty(&edited));
        assert!(!baseline.is_dirty(&loaded));
    }

    #[test]
    fn rebaseline_adopts_unconditionally() {
        let mut baseline = Baseline::new();
        let a = tree(serde_json::json!({"x": 1}));
        baseline.capture_if_unedited(&a, &a);
        let b = tree(serde_json::json!({"x": 2}));
        baseline.rebaseline(&b);
        assert!(!baseline.is_dirty(&b));
        assert!(baseline.is_dirty(&a));
    }

    #[test]
    fn keyed_dirty_is_per_record() {
        let mut baselines = KeyedBaseline::new();
        let a = tree(serde_json::json!({"default_mode": "overlay"}));
        let b = tree(serde_json::json!({"default_mode": "magic"}));
        let mut loaded = HashMap::new();
        loaded.insert("a".to_string(), Arc::clone(&a));
        loaded.insert("b".to_string(), Arc::clone(&b));
        baselines.rebaseline(&loaded);

        assert!(!baselines.is_dirty("a", &a));
        let a_edited = tree(serde_json::json!({"default_mode": "ignore"}));
        assert!(baselines.is_dirty("a", &a_edited));
        assert!(!baselines.is_dirty("b", &b));
        assert!(!baselines.is_dirty("unknown", &a));
    }

    #[test]
    fn keyed_guarded_capture_preserves_edited_records() {
        let mut baselines = KeyedBaseline::new();
        let a = tree(serde_json::json!({"default_mode": "overlay"}));
        let b = tree(serde_json::json!({"default_mode": "magic"}));
        let mut initial = HashMap::new();
        initial.insert("a".to_string(), Arc::clone(&a));
        initial.insert("b".to_string(), Arc::clone(&b));
        baselines.rebaseline(&initial);

        // "a" is edited locally, then a reload lands with fresh values.
        let a_edited = tree(serde_json::json!({"default_mode": "ignore"}));
        let mut pre = initial.clone();
        pre.insert("a".to_string(), Arc::clone(&a_edited));
        let mut loaded = HashMap::new();
        loaded.insert("a".to_string(), Arc::clone(&a_edited));
        loaded.insert("b".to_string(), Arc::clone(&b));
        baselines.capture_if_unedited(&pre, &loaded);

        // "a" keeps its old baseline, so the edit is still dirty.
        assert!(baselines.is_dirty("a", &a_edited));
        assert!(!baselines.is_dirty("b", &b));
    }

    #[test]
    fn keyed_capture_drops_vanished_records() {
        let mut baselines = KeyedBaseline::new();
        let a = tree(serde_json::json!({"default_mode": "overlay"}));
        let mut initial = HashMap::new();
        initial.insert("gone".to_string(), Arc::clone(&a));
        baselines.rebaseline(&initial);

        baselines.capture_if_unedited(&initial, &HashMap::new());
        assert!(baselines.is_empty());
    }
}
