#![forbid(unsafe_code)]

//! Observable store over a reconciled value.
//!
//! A [`Store`] owns one remote-fetched entity in two synchronized forms: the
//! typed value the application reads, and the `Arc`-shared structural tree
//! used for identity-preserving merges and subtree watchers. All commits go
//! through [`reconcile`], so a watcher registered at a path fires only when
//! the subtree at that path actually changed.
//!
//! The load protocol is owned by the caller: set the loading flag, issue the
//! fetch through the runtime's task queue, then either [`Store::replace`]
//! the fetched value or leave the store untouched on failure, clearing the
//! flag in both cases.
//!
//! # Overlapping loads
//!
//! A store does not serialize loads. If two fetches overlap, each
//! completion reconciles into the committed value as it arrives, so the
//! final value reflects whichever completed last (last writer by completion
//! order, not request order). Stale in-flight responses are merged, never
//! cancelled; the identity-preserving merge is what keeps that safe.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::Arc;

use serde::Serialize;

use crate::reconcile::reconcile;
use crate::value::{self, Seg, Value, at};

/// Encode/decode failure while moving a typed value through the tree.
#[derive(Debug)]
pub enum SyncError {
    Encode(serde_json::Error),
    Decode(serde_json::Error),
}

impl fmt::Display for SyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncError::Encode(e) => write!(f, "encode error: {e}"),
            SyncError::Decode(e) => write!(f, "decode error: {e}"),
        }
    }
}

impl std::error::Error for SyncError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SyncError::Encode(e) | SyncError::Decode(e) => Some(e),
        }
    }
}

type WatchCallback = Rc<dyn Fn(Option<&Arc<Value>>)>;

struct Watcher {
    id: u64,
    path: Vec<Seg>,
    callback: WatchCallback,
}

struct Inner<T> {
    value: Rc<T>,
    doc: Arc<Value>,
    loading: bool,
    version: u64,
    next_watch_id: u64,
    watchers: Vec<Watcher>,
}

/// A reconciling store for one remote entity.
///
/// Handles are cheap clones sharing the same state; construct one per
/// entity and pass handles to whoever needs reads or watches. Single
/// threaded by design — mutation happens on the update path only.
pub struct Store<T> {
    inner: Rc<RefCell<Inner<T>>>,
}

impl<T> Clone for Store<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

/// Removes its watcher when dropped.
#[must_use = "dropping this guard removes the watcher"]
pub struct WatchGuard {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl Drop for WatchGuard {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl<T: Serialize + 'static> Store<T> {
    /// Create a store committed to `initial`.
    pub fn new(initial: T) -> Result<Self, SyncError> {
        let doc = value::encode(&initial).map_err(SyncError::Encode)?;
        Ok(Self {
            inner: Rc::new(RefCell::new(Inner {
                value: Rc::new(initial),
                doc,
                loading: false,
                version: 0,
                next_watch_id: 0,
                watchers: Vec::new(),
            })),
        })
    }

    /// The committed typed value.
    #[must_use]
    pub fn value(&self) -> Rc<T> {
        Rc::clone(&self.inner.borrow().value)
    }

    /// An owned copy of the committed value.
    #[must_use]
    pub fn snapshot(&self) -> T
    where
        T: Clone,
    {
        (*self.inner.borrow().value).clone()
    }

    /// The committed structural tree.
    #[must_use]
    pub fn doc(&self) -> Arc<Value> {
        Arc::clone(&self.inner.borrow().doc)
    }

    /// Monotonic commit counter.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.borrow().version
    }

    #[must_use]
    pub fn loading(&self) -> bool {
        self.inner.borrow().loading
    }

    pub fn set_loading(&self, loading: bool) {
        self.inner.borrow_mut().loading = loading;
    }

    /// Commit a new value, reconciling it against the committed tree.
    ///
    /// Watchers whose subtree identity changed are notified after the
    /// commit. See the module docs for the overlapping-load behavior.
    pub fn replace(&self, incoming: T) -> Result<(), SyncError> {
        let tree = value::encode(&incoming).map_err(SyncError::Encode)?;
        let merged = {
            let inner = self.inner.borrow();
            reconcile(&inner.doc, &tree)
        };
        self.commit(Rc::new(incoming), merged);
        Ok(())
    }

    /// Clone the committed value, apply `mutate`, and commit the result.
    pub fn update(&self, mutate: impl FnOnce(&mut T)) -> Result<(), SyncError>
    where
        T: Clone,
    {
        let mut next = self.snapshot();
        mutate(&mut next);
        self.replace(next)
    }

    /// Watch the subtree at `path`.
    ///
    /// `callback` runs after each commit that changed the subtree's
    /// identity, receiving the new subtree (`None` when the path no longer
    /// resolves). Commits that leave the subtree shared are silent — that
    /// bound on downstream work is the point of reconciling.
    pub fn watch(
        &self,
        path: Vec<Seg>,
        callback: impl Fn(Option<&Arc<Value>>) + 'static,
    ) -> WatchGuard {
        let id = {
            let mut inner = self.inner.borrow_mut();
            let id = inner.next_watch_id;
            inner.next_watch_id += 1;
            inner.watchers.push(Watcher {
                id,
                path,
                callback: Rc::new(callback),
            });
            id
        };
        let weak: Weak<RefCell<Inner<T>>> = Rc::downgrade(&self.inner);
        WatchGuard {
            cancel: Some(Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.borrow_mut().watchers.retain(|w| w.id != id);
                }
            })),
        }
    }

    fn commit(&self, value: Rc<T>, doc: Arc<Value>) {
        // Collect notifications under the borrow, fire them after releasing
        // it so callbacks may re-enter the store.
        let mut fired: Vec<(WatchCallback, Option<Arc<Value>>)> = Vec::new();
        {
            let mut inner = self.inner.borrow_mut();
            let old_doc = std::mem::replace(&mut inner.doc, doc);
            inner.value = value;
            inner.version += 1;
            for watcher in &inner.watchers {
                let old = at(&old_doc, &watcher.path);
                let new = at(&inner.doc, &watcher.path);
                let changed = match (old, new) {
                    (Some(a), Some(b)) => !Arc::ptr_eq(a, b),
                    (None, None) => false,
                    _ => true,
                };
                if changed {
                    fired.push((Rc::clone(&watcher.callback), new.cloned()));
                }
            }
        }
        for (callback, subtree) in fired {
            callback(subtree.as_ref());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::cell::Cell;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Config {
        moduledir: String,
        disable_umount: bool,
    }

    fn config(dir: &str, disable: bool) -> Config {
        Config {
            moduledir: dir.to_string(),
            disable_umount: disable,
        }
    }

    #[test]
    fn replace_commits_the_typed_value() {
        let store = Store::new(config("/a", false)).unwrap();
        store.replace(config("/b", true)).unwrap();
        assert_eq!(store.value().moduledir, "/b");
        assert_eq!(store.version(), 1);
    }

    #[test]
    fn watcher_fires_only_when_its_subtree_changes() {
        let store = Store::new(config("/a", false)).unwrap();
        let dir_hits = Rc::new(Cell::new(0));
        let flag_hits = Rc::new(Cell::new(0));

        let dir_hits2 = Rc::clone(&dir_hits);
        let _dir_watch = store.watch(vec![Seg::from("moduledir")], move |_| {
            dir_hits2.set(dir_hits2.get() + 1);
        });
        let flag_hits2 = Rc::clone(&flag_hits);
        let _flag_watch = store.watch(vec![Seg::from("disable_umount")], move |_| {
            flag_hits2.set(flag_hits2.get() + 1);
        });

        store.replace(config("/b", false)).unwrap();
        assert_eq!(dir_hits.get(), 1);
        assert_eq!(flag_hits.get(), 0);

        store.replace(config("/b", true)).unwrap();
        assert_eq!(dir_hits.get(), 1);
        assert_eq!(flag_hits.get(), 1);
    }

    #[test]
    fn equal_replace_is_silent() {
        let store = Store::new(config("/a", false)).unwrap();
        let hits = Rc::new(Cell::new(0));
        let hits2 = Rc::clone(&hits);
        let _watch = store.watch(vec![], move |_| {
            hits2.set(hits2.get() + 1);
        });
        let before = store.doc();
        store.replace(config("/a", false)).unwrap();
        assert_eq!(hits.get(), 0);
        assert!(Arc::ptr_eq(&before, &store.doc()));
    }

    #[test]
    fn dropped_guard_stops_notifications() {
        let store = Store::new(config("/a", false)).unwrap();
        let hits = Rc::new(Cell::new(0));
        let hits2 = Rc::clone(&hits);
        let watch = store.watch(vec![], move |_| {
            hits2.set(hits2.get() + 1);
        });
        drop(watch);
        store.replace(config("/b", false)).unwrap();
        assert_eq!(hits.get(), 0);
    }

    #[test]
    fn loading_flag_is_caller_owned() {
        let store = Store::new(config("/a", false)).unwrap();
        assert!(!store.loading());
        store.set_loading(true);
        assert!(store.loading());
        store.set_loading(false);
        assert!(!store.loading());
    }

    #[test]
    fn update_applies_in_place_edits() {
        let store = Store::new(config("/a", false)).unwrap();
        store.update(|c| c.disable_umount = true).unwrap();
        assert!(store.value().disable_umount);
    }
}
