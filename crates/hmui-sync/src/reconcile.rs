#![forbid(unsafe_code)]

//! Identity-preserving merge of an incoming value into the committed one.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::value::Value;

/// Merge `incoming` into `current`.
///
/// The result is structurally equal to `incoming`, but every subtree of
/// `current` that is already equal to the corresponding subtree of
/// `incoming` is returned as the same `Arc` — watchers holding onto it see
/// no change. Maps recurse key by key: keys only in `incoming` are added,
/// keys only in `current` are dropped. Lists recurse positionally up to the
/// shorter length, then append or truncate to `incoming`'s length.
#[must_use]
pub fn reconcile(current: &Arc<Value>, incoming: &Arc<Value>) -> Arc<Value> {
    if Arc::ptr_eq(current, incoming) {
        return Arc::clone(current);
    }
    match (&**current, &**incoming) {
        (Value::Map(cur), Value::Map(inc)) => {
            let mut merged = BTreeMap::new();
            let mut unchanged = cur.len() == inc.len();
            for (key, inc_child) in inc {
                let child = match cur.get(key) {
                    Some(cur_child) => {
                        let child = reconcile(cur_child, inc_child);
                        if !Arc::ptr_eq(&child, cur_child) {
                            unchanged = false;
                        }
                        child
                    }
                    None => {
                        unchanged = false;
                        Arc::clone(inc_child)
                    }
                };
                merged.insert(key.clone(), child);
            }
            if unchanged {
                Arc::clone(current)
            } else {
                Arc::new(Value::Map(merged))
            }
        }
        (Value::List(cur), Value::List(inc)) => {
            let mut merged = Vec::with_capacity(inc.len());
            let mut unchanged = cur.len() == inc.len();
            for (idx, inc_child) in inc.iter().enumerate() {
                let child = match cur.get(idx) {
                    Some(cur_child) => {
                        let child = reconcile(cur_child, inc_child);
                        if !Arc::ptr_eq(&child, cur_child) {
                            unchanged = false;
                        }
                        child
                    }
                    None => Arc::clone(inc_child),
                };
                merged.push(child);
            }
            if unchanged {
                Arc::clone(current)
            } else {
                Arc::new(Value::List(merged))
            }
        }
        (cur, inc) => {
            if cur == inc {
                Arc::clone(current)
            } else {
                Arc::clone(incoming)
            }
        }
    }
}
