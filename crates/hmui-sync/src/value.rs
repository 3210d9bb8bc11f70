#![forbid(unsafe_code)]

//! `Arc`-shared structural value tree.
//!
//! [`Value`] mirrors the JSON data model but shares every node behind an
//! `Arc`, which is what makes "retained by reference" observable: after a
//! reconcile, an unchanged subtree of the committed value is the same
//! allocation as before (`Arc::ptr_eq`), so downstream consumers keyed to
//! that subtree can skip work. Serde types cross into the tree through
//! `serde_json::Value`.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;

/// A structural value node. Containers hold `Arc`-shared children.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Number(serde_json::Number),
    Str(String),
    List(Vec<Arc<Value>>),
    Map(BTreeMap<String, Arc<Value>>),
}

impl Value {
    /// Convert a `serde_json` tree into a shared tree.
    #[must_use]
    pub fn from_json(json: serde_json::Value) -> Arc<Value> {
        Arc::new(match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n),
            serde_json::Value::String(s) => Value::Str(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from_json).collect())
            }
            serde_json::Value::Object(map) => Value::Map(
                map.into_iter()
                    .map(|(k, v)| (k, Value::from_json(v)))
                    .collect(),
            ),
        })
    }

    /// Convert back into a `serde_json` tree.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Number(n) => serde_json::Value::Number(n.clone()),
            Value::Str(s) => serde_json::Value::String(s.clone()),
            Value::List(items) => {
                serde_json::Value::Array(items.iter().map(|v| v.to_json()).collect())
            }
            Value::Map(map) => serde_json::Value::Object(
                map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
        }
    }

    /// Child of a map node by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Arc<Value>> {
        match self {
            Value::Map(map) => map.get(key),
            _ => None,
        }
    }

    /// Child of a list node by index.
    #[must_use]
    pub fn index(&self, idx: usize) -> Option<&Arc<Value>> {
        match self {
            Value::List(items) => items.get(idx),
            _ => None,
        }
    }

    /// String payload, if this is a string node.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Bool payload, if this is a bool node.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

/// One step of a path into a value tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Seg {
    Key(String),
    Index(usize),
}

impl From<&str> for Seg {
    fn from(key: &str) -> Self {
        Seg::Key(key.to_string())
    }
}

impl From<String> for Seg {
    fn from(key: String) -> Self {
        Seg::Key(key)
    }
}

impl From<usize> for Seg {
    fn from(idx: usize) -> Self {
        Seg::Index(idx)
    }
}

/// Resolve a path from `root`, returning the subtree it names.
#[must_use]
pub fn at<'a>(root: &'a Arc<Value>, path: &[Seg]) -> Option<&'a Arc<Value>> {
    let mut node = root;
    for seg in path {
        node = match seg {
            Seg::Key(key) => node.get(key)?,
            Seg::Index(idx) => node.index(*idx)?,
        };
    }
    Some(node)
}

/// Structural equality with an identity shortcut.
///
/// Reconciled trees share unchanged subtrees, so most comparisons resolve at
/// the pointer check without descending.
#[must_use]
pub fn same(a: &Arc<Value>, b: &Arc<Value>) -> bool {
    Arc::ptr_eq(a, b) || deep_eq(a, b)
}

fn deep_eq(a: &Arc<Value>, b: &Arc<Value>) -> bool {
    if Arc::ptr_eq(a, b) {
        return true;
    }
    match (&**a, &**b) {
        (Value::List(xs), Value::List(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| deep_eq(x, y))
        }
        (Value::Map(xs), Value::Map(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .zip(ys)
                    .all(|((kx, x), (ky, y))| kx == ky && deep_eq(x, y))
        }
        (x, y) => x == y,
    }
}

/// Encode a serde value into a shared tree.
pub fn encode<T: Serialize>(value: &T) -> Result<Arc<Value>, serde_json::Error> {
    Ok(Value::from_json(serde_json::to_value(value)?))
}

/// Decode a shared tree back into a serde value.
pub fn decode<T: DeserializeOwned>(value: &Value) -> Result<T, serde_json::Error> {
    serde_json::from_value(value.to_json())
}
