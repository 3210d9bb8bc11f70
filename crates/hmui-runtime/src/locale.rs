#![forbid(unsafe_code)]

//! Locale tables with an explicit fallback language.
//!
//! A catalog holds one flat-ish JSON table per language code; lookups take
//! a dotted key (`"config.saveFailed"`) and walk the table. A missing
//! table or key falls back to [`FALLBACK_LANG`], and callers always supply
//! a final default string so user-facing copy never disappears entirely.

use std::collections::HashMap;

/// Language used when a requested table or key is absent.
pub const FALLBACK_LANG: &str = "en-US";

/// Per-language key→text tables.
#[derive(Debug, Default)]
pub struct Catalog {
    tables: HashMap<String, serde_json::Value>,
}

impl Catalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a language table.
    pub fn insert(&mut self, code: impl Into<String>, table: serde_json::Value) {
        self.tables.insert(code.into(), table);
    }

    /// Register a language table from JSON source (e.g. an embedded file).
    pub fn insert_json(&mut self, code: impl Into<String>, src: &str) -> Result<(), serde_json::Error> {
        let table = serde_json::from_str(src)?;
        self.tables.insert(code.into(), table);
        Ok(())
    }

    /// Whether a table is registered for `code`.
    #[must_use]
    pub fn has(&self, code: &str) -> bool {
        self.tables.contains_key(code)
    }

    /// Look up `key` in `lang`, then in the fallback language.
    #[must_use]
    pub fn lookup(&self, lang: &str, key: &str) -> Option<&str> {
        self.tables
            .get(lang)
            .and_then(|table| resolve(table, key))
            .or_else(|| {
                self.tables
                    .get(FALLBACK_LANG)
                    .and_then(|table| resolve(table, key))
            })
    }

    /// Look up `key`, falling back to `default` when no table has it.
    #[must_use]
    pub fn text<'a>(&'a self, lang: &str, key: &str, default: &'a str) -> &'a str {
        self.lookup(lang, key).unwrap_or(default)
    }
}

fn resolve<'a>(table: &'a serde_json::Value, key: &str) -> Option<&'a str> {
    let mut node = table;
    for part in key.split('.') {
        node = node.get(part)?;
    }
    node.as_str()
}
