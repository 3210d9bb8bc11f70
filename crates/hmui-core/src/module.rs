#![forbid(unsafe_code)]

//! Module records and the list filter predicate.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Per-module mount strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MountMode {
    /// Overlay mount (default).
    #[default]
    Overlay,
    /// Magic mount compatibility path.
    Magic,
    /// Do not mount this module or path.
    Ignore,
}

/// Mode a mounted module is currently running under, as reported by a scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActiveMode {
    /// Automatically selected overlay mount.
    #[default]
    Auto,
    /// Magic mount.
    Magic,
}

/// Editable overlay rules for one module.
///
/// `default_mode` applies to every path the module ships; `paths` overrides
/// the strategy for individual subtrees. The whole rules object is persisted
/// per module with `save_module_rules`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ModuleRules {
    #[serde(default)]
    pub default_mode: MountMode,
    #[serde(default)]
    pub paths: BTreeMap<String, MountMode>,
}

/// One installed module as reported by a scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Module {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub is_mounted: bool,
    #[serde(default)]
    pub mode: ActiveMode,
    #[serde(default)]
    pub rules: ModuleRules,
}

/// Counts of mounted modules per active mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ModeStats {
    pub auto: usize,
    pub magic: usize,
}

/// Count mounted modules per active mode. Unmounted modules are skipped.
#[must_use]
pub fn mode_stats(modules: &[Module]) -> ModeStats {
    let mut stats = ModeStats::default();
    for module in modules.iter().filter(|m| m.is_mounted) {
        match module.mode {
            ActiveMode::Auto => stats.auto += 1,
            ActiveMode::Magic => stats.magic += 1,
        }
    }
    stats
}

/// Active-mode filter for the module list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModeFilter {
    #[default]
    All,
    Auto,
    Magic,
}

impl ModeFilter {
    fn accepts(self, mode: ActiveMode) -> bool {
        match self {
            ModeFilter::All => true,
            ModeFilter::Auto => mode == ActiveMode::Auto,
            ModeFilter::Magic => mode == ActiveMode::Magic,
        }
    }
}

/// Filter inputs for the module list.
///
/// The predicate is evaluated in a fixed order: the visibility toggle first
/// (unmounted modules are hidden unless `show_unmounted`), then the
/// case-insensitive text match against name or id, then the mode filter.
#[derive(Debug, Clone, Default)]
pub struct ModuleQuery {
    pub text: String,
    pub mode: ModeFilter,
    pub show_unmounted: bool,
}

impl ModuleQuery {
    /// Whether `module` passes this filter.
    #[must_use]
    pub fn matches(&self, module: &Module) -> bool {
        if !module.is_mounted && !self.show_unmounted {
            return false;
        }
        let needle = self.text.to_lowercase();
        let hit = module.name.to_lowercase().contains(&needle)
            || module.id.to_lowercase().contains(&needle);
        if !hit {
            return false;
        }
        self.mode.accepts(module.mode)
    }

    /// Filter a module list, preserving order.
    #[must_use]
    pub fn apply<'a>(&self, modules: &'a [Module]) -> Vec<&'a Module> {
        modules.iter().filter(|m| self.matches(m)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn module(id: &str, name: &str, mounted: bool, mode: ActiveMode) -> Module {
        Module {
            id: id.to_string(),
            name: name.to_string(),
            version: "1.0".to_string(),
            description: String::new(),
            is_mounted: mounted,
            mode,
            rules: ModuleRules::default(),
        }
    }

    #[test]
    fn unmounted_hidden_by_default() {
        let query = ModuleQuery::default();
        assert!(!query.matches(&module("a", "Alpha", false, ActiveMode::Auto)));
        assert!(query.matches(&module("a", "Alpha", true, ActiveMode::Auto)));
    }

    #[test]
    fn show_unmounted_reveals_hidden_modules() {
        let query = ModuleQuery {
            show_unmounted: true,
            ..ModuleQuery::default()
        };
        assert!(query.matches(&module("a", "Alpha", false, ActiveMode::Auto)));
    }

    #[test]
    fn text_matches_name_or_id_case_insensitive() {
        let query = ModuleQuery {
            text: "ALP".to_string(),
            ..ModuleQuery::default()
        };
        assert!(query.matches(&module("zygisk_x", "Alpha Patch", true, ActiveMode::Auto)));

        let query = ModuleQuery {
            text: "zygisk".to_string(),
            ..ModuleQuery::default()
        };
        assert!(query.matches(&module("Zygisk_X", "Alpha Patch", true, ActiveMode::Auto)));
        assert!(!query.matches(&module("other", "Beta", true, ActiveMode::Auto)));
    }

    #[test]
    fn mode_filter_is_exact() {
        let query = ModuleQuery {
            mode: ModeFilter::Magic,
            ..ModuleQuery::default()
        };
        assert!(query.matches(&module("a", "Alpha", true, ActiveMode::Magic)));
        assert!(!query.matches(&module("b", "Beta", true, ActiveMode::Auto)));
    }

    #[test]
    fn apply_preserves_order() {
        let modules = vec![
            module("b", "Beta", true, ActiveMode::Auto),
            module("a", "Alpha", true, ActiveMode::Auto),
        ];
        let query = ModuleQuery::default();
        let ids: Vec<&str> = query.apply(&modules).iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, ["b", "a"]);
    }

    #[test]
    fn mode_stats_skip_unmounted() {
        let modules = vec![
            module("a", "A", true, ActiveMode::Auto),
            module("b", "B", true, ActiveMode::Magic),
            module("c", "C", false, ActiveMode::Magic),
        ];
        let stats = mode_stats(&modules);
        assert_eq!(stats.auto, 1);
        assert_eq!(stats.magic, 1);
    }
}
