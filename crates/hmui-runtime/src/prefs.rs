#![forbid(unsafe_code)]

//! Durable key-value preference storage.
//!
//! Two backends behind one trait: an in-memory map for tests and ephemeral
//! sessions, and a JSON file written atomically (write to a sibling temp
//! file, then rename) so a crash mid-write never corrupts stored
//! preferences. Storage failures never panic and never lose the in-memory
//! state; they are logged and the session continues with what it has.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::warn;

/// Preference key for the selected language code.
pub const LANG_KEY: &str = "lang";
/// Preference key for the bottom-navigation pinning flag.
pub const BOTTOM_NAV_KEY: &str = "fix_bottom_nav";

const DEFAULT_LANG: &str = "en-US";

/// Errors from a preference backend.
#[derive(Debug)]
pub enum PrefsError {
    /// I/O failure reading or writing the backing file.
    Io(std::io::Error),
    /// The stored data is not a flat string map.
    Format(String),
}

impl fmt::Display for PrefsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrefsError::Io(e) => write!(f, "I/O error: {e}"),
            PrefsError::Format(msg) => write!(f, "format error: {msg}"),
        }
    }
}

impl std::error::Error for PrefsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PrefsError::Io(e) => Some(e),
            PrefsError::Format(_) => None,
        }
    }
}

impl From<std::io::Error> for PrefsError {
    fn from(e: std::io::Error) -> Self {
        PrefsError::Io(e)
    }
}

/// Result type for preference storage.
pub type PrefsResult<T> = Result<T, PrefsError>;

/// Pluggable preference storage.
pub trait PrefsBackend: Send + Sync {
    /// Human-readable name for logging.
    fn name(&self) -> &str;

    /// Load all stored entries. An empty map on first run.
    fn load(&self) -> PrefsResult<HashMap<String, String>>;

    /// Persist all entries atomically.
    fn store(&self, entries: &HashMap<String, String>) -> PrefsResult<()>;
}

/// In-memory backend for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryPrefs {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryPrefs {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl PrefsBackend for MemoryPrefs {
    fn name(&self) -> &str {
        "memory"
    }

    fn load(&self) -> PrefsResult<HashMap<String, String>> {
        Ok(self
            .entries
            .lock()
            .map_err(|_| PrefsError::Format("poisoned lock".to_string()))?
            .clone())
    }

    fn store(&self, entries: &HashMap<String, String>) -> PrefsResult<()> {
        *self
            .entries
            .lock()
            .map_err(|_| PrefsError::Format("poisoned lock".to_string()))? = entries.clone();
        Ok(())
    }
}

/// JSON file backend with write-then-rename persistence.
#[derive(Debug)]
pub struct FilePrefs {
    path: PathBuf,
}

impl FilePrefs {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut os = self.path.as_os_str().to_os_string();
        os.push(".tmp");
        PathBuf::from(os)
    }
}

impl PrefsBackend for FilePrefs {
    fn name(&self) -> &str {
        "file"
    }

    fn load(&self) -> PrefsResult<HashMap<String, String>> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }
        let raw = fs::read_to_string(&self.path)?;
        serde_json::from_str(&raw).map_err(|e| PrefsError::Format(e.to_string()))
    }

    fn store(&self, entries: &HashMap<String, String>) -> PrefsResult<()> {
        let json = serde_json::to_string_pretty(entries)
            .map_err(|e| PrefsError::Format(e.to_string()))?;
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.temp_path();
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

/// Cached view over a backend, persisted on every set.
pub struct Prefs {
    backend: Box<dyn PrefsBackend>,
    cache: HashMap<String, String>,
}

impl Prefs {
    /// Read the backend once at startup. A failed read logs a warning and
    /// starts empty; the session still works, it just forgets on restart.
    #[must_use]
    pub fn load(backend: Box<dyn PrefsBackend>) -> Self {
        let cache = match backend.load() {
            Ok(entries) => entries,
            Err(e) => {
                warn!(backend = backend.name(), error = %e, "failed to load preferences");
                HashMap::new()
            }
        };
        Self { backend, cache }
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.cache.get(key).map(String::as_str)
    }

    /// Set and persist immediately. A failed write keeps the cached value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.cache.insert(key.into(), value.into());
        if let Err(e) = self.backend.store(&self.cache) {
            warn!(backend = self.backend.name(), error = %e, "failed to persist preferences");
        }
    }

    /// Selected language code, `en-US` when unset.
    #[must_use]
    pub fn lang(&self) -> &str {
        self.get(LANG_KEY).unwrap_or(DEFAULT_LANG)
    }

    pub fn set_lang(&mut self, code: impl Into<String>) {
        self.set(LANG_KEY, code.into());
    }

    /// Bottom-navigation pinning flag, off when unset.
    #[must_use]
    pub fn bottom_nav_pinned(&self) -> bool {
        self.get(BOTTOM_NAV_KEY) == Some("true")
    }

    pub fn set_bottom_nav_pinned(&mut self, pinned: bool) {
        self.set(BOTTOM_NAV_KEY, pinned.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_unset() {
        let prefs = Prefs::load(Box::new(MemoryPrefs::new()));
        assert_eq!(prefs.lang(), "en-US");
        assert!(!prefs.bottom_nav_pinned());
    }

    #[test]
    fn typed_accessors_roundtrip_through_the_backend() {
        let mut prefs = Prefs::load(Box::new(MemoryPrefs::new()));
        prefs.set_lang("zh-CN");
        prefs.set_bottom_nav_pinned(true);
        assert_eq!(prefs.lang(), "zh-CN");
        assert!(prefs.bottom_nav_pinned());
    }

    #[test]
    fn file_backend_persists_across_loads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");

        let mut prefs = Prefs::load(Box::new(FilePrefs::new(&path)));
        prefs.set_lang("ja-JP");
        drop(prefs);

        let reread = Prefs::load(Box::new(FilePrefs::new(&path)));
        assert_eq!(reread.lang(), "ja-JP");
    }

    #[test]
    fn missing_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FilePrefs::new(dir.path().join("absent.json"));
        assert!(backend.load().unwrap().is_empty());
    }

    #[test]
    fn corrupt_file_is_a_format_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        fs::write(&path, "not json").unwrap();
        let backend = FilePrefs::new(&path);
        assert!(matches!(backend.load(), Err(PrefsError::Format(_))));
    }

    #[test]
    fn store_leaves_no_temp_file_behind() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        let backend = FilePrefs::new(&path);
        let mut entries = HashMap::new();
        entries.insert("lang".to_string(), "en-US".to_string());
        backend.store(&entries).unwrap();
        assert!(path.exists());
        assert!(!backend.temp_path().exists());
    }
}
