//! Operator preferences backed by a durable key-value store.
//!
//! Values are stored as JSON strings under namespaced keys. Every read and
//! write tolerates a broken or missing store: failures are logged and the
//! caller's default is used for the rest of the session.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::warn;

use crate::error::{Result, ShogunError};
use crate::types::{CommandHistoryEntry, SectionId};

pub const KEY_LANGUAGE: &str = "shogun-gui-lang";
pub const KEY_COMPLETED_COLLAPSED: &str = "shogun-gui-completed-collapsed";
pub const KEY_COMMAND_HISTORY: &str = "shogun-gui-command-history";
pub const KEY_NOTIFICATIONS: &str = "shogun-gui-notifications";

pub const MAX_HISTORY: usize = 10;

/// Preference key holding an operator-owned collapsed flag. Content-derived
/// sections are re-forced by every snapshot and have no key.
pub fn collapsed_key(section: SectionId) -> Option<&'static str> {
    match section {
        SectionId::CompletedToday => Some(KEY_COMPLETED_COLLAPSED),
        _ => None,
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Stores
// ═══════════════════════════════════════════════════════════════════════════════

pub trait PreferenceStore: Send {
    fn read(&self, key: &str) -> Result<Option<String>>;
    fn write(&mut self, key: &str, value: String) -> Result<()>;
}

/// Session-only store.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

impl PreferenceStore for MemoryStore {
    fn read(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.get(key).cloned())
    }

    fn write(&mut self, key: &str, value: String) -> Result<()> {
        self.values.insert(key.to_string(), value);
        Ok(())
    }
}

/// Store that fails every operation, standing in for storage that is
/// disabled or unreachable.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableStore;

impl PreferenceStore for UnavailableStore {
    fn read(&self, _key: &str) -> Result<Option<String>> {
        Err(ShogunError::StoreUnavailable("storage disabled".to_string()))
    }

    fn write(&mut self, _key: &str, _value: String) -> Result<()> {
        Err(ShogunError::StoreUnavailable("storage disabled".to_string()))
    }
}

/// JSON file store: read once at open, rewritten atomically on every write.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl JsonFileStore {
    /// Opens the store. A missing file is an empty store; a corrupt file is
    /// logged and treated as empty so the next write replaces it.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let values = match fs_err::read_to_string(&path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(values) => values,
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "Corrupt preferences file; starting empty");
                    BTreeMap::new()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(source) => {
                return Err(ShogunError::Io {
                    context: format!("reading {}", path.display()),
                    source,
                })
            }
        };
        Ok(Self { path, values })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self) -> Result<()> {
        let parent = self.path.parent().ok_or_else(|| {
            ShogunError::StoreUnavailable(format!("{} has no parent", self.path.display()))
        })?;
        fs_err::create_dir_all(parent).map_err(|source| ShogunError::Io {
            context: format!("creating {}", parent.display()),
            source,
        })?;

        let content = serde_json::to_string_pretty(&self.values).map_err(|source| {
            ShogunError::Json {
                context: "serializing preferences".to_string(),
                source,
            }
        })?;
        let io_err = |context: &str, source| ShogunError::Io {
            context: context.to_string(),
            source,
        };
        let mut temp_file =
            NamedTempFile::new_in(parent).map_err(|e| io_err("creating temp preferences", e))?;
        temp_file
            .write_all(content.as_bytes())
            .map_err(|e| io_err("writing temp preferences", e))?;
        temp_file
            .flush()
            .map_err(|e| io_err("flushing temp preferences", e))?;
        temp_file
            .persist(&self.path)
            .map_err(|e| io_err("replacing preferences", e.error))?;
        Ok(())
    }
}

impl PreferenceStore for JsonFileStore {
    fn read(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.get(key).cloned())
    }

    fn write(&mut self, key: &str, value: String) -> Result<()> {
        self.values.insert(key.to_string(), value);
        self.save()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Typed Access
// ═══════════════════════════════════════════════════════════════════════════════

pub struct Preferences {
    store: Box<dyn PreferenceStore>,
}

impl std::fmt::Debug for Preferences {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Preferences").finish_non_exhaustive()
    }
}

impl Preferences {
    pub fn new(store: Box<dyn PreferenceStore>) -> Self {
        Self { store }
    }

    /// Opens the file store at `path`, falling back to a session-only store.
    pub fn open_or_memory(path: &Path) -> Self {
        match JsonFileStore::open(path) {
            Ok(store) => Self::new(Box::new(store)),
            Err(err) => {
                warn!(error = %err, "Preferences unavailable; using session-only store");
                Self::new(Box::new(MemoryStore::default()))
            }
        }
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        match self.store.read(key) {
            Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|err| {
                warn!(key, error = %err, "Ignoring unreadable preference");
                default
            }),
            Ok(None) => default,
            Err(err) => {
                warn!(key, error = %err, "Preference read failed");
                default
            }
        }
    }

    pub fn set<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) {
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(err) => {
                warn!(key, error = %err, "Preference serialize failed");
                return;
            }
        };
        if let Err(err) = self.store.write(key, raw) {
            warn!(key, error = %err, "Preference write failed");
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Command History
// ═══════════════════════════════════════════════════════════════════════════════

/// Most recent commands, newest first, capped at [`MAX_HISTORY`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandHistory {
    entries: Vec<CommandHistoryEntry>,
}

impl CommandHistory {
    pub fn load(prefs: &Preferences) -> Self {
        let mut entries: Vec<CommandHistoryEntry> = prefs.get(KEY_COMMAND_HISTORY, Vec::new());
        entries.truncate(MAX_HISTORY);
        Self { entries }
    }

    pub fn push(&mut self, text: &str, timestamp: i64) {
        self.entries.insert(
            0,
            CommandHistoryEntry {
                text: text.to_string(),
                timestamp,
            },
        );
        self.entries.truncate(MAX_HISTORY);
    }

    pub fn save(&self, prefs: &mut Preferences) {
        prefs.set(KEY_COMMAND_HISTORY, &self.entries);
    }

    pub fn entries(&self) -> &[CommandHistoryEntry] {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn memory() -> Preferences {
        Preferences::new(Box::new(MemoryStore::default()))
    }

    #[test]
    fn get_returns_default_when_absent() {
        let prefs = memory();
        assert!(!prefs.get(KEY_NOTIFICATIONS, false));
        assert!(prefs.get(KEY_COMPLETED_COLLAPSED, true));
    }

    #[test]
    fn set_then_get() {
        let mut prefs = memory();
        prefs.set(KEY_NOTIFICATIONS, &true);
        assert!(prefs.get(KEY_NOTIFICATIONS, false));
    }

    #[test]
    fn unavailable_store_falls_back_to_defaults() {
        let mut prefs = Preferences::new(Box::new(UnavailableStore));
        prefs.set(KEY_NOTIFICATIONS, &true);
        assert!(!prefs.get(KEY_NOTIFICATIONS, false));
    }

    #[test]
    fn wrong_type_falls_back_to_default() {
        let mut prefs = memory();
        prefs.set(KEY_COMPLETED_COLLAPSED, "yes");
        assert!(prefs.get(KEY_COMPLETED_COLLAPSED, true));
    }

    #[test]
    fn file_store_survives_reopen() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("prefs").join("preferences.json");

        let mut prefs = Preferences::new(Box::new(JsonFileStore::open(&path).unwrap()));
        prefs.set(KEY_LANGUAGE, "en");
        drop(prefs);

        let reopened = Preferences::new(Box::new(JsonFileStore::open(&path).unwrap()));
        assert_eq!(reopened.get::<Option<String>>(KEY_LANGUAGE, None).as_deref(), Some("en"));
    }

    #[test]
    fn corrupt_file_opens_empty() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("preferences.json");
        std::fs::write(&path, "not json").unwrap();

        let store = JsonFileStore::open(&path).unwrap();
        assert_eq!(store.read(KEY_LANGUAGE).unwrap(), None);
    }

    #[test]
    fn only_operator_owned_sections_have_keys() {
        assert_eq!(
            collapsed_key(SectionId::CompletedToday),
            Some("shogun-gui-completed-collapsed")
        );
        assert_eq!(collapsed_key(SectionId::Waiting), None);
        assert_eq!(collapsed_key(SectionId::InProgress), None);
    }

    #[test]
    fn history_keeps_ten_newest_first() {
        let mut history = CommandHistory::default();
        for i in 0..11 {
            history.push(&format!("command {}", i), i);
        }

        let texts: Vec<_> = history.entries().iter().map(|e| e.text.as_str()).collect();
        assert_eq!(texts.len(), MAX_HISTORY);
        assert_eq!(texts[0], "command 10");
        assert_eq!(texts[9], "command 1");
        assert!(!texts.contains(&"command 0"));
    }

    #[test]
    fn history_roundtrips_through_preferences() {
        let mut prefs = memory();
        let mut history = CommandHistory::default();
        history.push("first", 1);
        history.push("second", 2);
        history.save(&mut prefs);

        let loaded = CommandHistory::load(&prefs);
        assert_eq!(loaded, history);
        assert_eq!(loaded.entries()[0].text, "second");
    }

    #[test]
    fn oversized_persisted_history_is_capped() {
        let mut prefs = memory();
        let entries: Vec<_> = (0..15)
            .map(|i| CommandHistoryEntry {
                text: i.to_string(),
                timestamp: i,
            })
            .collect();
        prefs.set(KEY_COMMAND_HISTORY, &entries);
        assert_eq!(CommandHistory::load(&prefs).entries().len(), MAX_HISTORY);
    }
}
