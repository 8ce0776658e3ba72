//! Key-value backends for persisted preferences
//!
//! Values are opaque strings (the store writes JSON arrays). Every backend
//! reports failures as `StorageError` and never panics; the store decides
//! whether a failure is fatal.

use crate::shared::error::{StorageError, StorageResult};
use crate::shared::settings::{StorageBackend, StorageSettings};
use directories::ProjectDirs;
use log::{debug, info, warn};
use redb::{Database, ReadableTable, TableDefinition};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

/// Key: preference name, Value: serialized preference
const PREFERENCES_TABLE: TableDefinition<&str, &str> = TableDefinition::new("preferences");

const JSON_FILE_NAME: &str = "preferences.json";
const REDB_FILE_NAME: &str = "preferences.redb";

pub trait KeyValueStorage: Send + Sync {
    fn get(&self, key: &str) -> StorageResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> StorageResult<()>;
    /// Backend name for log lines
    fn name(&self) -> &'static str;
}

fn lock_or_recover<'a, T>(mutex: &'a Mutex<T>, owner: &str) -> MutexGuard<'a, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            warn!("[{}] Mutex poisoned, recovering", owner);
            poisoned.into_inner()
        }
    }
}

fn data_dir() -> StorageResult<PathBuf> {
    ProjectDirs::from("com", "calculator-hub", "calculator-hub")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or_else(|| StorageError::Unavailable("Failed to get project directories".to_string()))
}

/// Volatile backend; also the fallback when nothing else opens
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(lock_or_recover(&self.entries, "MemoryStorage").get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        lock_or_recover(&self.entries, "MemoryStorage").insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

/// One JSON object on disk, rewritten on every `set`
#[derive(Debug)]
pub struct JsonFileStorage {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl JsonFileStorage {
    pub fn default_path() -> StorageResult<PathBuf> {
        Ok(data_dir()?.join(JSON_FILE_NAME))
    }

    /// Open `path`, creating parent directories. An unreadable or corrupt
    /// file is logged and treated as empty; it is overwritten on first write.
    pub fn open(path: impl Into<PathBuf>) -> StorageResult<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                StorageError::Unavailable(format!("Failed to create data directory: {}", e))
            })?;
        }

        let entries = match std::fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str::<BTreeMap<String, String>>(&content) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!("[JsonFileStorage] Ignoring corrupt file {}: {}", path.display(), e);
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                return Err(StorageError::Unavailable(format!(
                    "Failed to read {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        debug!("[JsonFileStorage] Opened {} ({} keys)", path.display(), entries.len());
        Ok(Self { path, entries: Mutex::new(entries) })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, entries: &BTreeMap<String, String>) -> StorageResult<()> {
        let content = serde_json::to_string_pretty(entries).map_err(|e| StorageError::Corrupt {
            key: "*".to_string(),
            reason: e.to_string(),
        })?;
        std::fs::write(&self.path, content)
            .map_err(|e| StorageError::Unavailable(format!("Failed to write preferences: {}", e)))
    }
}

impl KeyValueStorage for JsonFileStorage {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(lock_or_recover(&self.entries, "JsonFileStorage").get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        let mut entries = lock_or_recover(&self.entries, "JsonFileStorage");
        let previous = entries.insert(key.to_string(), value.to_string());
        if let Err(e) = self.flush(&entries) {
            // Keep memory and disk in step
            match previous {
                Some(old) => entries.insert(key.to_string(), old),
                None => entries.remove(key),
            };
            return Err(e);
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "json-file"
    }
}

/// Redb-backed storage, one row per preference key
pub struct RedbStorage {
    db: Database,
}

impl RedbStorage {
    pub fn default_path() -> StorageResult<PathBuf> {
        Ok(data_dir()?.join(REDB_FILE_NAME))
    }

    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                StorageError::Unavailable(format!("Failed to create data directory: {}", e))
            })?;
        }

        let db = Database::create(path)
            .map_err(|e| StorageError::Unavailable(format!("Failed to create database: {}", e)))?;

        // Initialize table
        {
            let write_txn = db.begin_write()
                .map_err(|e| StorageError::Unavailable(format!("Failed to begin write transaction: {}", e)))?;
            {
                let _table = write_txn.open_table(PREFERENCES_TABLE)
                    .map_err(|e| StorageError::Unavailable(format!("Failed to open table: {}", e)))?;
            }
            write_txn.commit()
                .map_err(|e| StorageError::Unavailable(format!("Failed to commit transaction: {}", e)))?;
        }

        debug!("[RedbStorage] Opened {}", path.display());
        Ok(Self { db })
    }
}

impl KeyValueStorage for RedbStorage {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let read_txn = self.db.begin_read()
            .map_err(|e| StorageError::Unavailable(format!("Failed to begin read: {}", e)))?;
        let table = read_txn.open_table(PREFERENCES_TABLE)
            .map_err(|e| StorageError::Unavailable(format!("Failed to open table: {}", e)))?;

        let value = table.get(key)
            .map_err(|e| StorageError::Unavailable(format!("Failed to read '{}': {}", key, e)))?;
        Ok(value.map(|guard| guard.value().to_string()))
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        let write_txn = self.db.begin_write()
            .map_err(|e| StorageError::Unavailable(format!("Failed to begin write: {}", e)))?;
        {
            let mut table = write_txn.open_table(PREFERENCES_TABLE)
                .map_err(|e| StorageError::Unavailable(format!("Failed to open table: {}", e)))?;
            table.insert(key, value)
                .map_err(|e| StorageError::Unavailable(format!("Failed to insert: {}", e)))?;
        }
        write_txn.commit()
            .map_err(|e| StorageError::Unavailable(format!("Failed to commit: {}", e)))?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "redb"
    }
}

/// Open the configured backend
pub fn open_storage(settings: &StorageSettings) -> StorageResult<Arc<dyn KeyValueStorage>> {
    let storage: Arc<dyn KeyValueStorage> = match settings.backend {
        StorageBackend::Memory => Arc::new(MemoryStorage::new()),
        StorageBackend::JsonFile => {
            let path = match &settings.path {
                Some(path) => path.clone(),
                None => JsonFileStorage::default_path()?,
            };
            Arc::new(JsonFileStorage::open(path)?)
        }
        StorageBackend::Redb => {
            let path = match &settings.path {
                Some(path) => path.clone(),
                None => RedbStorage::default_path()?,
            };
            Arc::new(RedbStorage::open(path)?)
        }
    };
    info!("[Storage] Using {} backend", storage.name());
    Ok(storage)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_memory_round_trip() {
        let storage = MemoryStorage::new();
        assert_eq!(storage.get("favorites").unwrap(), None);
        storage.set("favorites", "[\"bmi\"]").unwrap();
        assert_eq!(storage.get("favorites").unwrap().as_deref(), Some("[\"bmi\"]"));
    }

    #[test]
    fn test_json_file_persists_across_opens() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join(JSON_FILE_NAME);

        let storage = JsonFileStorage::open(&path).unwrap();
        storage.set("recents", "[\"loan\"]").unwrap();
        drop(storage);

        let reopened = JsonFileStorage::open(&path).unwrap();
        assert_eq!(reopened.get("recents").unwrap().as_deref(), Some("[\"loan\"]"));
    }

    #[test]
    fn test_json_file_corrupt_starts_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(JSON_FILE_NAME);
        std::fs::write(&path, "{not json").unwrap();

        let storage = JsonFileStorage::open(&path).unwrap();
        assert_eq!(storage.get("favorites").unwrap(), None);
        storage.set("favorites", "[]").unwrap();
        assert_eq!(JsonFileStorage::open(&path).unwrap().get("favorites").unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn test_json_file_failed_write_keeps_previous_value() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(JSON_FILE_NAME);

        let storage = JsonFileStorage::open(&path).unwrap();
        storage.set("favorites", "[\"bmi\"]").unwrap();
        storage.set("recents", "[\"loan\"]").unwrap();

        // A directory in place of the file makes every write fail
        std::fs::remove_file(&path).unwrap();
        std::fs::create_dir(&path).unwrap();

        assert!(matches!(storage.set("favorites", "[]"), Err(StorageError::Unavailable(_))));
        assert!(storage.set("categoryOrder", "[\"math\"]").is_err());
        assert_eq!(storage.get("favorites").unwrap().as_deref(), Some("[\"bmi\"]"));
        assert_eq!(storage.get("categoryOrder").unwrap(), None);
    }

    #[test]
    fn test_redb_persists_across_opens() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(REDB_FILE_NAME);

        let storage = RedbStorage::open(&path).unwrap();
        assert_eq!(storage.get("categoryOrder").unwrap(), None);
        storage.set("categoryOrder", "[\"math\"]").unwrap();
        storage.set("categoryOrder", "[\"health\"]").unwrap();
        drop(storage);

        let reopened = RedbStorage::open(&path).unwrap();
        assert_eq!(reopened.get("categoryOrder").unwrap().as_deref(), Some("[\"health\"]"));
    }

    #[test]
    fn test_open_storage_selects_backend() {
        let dir = TempDir::new().unwrap();
        let settings = StorageSettings {
            backend: StorageBackend::Redb,
            path: Some(dir.path().join(REDB_FILE_NAME)),
        };
        assert_eq!(open_storage(&settings).unwrap().name(), "redb");

        let settings = StorageSettings { backend: StorageBackend::Memory, path: None };
        assert_eq!(open_storage(&settings).unwrap().name(), "memory");
    }
}
