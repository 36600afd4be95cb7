//! Key-value persistence port.
//!
//! The rest of the core never touches storage directly: navigation and the
//! session-append boundary go through a [`KeyValueStore`]. Two backends:
//! - [`MemoryStore`] for tests and dry runs
//! - [`FileStore`], a single JSON object on disk written atomically under a
//!   file lock

use crate::{Error, Result, SessionLog};
use fs2::FileExt;
use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Store key: "true" once the health disclaimer was accepted
pub const KEY_HEALTH_CHECK: &str = "saunaflow_health_check_accepted";
/// Store key: the selected goal
pub const KEY_GOAL: &str = "saunaflow_goal";
/// Store key: the user's name
pub const KEY_USER_NAME: &str = "saunaflow_username";
/// Store key: JSON array of session logs
pub const KEY_HISTORY: &str = "saunaflow_history";

/// String key-value storage
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;
    fn clear(&mut self) -> Result<()>;

    /// Read, transform and write back one key as a single step
    ///
    /// Backends shared between processes override this so no other writer
    /// can slip in between the read and the write.
    fn modify(
        &mut self,
        key: &str,
        f: &mut dyn FnMut(Option<String>) -> Result<String>,
    ) -> Result<()> {
        let next = f(self.get(key)?)?;
        self.set(key, &next)
    }
}

/// Session sink trait for persisting completed sessions
pub trait SessionSink {
    fn append(&mut self, log: &SessionLog) -> Result<()>;
}

impl<S: KeyValueStore> SessionSink for S {
    fn append(&mut self, log: &SessionLog) -> Result<()> {
        crate::history::append_session(self, log).map(|_| ())
    }
}

// ============================================================================
// In-memory store
// ============================================================================

/// Volatile store backed by a map
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        self.entries.clear();
        Ok(())
    }
}

// ============================================================================
// File store
// ============================================================================

/// Store persisted as one JSON object file
///
/// All access is serialized through a sidecar lock file next to the store
/// (`store.json.lock`): reads hold it shared, every read-modify-write holds
/// it exclusively from load to rename. Writes go through a temp file and an
/// atomic rename, so a crash never leaves a half-written store behind.
#[derive(Clone, Debug)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store file inside a data directory
    pub fn in_dir(data_dir: &Path) -> Self {
        Self::new(data_dir.join("store.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_path(&self) -> PathBuf {
        let mut name = self.path.clone().into_os_string();
        name.push(".lock");
        PathBuf::from(name)
    }

    fn parent(&self) -> Result<&Path> {
        self.path
            .parent()
            .ok_or_else(|| Error::Other(format!("store path {:?} has no parent", self.path)))
    }

    /// Open the sidecar lock file and lock it; released when the file drops
    fn lock(&self, exclusive: bool) -> Result<File> {
        std::fs::create_dir_all(self.parent()?)?;
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(self.lock_path())?;

        if exclusive {
            file.lock_exclusive()?;
        } else {
            FileExt::lock_shared(&file)?;
        }
        Ok(file)
    }

    /// Load all entries; the caller holds the lock
    ///
    /// A missing or blank file is an empty store. A file that does not parse
    /// is logged and treated as empty so the next write replaces it. Failing
    /// to open or read the file is an error: writing defaults over a store we
    /// could not read would destroy it.
    fn read_entries(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }

        let mut contents = String::new();
        File::open(&self.path)?.read_to_string(&mut contents)?;

        if contents.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        match serde_json::from_str::<BTreeMap<String, String>>(&contents) {
            Ok(entries) => Ok(entries),
            Err(e) => {
                tracing::warn!(
                    "Failed to parse store {:?}: {}. Using empty store.",
                    self.path,
                    e
                );
                Ok(BTreeMap::new())
            }
        }
    }

    /// Atomically replace the store file; the caller holds the lock
    fn save(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        let temp = NamedTempFile::new_in(self.parent()?)?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            serde_json::to_writer(&mut writer, entries)?;
            writer.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.persist(&self.path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!("Saved {} store entries to {:?}", entries.len(), self.path);
        Ok(())
    }

    /// Load, change and save the entries under the exclusive lock
    fn update<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce(&mut BTreeMap<String, String>) -> Result<()>,
    {
        let _lock = self.lock(true)?;
        let mut entries = self.read_entries()?;
        f(&mut entries)?;
        self.save(&entries)
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let _lock = self.lock(false)?;
        Ok(self.read_entries()?.remove(key))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.update(|entries| {
            entries.insert(key.to_string(), value.to_string());
            Ok(())
        })
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.update(|entries| {
            entries.remove(key);
            Ok(())
        })
    }

    fn clear(&mut self) -> Result<()> {
        let _lock = self.lock(true)?;
        self.save(&BTreeMap::new())
    }

    fn modify(
        &mut self,
        key: &str,
        f: &mut dyn FnMut(Option<String>) -> Result<String>,
    ) -> Result<()> {
        self.update(|entries| {
            let next = f(entries.remove(key))?;
            entries.insert(key.to_string(), next);
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exercise(store: &mut dyn KeyValueStore) {
        assert_eq!(store.get("a").unwrap(), None);

        store.set("a", "1").unwrap();
        store.set("b", "two").unwrap();
        assert_eq!(store.get("a").unwrap().as_deref(), Some("1"));

        store.set("a", "3").unwrap();
        assert_eq!(store.get("a").unwrap().as_deref(), Some("3"));

        store.remove("a").unwrap();
        assert_eq!(store.get("a").unwrap(), None);
        assert_eq!(store.get("b").unwrap().as_deref(), Some("two"));

        store.clear().unwrap();
        assert_eq!(store.get("b").unwrap(), None);
    }

    #[test]
    fn test_memory_store_contract() {
        exercise(&mut MemoryStore::new());
    }

    #[test]
    fn test_file_store_contract() {
        let temp_dir = tempfile::tempdir().unwrap();
        exercise(&mut FileStore::in_dir(temp_dir.path()));
    }

    #[test]
    fn test_file_store_persists_across_instances() {
        let temp_dir = tempfile::tempdir().unwrap();
        FileStore::in_dir(temp_dir.path())
            .set(KEY_USER_NAME, "Aino")
            .unwrap();

        let reopened = FileStore::in_dir(temp_dir.path());
        assert_eq!(
            reopened.get(KEY_USER_NAME).unwrap().as_deref(),
            Some("Aino")
        );
    }

    #[test]
    fn test_file_store_creates_parent_dirs() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::new(temp_dir.path().join("nested/deeper/store.json"));
        store.set(KEY_GOAL, "Relax").unwrap();
        assert!(store.path().exists());
    }

    #[test]
    fn test_corrupted_file_reads_as_empty() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::in_dir(temp_dir.path());
        std::fs::write(store.path(), "{ invalid json }}}").unwrap();

        assert_eq!(store.get(KEY_GOAL).unwrap(), None);

        // writing over a corrupted file recovers it
        store.set(KEY_GOAL, "Relax").unwrap();
        assert_eq!(store.get(KEY_GOAL).unwrap().as_deref(), Some("Relax"));
    }

    #[test]
    fn test_atomic_save_leaves_no_temp_files() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::in_dir(temp_dir.path());
        store.set("k", "v").unwrap();

        let extras: Vec<_> = std::fs::read_dir(temp_dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name() != "store.json" && e.file_name() != "store.json.lock")
            .collect();
        assert!(
            extras.is_empty(),
            "Expected only the store and its lock, found extras: {:?}",
            extras
        );
    }

    #[test]
    fn test_unreadable_store_is_not_overwritten() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::in_dir(temp_dir.path());
        // A directory where the file should be: opening works, reading fails
        std::fs::create_dir(store.path()).unwrap();

        assert!(store.get(KEY_GOAL).is_err());
        assert!(store.set(KEY_GOAL, "Relax").is_err());
        assert!(store.path().is_dir());
    }

    #[test]
    fn test_modify_sees_current_value() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::in_dir(temp_dir.path());
        store.set("count", "1").unwrap();

        store
            .modify("count", &mut |current: Option<String>| {
                let n: u32 = current.as_deref().unwrap_or("0").parse().unwrap();
                Ok((n + 1).to_string())
            })
            .unwrap();

        assert_eq!(store.get("count").unwrap().as_deref(), Some("2"));
    }

    #[test]
    fn test_parallel_modifies_are_serialized() {
        let temp_dir = tempfile::tempdir().unwrap();
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let mut store = FileStore::in_dir(temp_dir.path());
                std::thread::spawn(move || {
                    for _ in 0..25 {
                        store
                            .modify("count", &mut |current: Option<String>| {
                                let n: u32 = current.as_deref().unwrap_or("0").parse().unwrap();
                                Ok((n + 1).to_string())
                            })
                            .unwrap();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        let store = FileStore::in_dir(temp_dir.path());
        assert_eq!(store.get("count").unwrap().as_deref(), Some("100"));
    }
}
