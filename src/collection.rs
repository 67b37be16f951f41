//! Collection
//!
//! One directory of key files.
//!
//! ## Responsibilities
//! - Discover existing key files when opened (names only, no content)
//! - Create entries on first write, drop them on delete
//! - Route reads, writes and deletes to the owning KeyEntry
//!
//! ## Concurrency:
//! - `keys`: RwLock guarding only the map structure (lookup/insert/remove)
//! - The map guard is always released before any entry I/O, so operations
//!   on different keys never wait on each other's files

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::codec;
use crate::config::Config;
use crate::entry::{KeyEntry, KeySnapshot, Written};
use crate::error::{FsDbError, Result};
use crate::naming;

/// A named group of keys backed by one directory
#[derive(Debug)]
pub struct Collection {
    /// Collection name, equal to the directory's base name
    name: String,

    /// Directory holding the key files
    path: PathBuf,

    /// Store configuration (write mode, sync policy)
    config: Arc<Config>,

    /// Key name → entry
    keys: RwLock<HashMap<String, Arc<KeyEntry>>>,
}

/// Serializable view of a collection for diagnostics
#[derive(Debug, Serialize)]
pub(crate) struct CollectionSnapshot {
    name: String,
    keys: BTreeMap<String, KeySnapshot>,
}

impl Collection {
    /// Open the collection at `path`, creating the directory if missing
    ///
    /// Every non-directory child becomes a key entry with nothing cached.
    /// Leftover temp files from interrupted atomic writes are removed.
    pub fn open(name: &str, path: PathBuf, config: Arc<Config>) -> Result<Self> {
        match fs::create_dir(&path) {
            Ok(()) => debug!(collection = %name, path = %path.display(), "created collection directory"),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {}
            Err(e) => return Err(e.into()),
        }

        let keys = Self::scan(name, &path)?;
        debug!(collection = %name, keys = keys.len(), "opened collection");

        Ok(Self {
            name: name.to_string(),
            path,
            config,
            keys: RwLock::new(keys),
        })
    }

    /// Write `value` to `key`, creating the entry if needed
    pub fn write<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        naming::validate(key)?;
        let mut document = codec::to_document(value)?;

        loop {
            let entry = self.entry_or_insert(key);
            match entry.write(document, &self.config)? {
                Written::Stored => return Ok(()),
                Written::Detached(returned) => {
                    // Lost a race with delete; retry on a fresh entry
                    self.forget(key, &entry);
                    document = returned;
                }
            }
        }
    }

    /// Read `key` decoded into `T`
    pub fn read<T: DeserializeOwned>(&self, key: &str) -> Result<T> {
        let document = self.read_document(key)?;
        codec::from_document(&document)
    }

    /// Read `key` as its raw decoded document
    pub fn read_document(&self, key: &str) -> Result<Arc<Value>> {
        naming::validate(key)?;
        self.entry(key)?.read()
    }

    /// Delete `key` and its file
    ///
    /// The entry is only dropped from the map once the file is gone.
    pub fn delete(&self, key: &str) -> Result<()> {
        naming::validate(key)?;
        let entry = self.entry(key)?;
        entry.delete()?;
        self.forget(key, &entry);

        debug!(collection = %self.name, key = %key, "deleted key");
        Ok(())
    }

    /// Current key names, in no particular order
    pub fn keys(&self) -> Vec<String> {
        self.keys.read().keys().cloned().collect()
    }

    /// Whether `key` is currently known
    pub fn contains(&self, key: &str) -> bool {
        self.keys.read().contains_key(key)
    }

    /// Number of known keys
    pub fn len(&self) -> usize {
        self.keys.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.read().is_empty()
    }

    /// Collection name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Directory holding the key files
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Drop cached documents idle for at least `idle`
    pub(crate) fn evict_idle(&self, now: SystemTime, idle: Duration) -> usize {
        self.entries()
            .iter()
            .filter(|entry| entry.evict_if_idle(now, idle))
            .count()
    }

    pub(crate) fn snapshot(&self) -> CollectionSnapshot {
        let keys = self
            .entries()
            .iter()
            .map(|entry| (entry.name().to_string(), entry.snapshot()))
            .collect();

        CollectionSnapshot {
            name: self.name.clone(),
            keys,
        }
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// Build the initial key map from the files in `path`
    fn scan(name: &str, path: &Path) -> Result<HashMap<String, Arc<KeyEntry>>> {
        let mut keys = HashMap::new();

        for dirent in fs::read_dir(path)? {
            let dirent = dirent?;
            if dirent.file_type()?.is_dir() {
                continue;
            }

            let Some(file_name) = dirent.file_name().to_str().map(str::to_owned) else {
                warn!(collection = %name, path = %dirent.path().display(), "skipping non UTF-8 file name");
                continue;
            };

            if naming::is_temp_name(&file_name) {
                warn!(collection = %name, file = %file_name, "removing orphaned temp file");
                if let Err(e) = fs::remove_file(dirent.path()) {
                    warn!(collection = %name, file = %file_name, error = %e, "failed to remove temp file");
                }
                continue;
            }

            let entry = KeyEntry::new(name, &file_name, path);
            keys.insert(file_name, Arc::new(entry));
        }

        Ok(keys)
    }

    fn entry(&self, key: &str) -> Result<Arc<KeyEntry>> {
        self.keys
            .read()
            .get(key)
            .cloned()
            .ok_or_else(|| FsDbError::key_not_found(&self.name, key))
    }

    /// Insert-if-absent under the map's write lock
    fn entry_or_insert(&self, key: &str) -> Arc<KeyEntry> {
        if let Some(entry) = self.keys.read().get(key) {
            return Arc::clone(entry);
        }

        let mut keys = self.keys.write();
        let entry = keys.entry(key.to_string()).or_insert_with(|| {
            debug!(collection = %self.name, key = %key, "creating key");
            Arc::new(KeyEntry::new(&self.name, key, &self.path))
        });
        Arc::clone(entry)
    }

    /// Remove `key` only if the map still points at `entry`
    fn forget(&self, key: &str, entry: &Arc<KeyEntry>) {
        let mut keys = self.keys.write();
        if keys.get(key).is_some_and(|current| Arc::ptr_eq(current, entry)) {
            keys.remove(key);
        }
    }

    fn entries(&self) -> Vec<Arc<KeyEntry>> {
        self.keys.read().values().cloned().collect()
    }
}
