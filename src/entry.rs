//! KeyEntry
//!
//! One key, backed by one file.
//!
//! ## Responsibilities
//! - Read, write and remove the key file
//! - Cache the decoded document after the first read or write
//! - Track the last access time (in memory only)
//!
//! ## Concurrency:
//! - One `RwLock` per entry guards the cache and the file
//! - Cached reads share the lock; a cache miss takes an upgradable read,
//!   re-checks, loads from disk, and upgrades only to store the document
//! - Writes and deletes hold the exclusive lock for the whole call
//! - Once deleted, an entry is dead: reads fail with `KeyNotFound` and
//!   writes hand their document back so the collection can retry on a
//!   fresh entry

use std::fs::{self, File};
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use parking_lot::{RwLock, RwLockUpgradableReadGuard};
use serde::Serialize;
use serde_json::Value;
use tracing::trace;

use crate::codec;
use crate::config::{Config, WriteMode};
use crate::error::{FsDbError, Result};
use crate::naming;

/// Outcome of a write against a single entry
#[derive(Debug)]
pub enum Written {
    /// The document is on disk and cached
    Stored,

    /// The entry was deleted concurrently; nothing was written
    Detached(Value),
}

/// In-memory handle for one key file
#[derive(Debug)]
pub struct KeyEntry {
    /// Owning collection name (for errors and logs)
    collection: String,

    /// Key name, equal to the file's base name
    name: String,

    /// Path of the key file
    path: PathBuf,

    /// Unix millis of the most recent read or write, 0 = never
    last_access: AtomicU64,

    /// Cache and liveness, guarded together with the file
    state: RwLock<EntryState>,
}

#[derive(Debug, Default)]
struct EntryState {
    cached: Option<Arc<Value>>,
    deleted: bool,
}

/// Serializable view of an entry for diagnostics
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct KeySnapshot {
    name: String,
    last_access: Option<u64>,
    content: Option<Value>,
}

impl KeyEntry {
    /// Create a handle for `dir/name`. Does not touch the filesystem.
    pub fn new(collection: &str, name: &str, dir: &Path) -> Self {
        Self {
            collection: collection.to_string(),
            name: name.to_string(),
            path: dir.join(name),
            last_access: AtomicU64::new(0),
            state: RwLock::new(EntryState::default()),
        }
    }

    /// Read the key's document, from cache if present
    pub fn read(&self) -> Result<Arc<Value>> {
        {
            let state = self.state.read();
            self.ensure_live(&state)?;
            self.touch();

            if let Some(document) = &state.cached {
                trace!(collection = %self.collection, key = %self.name, "cache hit");
                return Ok(Arc::clone(document));
            }
        }

        // Upgradable: plain readers keep sharing the lock while we load
        let state = self.state.upgradable_read();
        self.ensure_live(&state)?;

        // Another reader may have filled the cache while we waited
        if let Some(document) = &state.cached {
            return Ok(Arc::clone(document));
        }

        trace!(collection = %self.collection, key = %self.name, "cache miss, loading from disk");
        let file = File::open(&self.path)?;
        let document = Arc::new(codec::decode(BufReader::new(file))?);

        let mut state = RwLockUpgradableReadGuard::upgrade(state);
        state.cached = Some(Arc::clone(&document));

        Ok(document)
    }

    /// Write a document to the key file and cache it
    pub fn write(&self, document: Value, config: &Config) -> Result<Written> {
        let mut state = self.state.write();
        if state.deleted {
            return Ok(Written::Detached(document));
        }
        self.touch();

        let bytes = codec::encode(&document)?;
        match config.write_mode {
            WriteMode::Atomic => self.write_atomic(&bytes, config.sync_writes)?,
            WriteMode::InPlace => write_file(&self.path, &bytes, config.sync_writes)?,
        }

        state.cached = Some(Arc::new(document));
        Ok(Written::Stored)
    }

    /// Remove the key file and mark this entry dead
    ///
    /// On failure the entry stays live and keeps its cache.
    pub fn delete(&self) -> Result<()> {
        let mut state = self.state.write();
        self.ensure_live(&state)?;

        fs::remove_file(&self.path)?;
        state.deleted = true;
        state.cached = None;

        Ok(())
    }

    /// Drop the cached document if it was not accessed within `idle`
    ///
    /// Returns true if a cached document was dropped.
    pub fn evict_if_idle(&self, now: SystemTime, idle: Duration) -> bool {
        let mut state = self.state.write();
        if state.cached.is_none() {
            return false;
        }

        let idle_enough = match self.last_access() {
            Some(at) => now.duration_since(at).map_or(false, |age| age >= idle),
            None => true,
        };
        if idle_enough {
            state.cached = None;
        }
        idle_enough
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Key name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Path of the key file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Time of the most recent read or write through this entry
    pub fn last_access(&self) -> Option<SystemTime> {
        match self.last_access.load(Ordering::Acquire) {
            0 => None,
            millis => Some(UNIX_EPOCH + Duration::from_millis(millis)),
        }
    }

    /// Whether a decoded document is held in memory
    pub fn is_cached(&self) -> bool {
        self.state.read().cached.is_some()
    }

    pub(crate) fn snapshot(&self) -> KeySnapshot {
        let state = self.state.read();
        KeySnapshot {
            name: self.name.clone(),
            last_access: match self.last_access.load(Ordering::Acquire) {
                0 => None,
                millis => Some(millis),
            },
            content: state.cached.as_deref().cloned(),
        }
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn ensure_live(&self, state: &EntryState) -> Result<()> {
        if state.deleted {
            return Err(FsDbError::key_not_found(&self.collection, &self.name));
        }
        Ok(())
    }

    fn touch(&self) {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(1)
            .max(1);
        self.last_access.store(millis, Ordering::Release);
    }

    /// Write a sibling temp file, then rename it over the key file
    fn write_atomic(&self, bytes: &[u8], sync: bool) -> Result<()> {
        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        let temp_path = naming::temp_path(dir, &self.name);

        let result = write_file(&temp_path, bytes, sync)
            .and_then(|()| fs::rename(&temp_path, &self.path).map_err(FsDbError::from));

        if result.is_err() {
            // The temp file may not exist if creation itself failed
            let _ = fs::remove_file(&temp_path);
        }
        result
    }
}

/// Create or truncate `path` and write `bytes` to it
fn write_file(path: &Path, bytes: &[u8], sync: bool) -> Result<()> {
    let mut file = File::create(path)?;
    file.write_all(bytes)?;
    if sync {
        file.sync_all()?;
    }
    Ok(())
}
