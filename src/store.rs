//! Store Module
//!
//! The entry point that owns the root directory and its collections.
//!
//! ## Responsibilities
//! - Ensure the root directory exists on open
//! - Discover collections and key names eagerly (content stays on disk)
//! - Create collections lazily on first write; reads never create anything
//! - Route operations to the owning Collection
//!
//! ## Layout
//! ```text
//! <root>/
//!   <collection>/      one directory per collection
//!     <key>            one JSON document per key
//! ```

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::fs;
use std::io;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::collection::{Collection, CollectionSnapshot};
use crate::config::Config;
use crate::error::{FsDbError, Result};
use crate::naming;

/// A filesystem-backed key-value store
///
/// ## Concurrency Model
///
/// - `collections`: RwLock guarding only the map structure
///   - Lookups share the lock, first-write creation takes it exclusively
///   - Collection handles are cloned out before any I/O happens
/// - Each Collection guards its own key map the same way
/// - Each KeyEntry owns a RwLock over its cache and file
///
/// All methods take `&self`; share a Store across threads with `Arc`.
pub struct Store {
    /// Store configuration
    config: Arc<Config>,

    /// Collection name → collection
    collections: RwLock<HashMap<String, Arc<Collection>>>,
}

/// Serializable view of the whole store for diagnostics
#[derive(Serialize)]
struct StoreSnapshot {
    collections: BTreeMap<String, CollectionSnapshot>,
}

impl Store {
    /// Open or create a store with the given config
    ///
    /// On startup:
    /// 1. Create the root directory if it doesn't exist
    /// 2. Open a Collection for every child directory
    /// 3. Each Collection registers its key files (no content loaded)
    pub fn open(config: Config) -> Result<Self> {
        let root = config.root.clone();

        match fs::metadata(&root) {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => {
                return Err(FsDbError::Io(io::Error::new(
                    io::ErrorKind::Other,
                    format!("store root is not a directory: {}", root.display()),
                )))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                fs::create_dir_all(&root)?;
                debug!(root = %root.display(), "created store root");
            }
            Err(e) => return Err(e.into()),
        }

        let config = Arc::new(config);
        let mut collections = HashMap::new();

        for dirent in fs::read_dir(&root)? {
            let dirent = dirent?;
            if !dirent.file_type()?.is_dir() {
                continue;
            }

            let Some(name) = dirent.file_name().to_str().map(str::to_owned) else {
                warn!(path = %dirent.path().display(), "skipping non UTF-8 directory name");
                continue;
            };
            if naming::validate(&name).is_err() {
                warn!(collection = %name, "skipping directory with reserved name");
                continue;
            }

            let collection = Collection::open(&name, dirent.path(), Arc::clone(&config))?;
            collections.insert(name, Arc::new(collection));
        }

        debug!(
            root = %root.display(),
            collections = collections.len(),
            "opened store"
        );

        Ok(Self {
            config,
            collections: RwLock::new(collections),
        })
    }

    /// Open with a path (convenience method)
    ///
    /// Uses default config with the specified root directory
    pub fn open_path(path: impl AsRef<Path>) -> Result<Self> {
        Self::open(Config::builder().root(path.as_ref()).build())
    }

    /// Write `value` to `key` in `collection`
    ///
    /// Creates the collection directory and the key file as needed.
    pub fn write<T: Serialize + ?Sized>(&self, collection: &str, key: &str, value: &T) -> Result<()> {
        naming::validate(collection)?;
        naming::validate(key)?;

        self.collection_or_create(collection)?.write(key, value)
    }

    /// Read `key` from `collection`, decoded into `T`
    pub fn read<T: DeserializeOwned>(&self, collection: &str, key: &str) -> Result<T> {
        naming::validate(collection)?;
        self.collection(collection)?.read(key)
    }

    /// Read `key` from `collection` as its raw JSON document
    pub fn read_value(&self, collection: &str, key: &str) -> Result<Value> {
        naming::validate(collection)?;
        let document = self.collection(collection)?.read_document(key)?;
        Ok(Value::clone(&document))
    }

    /// Delete `key` from `collection`, removing its file
    pub fn delete(&self, collection: &str, key: &str) -> Result<()> {
        naming::validate(collection)?;
        self.collection(collection)?.delete(key)
    }

    /// Key names in `collection`, in no particular order
    ///
    /// An unknown collection lists as empty.
    pub fn list(&self, collection: &str) -> Vec<String> {
        self.collection(collection)
            .map(|c| c.keys())
            .unwrap_or_default()
    }

    /// Known collection names, in no particular order
    pub fn collections(&self) -> Vec<String> {
        self.collections.read().keys().cloned().collect()
    }

    /// Whether `key` is currently known in `collection`
    pub fn contains(&self, collection: &str, key: &str) -> bool {
        self.collection(collection)
            .map(|c| c.contains(key))
            .unwrap_or(false)
    }

    /// Drop cached documents that have not been read or written within `idle`
    ///
    /// Returns the number of documents dropped. Nothing is evicted unless
    /// this is called.
    pub fn evict_idle(&self, idle: Duration) -> usize {
        let now = SystemTime::now();
        let evicted: usize = self
            .all_collections()
            .iter()
            .map(|c| c.evict_idle(now, idle))
            .sum();

        debug!(evicted, idle_ms = idle.as_millis() as u64, "evicted idle cache entries");
        evicted
    }

    /// Dump the whole in-memory tree as `FSDB: <json>` for debugging
    ///
    /// Returns an empty string if the tree cannot be serialized.
    pub fn dump(&self) -> String {
        let snapshot = StoreSnapshot {
            collections: self
                .all_collections()
                .iter()
                .map(|c| (c.name().to_string(), c.snapshot()))
                .collect(),
        };

        match serde_json::to_string(&snapshot) {
            Ok(json) => format!("FSDB: {}", json),
            Err(e) => {
                debug!(error = %e, "store dump failed");
                String::new()
            }
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Root directory of the store
    pub fn root(&self) -> &Path {
        &self.config.root
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn collection(&self, name: &str) -> Result<Arc<Collection>> {
        self.collections
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| FsDbError::CollectionNotFound(name.to_string()))
    }

    /// Insert-if-absent under the map's write lock
    fn collection_or_create(&self, name: &str) -> Result<Arc<Collection>> {
        if let Some(collection) = self.collections.read().get(name) {
            return Ok(Arc::clone(collection));
        }

        let mut collections = self.collections.write();
        if let Some(collection) = collections.get(name) {
            return Ok(Arc::clone(collection));
        }

        let path = self.config.root.join(name);
        let collection = Arc::new(Collection::open(name, path, Arc::clone(&self.config))?);
        collections.insert(name.to_string(), Arc::clone(&collection));

        debug!(collection = %name, "created collection");
        Ok(collection)
    }

    fn all_collections(&self) -> Vec<Arc<Collection>> {
        self.collections.read().values().cloned().collect()
    }
}

impl fmt::Display for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.dump())
    }
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("root", &self.config.root)
            .field("collections", &self.collections.read().len())
            .finish()
    }
}
