//! # fsdb
//!
//! An embedded key-value store that maps a two-level namespace straight
//! onto the filesystem:
//! - One directory per collection, one file per key
//! - Each key file holds a single JSON document
//! - Key names are discovered eagerly on open, content is loaded lazily
//!   and cached after first access
//! - One read/write lock per key; different keys never contend
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                          Store                               │
//! │          (root dir, RwLock<collection name → Collection>)    │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                        Collection                            │
//! │          (one directory, RwLock<key name → KeyEntry>)        │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                         KeyEntry                             │
//! │     (one file, RwLock over cached document + file I/O)       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use fsdb::Store;
//!
//! # fn main() -> fsdb::Result<()> {
//! let store = Store::open_path("./fsdb_data")?;
//! store.write("users", "alice", &vec![1, 2, 3])?;
//! let value: Vec<u32> = store.read("users", "alice")?;
//! assert_eq!(value, vec![1, 2, 3]);
//! # Ok(())
//! # }
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod codec;
pub mod naming;
pub mod entry;
pub mod collection;
pub mod store;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{FsDbError, Result};
pub use config::{Config, WriteMode};
pub use collection::Collection;
pub use entry::KeyEntry;
pub use store::Store;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of fsdb
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
