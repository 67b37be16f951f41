//! Configuration for fsdb
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

/// Main configuration for a Store instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Root directory of the store
    /// Internal structure:
    ///   {root}/
    ///     └── {collection}/
    ///           └── {key}      (one JSON document)
    pub root: PathBuf,

    // -------------------------------------------------------------------------
    // Write Configuration
    // -------------------------------------------------------------------------
    /// How a key's file is replaced on write
    pub write_mode: WriteMode,

    /// fsync each key file after writing it
    pub sync_writes: bool,
}

/// Strategy for replacing a key file on write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Write a sibling temp file, then rename it over the key file.
    /// Readers and crashes never observe a half-written file.
    Atomic,

    /// Truncate and rewrite the key file in place.
    /// A failed write can leave the file empty or partially written.
    InPlace,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root: PathBuf::from("./fsdb_data"),
            write_mode: WriteMode::Atomic,
            sync_writes: false,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the root directory of the store
    pub fn root(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.root = path.into();
        self
    }

    /// Set how key files are replaced on write
    pub fn write_mode(mut self, mode: WriteMode) -> Self {
        self.config.write_mode = mode;
        self
    }

    /// Enable or disable fsync after each write
    pub fn sync_writes(mut self, sync: bool) -> Self {
        self.config.sync_writes = sync;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
