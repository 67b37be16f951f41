//! Collection and key names
//!
//! Names map one-to-one onto directory and file base names, so each must be
//! a single plain path component.

use std::path::{Path, PathBuf};

use crate::error::{FsDbError, Result};

/// Suffix reserved for in-flight atomic writes
pub const TEMP_SUFFIX: &str = ".fsdb-tmp";

/// Reject names that would escape or alias their parent directory
pub fn validate(name: &str) -> Result<()> {
    let invalid = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\', '\0'])
        || is_temp_name(name);

    if invalid {
        return Err(FsDbError::InvalidName(name.to_string()));
    }
    Ok(())
}

/// True for names of the form `.<key>.fsdb-tmp`, as made by [`temp_path`]
pub fn is_temp_name(name: &str) -> bool {
    name.strip_prefix('.')
        .and_then(|rest| rest.strip_suffix(TEMP_SUFFIX))
        .is_some_and(|key| !key.is_empty())
}

/// Sibling temp path used while atomically replacing `dir/name`
pub fn temp_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!(".{}{}", name, TEMP_SUFFIX))
}
