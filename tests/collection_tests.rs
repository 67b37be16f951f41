//! Tests for Collection
//!
//! These tests verify:
//! - Directory creation and key discovery on open
//! - Lazy entry creation on write, none on read
//! - Delete removes both the file and the map entry
//! - Name validation
//! - Typed decoding and its error kinds

use std::collections::HashMap;
use std::fs;
use std::sync::Arc;

use fsdb::collection::Collection;
use fsdb::config::Config;
use fsdb::FsDbError;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn open_collection(temp_dir: &TempDir, name: &str) -> Collection {
    let config = Arc::new(Config::builder().root(temp_dir.path()).build());
    Collection::open(name, temp_dir.path().join(name), config).unwrap()
}

fn sorted(mut names: Vec<String>) -> Vec<String> {
    names.sort();
    names
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Profile {
    name: String,
    age: u32,
    tags: Vec<String>,
}

// =============================================================================
// Open Tests
// =============================================================================

#[test]
fn test_open_creates_directory() {
    let temp_dir = TempDir::new().unwrap();

    let collection = open_collection(&temp_dir, "users");

    assert!(temp_dir.path().join("users").is_dir());
    assert_eq!(collection.name(), "users");
    assert_eq!(collection.path(), temp_dir.path().join("users"));
    assert!(collection.is_empty());
}

#[test]
fn test_open_discovers_files_only() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path().join("users");
    fs::create_dir(&dir).unwrap();
    fs::write(dir.join("alice"), b"1").unwrap();
    fs::write(dir.join("bob"), b"2").unwrap();
    fs::create_dir(dir.join("nested")).unwrap();

    let collection = open_collection(&temp_dir, "users");

    assert_eq!(sorted(collection.keys()), vec!["alice", "bob"]);
    assert_eq!(collection.len(), 2);
    assert!(!collection.contains("nested"));
}

#[test]
fn test_open_removes_orphaned_temp_files() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path().join("users");
    fs::create_dir(&dir).unwrap();
    fs::write(dir.join("alice"), b"1").unwrap();
    fs::write(dir.join(".alice.fsdb-tmp"), b"{\"half").unwrap();

    let collection = open_collection(&temp_dir, "users");

    assert_eq!(collection.keys(), vec!["alice".to_string()]);
    assert!(!dir.join(".alice.fsdb-tmp").exists());
}

#[test]
fn test_open_keeps_user_files_with_temp_suffix() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path().join("users");
    fs::create_dir(&dir).unwrap();
    fs::write(dir.join("notes.fsdb-tmp"), b"\"mine\"").unwrap();
    fs::write(dir.join(".fsdb-tmp"), b"1").unwrap();
    fs::write(dir.join(".bob.fsdb-tmp"), b"{").unwrap();

    let collection = open_collection(&temp_dir, "users");

    assert_eq!(sorted(collection.keys()), vec![".fsdb-tmp", "notes.fsdb-tmp"]);
    assert!(dir.join("notes.fsdb-tmp").exists());
    assert!(!dir.join(".bob.fsdb-tmp").exists());
    assert_eq!(collection.read::<String>("notes.fsdb-tmp").unwrap(), "mine");
}

#[test]
fn test_open_over_file_fails_with_io() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("users"), b"not a dir").unwrap();
    let config = Arc::new(Config::default());

    let result = Collection::open("users", temp_dir.path().join("users"), config);

    assert!(matches!(result, Err(FsDbError::Io(_))));
}

// =============================================================================
// Read / Write Tests
// =============================================================================

#[test]
fn test_write_then_read_struct() {
    let temp_dir = TempDir::new().unwrap();
    let collection = open_collection(&temp_dir, "users");
    let profile = Profile {
        name: "Alice".to_string(),
        age: 30,
        tags: vec!["admin".to_string(), "ops".to_string()],
    };

    collection.write("alice", &profile).unwrap();
    let loaded: Profile = collection.read("alice").unwrap();

    assert_eq!(loaded, profile);
    assert!(temp_dir.path().join("users").join("alice").is_file());
}

#[test]
fn test_discovered_key_is_decoded_on_first_read() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path().join("users");
    fs::create_dir(&dir).unwrap();
    fs::write(dir.join("bob"), br#"{"name":"Bob","age":41,"tags":[]}"#).unwrap();

    let collection = open_collection(&temp_dir, "users");
    let loaded: Profile = collection.read("bob").unwrap();

    assert_eq!(loaded.name, "Bob");
    assert_eq!(loaded.age, 41);
}

#[test]
fn test_read_unknown_key_is_not_found() {
    let temp_dir = TempDir::new().unwrap();
    let collection = open_collection(&temp_dir, "users");

    let result = collection.read::<u32>("nobody");

    match result {
        Err(FsDbError::KeyNotFound { collection, key }) => {
            assert_eq!(collection, "users");
            assert_eq!(key, "nobody");
        }
        other => panic!("expected KeyNotFound, got {:?}", other),
    }
    assert!(!collection.contains("nobody"));
}

#[test]
fn test_read_wrong_shape_is_serialization_error() {
    let temp_dir = TempDir::new().unwrap();
    let collection = open_collection(&temp_dir, "users");
    collection.write("alice", &json!({"unexpected": true})).unwrap();

    let result = collection.read::<Profile>("alice");
    assert!(matches!(result, Err(FsDbError::Serialization(_))));

    // The cached document is unaffected by a failed decode
    let doc = collection.read_document("alice").unwrap();
    assert_eq!(*doc, json!({"unexpected": true}));
}

#[test]
fn test_write_unrepresentable_value_fails_before_io() {
    let temp_dir = TempDir::new().unwrap();
    let collection = open_collection(&temp_dir, "users");
    let mut value: HashMap<(u32, u32), u32> = HashMap::new();
    value.insert((1, 2), 3);

    let result = collection.write("pairs", &value);

    assert!(matches!(result, Err(FsDbError::Serialization(_))));
    assert!(!collection.contains("pairs"));
    assert!(!temp_dir.path().join("users").join("pairs").exists());
}

// =============================================================================
// Delete Tests
// =============================================================================

#[test]
fn test_delete_removes_file_and_key() {
    let temp_dir = TempDir::new().unwrap();
    let collection = open_collection(&temp_dir, "users");
    collection.write("a", &1).unwrap();
    collection.write("b", &2).unwrap();
    collection.write("c", &3).unwrap();

    collection.delete("b").unwrap();

    assert_eq!(sorted(collection.keys()), vec!["a", "c"]);
    assert!(!temp_dir.path().join("users").join("b").exists());
    assert!(collection.read::<u32>("b").unwrap_err().is_not_found());
}

#[test]
fn test_delete_unknown_key_is_not_found() {
    let temp_dir = TempDir::new().unwrap();
    let collection = open_collection(&temp_dir, "users");

    let result = collection.delete("ghost");

    assert!(matches!(result, Err(FsDbError::KeyNotFound { .. })));
}

#[test]
fn test_delete_vanished_file_keeps_key() {
    let temp_dir = TempDir::new().unwrap();
    let collection = open_collection(&temp_dir, "users");
    collection.write("a", &1).unwrap();
    fs::remove_file(temp_dir.path().join("users").join("a")).unwrap();

    let result = collection.delete("a");

    assert!(matches!(result, Err(FsDbError::Io(_))));
    assert!(collection.contains("a"));
}

#[test]
fn test_write_after_delete_recreates_key() {
    let temp_dir = TempDir::new().unwrap();
    let collection = open_collection(&temp_dir, "users");
    collection.write("a", &1).unwrap();
    collection.delete("a").unwrap();

    collection.write("a", &2).unwrap();

    assert_eq!(collection.read::<u32>("a").unwrap(), 2);
}

// =============================================================================
// Naming Tests
// =============================================================================

#[test]
fn test_invalid_key_names_are_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let collection = open_collection(&temp_dir, "users");

    for name in ["", ".", "..", "a/b", "a\\b", "../escape", ".x.fsdb-tmp"] {
        let result = collection.write(name, &1);
        assert!(
            matches!(result, Err(FsDbError::InvalidName(_))),
            "name {:?} should be rejected",
            name
        );
    }
    assert!(collection.is_empty());
    assert!(!temp_dir.path().join("escape").exists());
}
