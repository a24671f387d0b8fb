use super::*;
use serde::Deserialize;
use tempfile::TempDir;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Doc {
    count: u32,
    #[serde(default)]
    label: Option<String>,
}

fn doc(count: u32) -> Doc {
    Doc { count, label: None }
}

#[test]
fn test_store_with_path() {
    let store = JsonStore::new("/custom/path/ledger.json");
    assert_eq!(store.path(), Path::new("/custom/path/ledger.json"));
}

#[test]
fn test_load_missing_is_none() {
    let temp_dir = TempDir::new().unwrap();
    let store = JsonStore::new(temp_dir.path().join("missing.json"));

    assert!(!store.exists());
    let loaded: Option<Doc> = store.load().unwrap();
    assert!(loaded.is_none());
}

#[test]
fn test_save_and_load() {
    let temp_dir = TempDir::new().unwrap();
    let store = JsonStore::new(temp_dir.path().join("ledger.json"));

    store.save(&doc(7)).unwrap();
    assert!(store.exists());

    let loaded: Doc = store.load().unwrap().unwrap();
    assert_eq!(loaded, doc(7));
}

#[test]
fn test_save_creates_parent_dirs() {
    let temp_dir = TempDir::new().unwrap();
    let store = JsonStore::new(temp_dir.path().join("a/b/c/ledger.json"));

    store.save(&doc(1)).unwrap();
    assert!(store.exists());
}

#[test]
fn test_save_leaves_no_temp_file() {
    let temp_dir = TempDir::new().unwrap();
    let store = JsonStore::new(temp_dir.path().join("ledger.json"));

    store.save(&doc(1)).unwrap();
    store.save(&doc(2)).unwrap();

    let entries: Vec<_> = std::fs::read_dir(temp_dir.path())
        .unwrap()
        .flatten()
        .map(|e| e.file_name().to_string_lossy().to_string())
        .collect();
    assert_eq!(entries, vec!["ledger.json".to_string()]);
}

#[test]
fn test_load_corrupt_is_error() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("ledger.json");
    std::fs::write(&path, "{ not json").unwrap();

    let store = JsonStore::new(&path);
    let result = store.load::<Doc>();
    assert!(matches!(result, Err(Error::Corrupt { .. })));
}

#[test]
fn test_load_defaults_missing_fields() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("ledger.json");
    std::fs::write(&path, r#"{"count": 3}"#).unwrap();

    let loaded: Doc = JsonStore::new(&path).load().unwrap().unwrap();
    assert_eq!(loaded, doc(3));
}

#[test]
fn test_save_into_file_parent_fails() {
    let temp_dir = TempDir::new().unwrap();
    let blocker = temp_dir.path().join("blocker");
    std::fs::write(&blocker, "x").unwrap();

    let store = JsonStore::new(blocker.join("ledger.json"));
    assert!(matches!(store.save(&doc(1)), Err(Error::Io { .. })));
}

#[test]
fn test_remove() {
    let temp_dir = TempDir::new().unwrap();
    let store = JsonStore::new(temp_dir.path().join("ledger.json"));

    store.remove().unwrap();
    store.save(&doc(1)).unwrap();
    store.remove().unwrap();
    assert!(!store.exists());
}
