//! Tests for the per-day log store: restart recovery, duplicates, levels, clear.

use chrono::NaiveDate;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

use textlog_common::line::format_line;
use textlog_common::record::{CRITICAL, DEBUG, ERROR, INFO, WARNING};
use textlog_common::{ErrorRecord, IdStore, LogError, LogStore, TextLogConfig};

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 2, 12).unwrap()
}

fn record(id: &str, level: &str) -> ErrorRecord {
    ErrorRecord::new(id, "IoError", "disk went away", "2024/02/12 10:15")
        .unwrap()
        .with_level(level)
        .unwrap()
}

fn open(folder: &Path) -> LogStore {
    LogStore::open_for_date(&TextLogConfig::with_folder(folder), day()).unwrap()
}

fn line_count(path: &Path) -> usize {
    fs::read_to_string(path).map(|c| c.lines().count()).unwrap_or(0)
}

#[test]
fn test_ids_survive_restarts() {
    let dir = tempdir().unwrap();
    let mut expected = HashSet::new();

    for batch in 0..3 {
        let mut store = open(dir.path());
        for i in 0..4 {
            let id = format!("{}-{}", batch, i);
            store.append(&record(&id, INFO)).unwrap();
            expected.insert(id);
        }
    }

    let store = open(dir.path());
    assert_eq!(store.existing_ids(), expected);
    assert_eq!(store.logged_ids(), &expected);
}

#[test]
fn test_duplicate_rejected_after_restart() {
    let dir = tempdir().unwrap();
    open(dir.path()).append(&record("dup", ERROR)).unwrap();

    let mut store = open(dir.path());
    let before = line_count(store.file_path());
    let err = store.append(&record("dup", DEBUG)).unwrap_err();

    assert!(matches!(
        err,
        LogError::DuplicateId {
            store: IdStore::File,
            ..
        }
    ));
    assert_eq!(line_count(store.file_path()), before);
}

#[test]
fn test_duplicate_in_same_session() {
    let dir = tempdir().unwrap();
    let mut store = open(dir.path());
    store.append(&record("1", ERROR)).unwrap();
    store.load_by_level(ERROR).unwrap();

    assert!(store.append(&record("1", ERROR)).unwrap_err().is_duplicate());
    assert_eq!(line_count(store.file_path()), 1);
    assert_eq!(store.load_by_level(ERROR).unwrap().len(), 1);
}

#[test]
fn test_levels_idempotent() {
    let dir = tempdir().unwrap();
    let mut store = open(dir.path());
    for (id, level) in [("1", ERROR), ("2", DEBUG), ("3", ERROR), ("4", CRITICAL)] {
        store.append(&record(id, level)).unwrap();
    }

    let first = store.levels().unwrap().clone();
    let second = store.levels().unwrap().clone();
    assert_eq!(first, second);

    let keys: Vec<_> = first.keys().map(String::as_str).collect();
    assert_eq!(keys, vec![CRITICAL, DEBUG, ERROR]);
    assert_eq!(first[ERROR].len(), 2);
}

#[test]
fn test_load_by_level_returns_only_that_level() {
    let dir = tempdir().unwrap();
    let mut store = open(dir.path());
    store.append(&record("1", ERROR)).unwrap();
    store.append(&record("2", WARNING)).unwrap();

    let warnings = store.load_by_level(WARNING).unwrap();
    assert_eq!(warnings, [format_line(&record("2", WARNING))]);
}

#[test]
fn test_line_format_on_disk() {
    let dir = tempdir().unwrap();
    let mut store = open(dir.path());
    let rec = ErrorRecord::new(42, "X", "Y", "2024/02/12 10:15")
        .unwrap()
        .with_user(None)
        .with_level(ERROR)
        .unwrap();
    store.append(&rec).unwrap();

    let content = fs::read_to_string(store.file_path()).unwrap();
    assert_eq!(
        content,
        "Trace ID: 42 Name: X Text: Y Date: 2024/02/12 10:15 User Name: None Level: ERROR\n"
    );
}

#[test]
fn test_truncated_fields_on_disk() {
    let dir = tempdir().unwrap();
    let mut store = open(dir.path());
    let rec = ErrorRecord::new("long", &"N".repeat(129), &"T".repeat(1025), "2024/02/12 10:15").unwrap();
    store.append(&rec).unwrap();

    let content = fs::read_to_string(store.file_path()).unwrap();
    let expected_name = format!("Name: {} Text:", "N".repeat(128));
    let expected_text = format!("Text: {} Date:", "T".repeat(1024));
    assert!(content.contains(&expected_name));
    assert!(content.contains(&expected_text));
}

#[test]
fn test_clear_empties_folder() {
    let dir = tempdir().unwrap();
    let folder = dir.path().join("AppLog");
    let mut store = open(&folder);
    store.append(&record("1", ERROR)).unwrap();
    fs::write(folder.join("2024_02_11.txt"), "Trace ID: old\n").unwrap();

    store.clear().unwrap();

    assert!(store.existing_ids().is_empty());
    assert!(store.logged_ids().is_empty());
    assert_eq!(fs::read_dir(&folder).unwrap().count(), 0);
    assert!(folder.is_dir());
}

#[test]
fn test_missing_folder_tolerated() {
    let dir = tempdir().unwrap();
    let folder = dir.path().join("not").join("there");

    let store = open(&folder);
    assert!(store.existing_ids().is_empty());
    assert!(folder.is_dir());
}

#[test]
fn test_table_mirror() {
    let dir = tempdir().unwrap();
    let config = TextLogConfig::with_folder(dir.path().join("logs")).with_table(dir.path().join("errors.db"));

    let mut store = LogStore::open_for_date(&config, day()).unwrap();
    assert!(store.has_table());
    store.append(&record("1", ERROR).with_user(Some("Alice"))).unwrap();
    store.append(&record("2", DEBUG)).unwrap();

    let table = store.table().unwrap();
    assert_eq!(table.count().unwrap(), 2);
    assert_eq!(table.by_level(ERROR).unwrap()[0].user_name.as_deref(), Some("Alice"));

    store.clear().unwrap();
    assert_eq!(store.table().unwrap().count().unwrap(), 0);
}

#[test]
fn test_table_catches_duplicates_from_other_days() {
    let dir = tempdir().unwrap();
    let config = TextLogConfig::with_folder(dir.path().join("logs")).with_table(dir.path().join("errors.db"));

    let mut monday = LogStore::open_for_date(&config, day()).unwrap();
    monday.append(&record("shared", ERROR)).unwrap();
    drop(monday);

    let tuesday_date = day().succ_opt().unwrap();
    let mut tuesday = LogStore::open_for_date(&config, tuesday_date).unwrap();
    assert!(tuesday.logged_ids().is_empty());

    let err = tuesday.append(&record("shared", ERROR)).unwrap_err();
    assert!(matches!(
        err,
        LogError::DuplicateId {
            store: IdStore::Table,
            ..
        }
    ));
    assert!(!tuesday.file_path().exists());

    // Monday's row still shows up when reading Tuesday's errors.
    let errors = tuesday.load_by_level(ERROR).unwrap();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].starts_with("Trace ID: shared "));
}
