#![cfg(test)]

use std::fs::{self, File};
use std::sync::{Arc, Mutex};

use tempfile::tempdir;

use crate::utils::fs::{find_dirs, find_files, remove_dir_quietly};
use crate::utils::lock;

#[test]
fn test_find_files_recurses_in_sorted_order() {
    let temp_dir = tempdir().unwrap();
    let base = temp_dir.path();
    fs::create_dir_all(base.join("b/nested")).unwrap();
    fs::create_dir_all(base.join("a")).unwrap();
    File::create(base.join("b/nested/two.bin")).unwrap();
    File::create(base.join("a/one.bin")).unwrap();
    File::create(base.join("a/skip.txt")).unwrap();

    let found = find_files(base, &|p: &std::path::Path| p.extension().is_some_and(|e| e == "bin")).unwrap();
    assert_eq!(found, vec![base.join("a/one.bin"), base.join("b/nested/two.bin")]);
}

#[test]
fn test_find_files_missing_path_is_empty() {
    let temp_dir = tempdir().unwrap();
    let found = find_files(temp_dir.path().join("absent"), &|_: &std::path::Path| true).unwrap();
    assert!(found.is_empty());
}

#[test]
fn test_find_dirs_lists_parents_first() {
    let temp_dir = tempdir().unwrap();
    let base = temp_dir.path();
    fs::create_dir_all(base.join("x/y")).unwrap();
    let dirs = find_dirs(base).unwrap();
    assert_eq!(dirs, vec![base.join("x"), base.join("x/y")]);
}

#[test]
fn test_remove_dir_quietly_ignores_missing() {
    let temp_dir = tempdir().unwrap();
    let target = temp_dir.path().join("slot");
    fs::create_dir_all(target.join("META-INF")).unwrap();
    remove_dir_quietly(&target).unwrap();
    assert!(!target.exists());
    remove_dir_quietly(&target).unwrap();
}

#[test]
fn test_lock_recovers_from_poison() {
    let shared = Arc::new(Mutex::new(1));
    let clone = Arc::clone(&shared);
    let _ = std::thread::spawn(move || {
        let _guard = clone.lock().unwrap();
        panic!("poison the lock");
    })
    .join();
    assert!(shared.is_poisoned());
    *lock(&shared) += 1;
    assert_eq!(*lock(&shared), 2);
}
