#![cfg(test)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use semver::Version;
use tempfile::{tempdir, TempDir};

use crate::config::{ConfigId, ConfigurationData};
use crate::kernel::error::Error;
use crate::store::archive::pack_directory;
use crate::store::local::write_configuration_dir;
use crate::store::{ConfigurationStore, LocalConfigStore, StoreError};

fn id(name: &str) -> ConfigId {
    ConfigId::new(name, Version::new(1, 0, 0)).unwrap()
}

/// Build an archive for `data` under `work` and return its path.
fn archive_for(work: &Path, data: &ConfigurationData) -> PathBuf {
    let dir = work.join(format!("{}-src", data.id.name()));
    write_configuration_dir(&dir, data).unwrap();
    fs::write(dir.join("lib.bin"), b"classes").unwrap();
    let archive = work.join(format!("{}.car", data.id.name()));
    pack_directory(&dir, &archive).unwrap();
    archive
}

fn store_dir() -> (TempDir, PathBuf) {
    let temp_dir = tempdir().unwrap();
    let root = temp_dir.path().join("store");
    fs::create_dir(&root).unwrap();
    (temp_dir, root)
}

#[test]
fn test_open_requires_directory() {
    let temp_dir = tempdir().unwrap();
    let err = LocalConfigStore::open(temp_dir.path().join("absent")).unwrap_err();
    assert!(matches!(err, Error::Store(StoreError::DirectoryNotFound(_))));
}

#[test]
fn test_open_refuses_corrupt_index() {
    let (_temp, root) = store_dir();
    fs::write(root.join("index.properties"), "app/1.0.0=not-a-slot\n").unwrap();
    let err = LocalConfigStore::open(&root).unwrap_err();
    assert!(matches!(err, Error::Store(StoreError::StoreCorruption { .. })));
}

#[test]
fn test_open_refuses_bad_id_in_index() {
    let (_temp, root) = store_dir();
    fs::write(root.join("index.properties"), "no-version=1\n").unwrap();
    assert!(matches!(
        LocalConfigStore::open(&root),
        Err(Error::Store(StoreError::StoreCorruption { .. }))
    ));
}

#[test]
fn test_install_indexes_and_unpacks() {
    let (temp, root) = store_dir();
    let store = LocalConfigStore::open(&root).unwrap();
    let data = ConfigurationData::new(id("app")).with_classpath("lib.bin");
    let archive = archive_for(temp.path(), &data);

    let installed = store.install(&archive).unwrap();
    assert_eq!(installed, id("app"));
    assert!(store.contains(&installed));
    assert_eq!(store.list(), vec![id("app")]);

    let base = store.base_dir(&installed).unwrap();
    assert_eq!(base, root.join("1"));
    assert_eq!(fs::read(base.join("lib.bin")).unwrap(), b"classes");
    assert_eq!(store.configuration(&installed).unwrap(), data);

    let index = fs::read_to_string(root.join("index.properties")).unwrap();
    assert!(index.contains("app/1.0.0=1"));
}

#[test]
fn test_duplicate_install_rejected_and_cleaned_up() {
    let (temp, root) = store_dir();
    let store = LocalConfigStore::open(&root).unwrap();
    let archive = archive_for(temp.path(), &ConfigurationData::new(id("app")));
    store.install(&archive).unwrap();

    let err = store.install(&archive).unwrap_err();
    assert!(matches!(err, Error::Store(StoreError::AlreadyInstalled(_))));
    assert!(!root.join("2").exists());
    assert_eq!(store.slot(&id("app")), Some(1));
}

#[test]
fn test_bad_archive_leaves_no_slot() {
    let (temp, root) = store_dir();
    let store = LocalConfigStore::open(&root).unwrap();
    let bogus = temp.path().join("bogus.car");
    fs::write(&bogus, b"nope").unwrap();

    assert!(store.install(&bogus).is_err());
    assert!(!root.join("1").exists());
    assert!(store.list().is_empty());
    assert!(!root.join("index.properties").exists());
}

#[test]
fn test_uncommitted_install_leaves_index_unchanged() {
    let (temp, root) = store_dir();
    let store = LocalConfigStore::open(&root).unwrap();
    store
        .install(&archive_for(temp.path(), &ConfigurationData::new(id("base"))))
        .unwrap();
    let index_before = fs::read_to_string(root.join("index.properties")).unwrap();

    let archive = archive_for(temp.path(), &ConfigurationData::new(id("app")));
    let (pending, slot) = store.install_uncommitted(&archive).unwrap();
    assert_eq!(pending, id("app"));

    // Orphaned slot exists, but nothing references it
    assert!(root.join(slot.to_string()).is_dir());
    assert_eq!(fs::read_to_string(root.join("index.properties")).unwrap(), index_before);
    drop(store);

    let reopened = LocalConfigStore::open(&root).unwrap();
    assert_eq!(reopened.list(), vec![id("base")]);
    assert!(matches!(
        reopened.configuration(&id("app")),
        Err(Error::Store(StoreError::NoSuchConfiguration(_)))
    ));

    // A later install skips the orphaned slot directory
    let installed = reopened.install(&archive).unwrap();
    assert!(reopened.slot(&installed).unwrap() > slot);
}

#[test]
fn test_concurrent_installs_get_distinct_slots() {
    let (temp, root) = store_dir();
    let store = Arc::new(LocalConfigStore::open(&root).unwrap());
    let archives: Vec<PathBuf> = (0..8)
        .map(|i| archive_for(temp.path(), &ConfigurationData::new(id(&format!("app{}", i)))))
        .collect();

    std::thread::scope(|scope| {
        for archive in &archives {
            let store = Arc::clone(&store);
            scope.spawn(move || store.install(archive).unwrap());
        }
    });

    let mut slots: Vec<u64> = store.list().iter().map(|id| store.slot(id).unwrap()).collect();
    slots.sort();
    slots.dedup();
    assert_eq!(slots.len(), 8);

    let reopened = LocalConfigStore::open(&root).unwrap();
    assert_eq!(reopened.list().len(), 8);
}

#[test]
fn test_update_configuration_rewrites_slot() {
    let (temp, root) = store_dir();
    let store = LocalConfigStore::open(&root).unwrap();
    let installed = store
        .install(&archive_for(temp.path(), &ConfigurationData::new(id("app"))))
        .unwrap();

    let mut data = store.configuration(&installed).unwrap();
    data.classpath.push(PathBuf::from("extra"));
    data.set_components_bytes(vec![1, 2, 3]);
    store.update_configuration(&data).unwrap();

    let reloaded = LocalConfigStore::open(&root).unwrap().configuration(&installed).unwrap();
    assert_eq!(reloaded.classpath, vec![PathBuf::from("extra")]);
    assert_eq!(reloaded.components(), &[1, 2, 3]);
}

#[test]
fn test_update_unknown_configuration_fails() {
    let (_temp, root) = store_dir();
    let store = LocalConfigStore::open(&root).unwrap();
    let err = store.update_configuration(&ConfigurationData::new(id("ghost"))).unwrap_err();
    assert!(matches!(err, Error::Store(StoreError::NoSuchConfiguration(_))));
}

#[test]
fn test_uninstall_removes_entry_and_slot() {
    let (temp, root) = store_dir();
    let store = LocalConfigStore::open(&root).unwrap();
    let installed = store
        .install(&archive_for(temp.path(), &ConfigurationData::new(id("app"))))
        .unwrap();
    store.uninstall(&installed).unwrap();
    assert!(!store.contains(&installed));
    assert!(!root.join("1").exists());
    assert!(LocalConfigStore::open(&root).unwrap().list().is_empty());
    assert!(store.uninstall(&installed).is_err());
}
