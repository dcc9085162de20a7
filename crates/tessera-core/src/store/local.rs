use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::config::{ConfigId, ConfigurationData};
use crate::kernel::error::{Error, Result};
use crate::store::error::StoreError;
use crate::store::files::{read_bytes, write_atomic};
use crate::store::index::{self, INDEX_FILE};
use crate::store::{archive, ConfigurationStore, COMPONENTS_FILE, METADATA_FILE};
use crate::utils::{self, fs::remove_dir_quietly};

/// Configuration store on the local file system.
#[derive(Debug)]
pub struct LocalConfigStore {
    root: PathBuf,
    /// Highest slot handed out so far
    max_slot: Mutex<u64>,
    /// id -> slot, mirrors `index.properties`
    index: Mutex<BTreeMap<ConfigId, u64>>,
}

impl LocalConfigStore {
    /// Open a store rooted at an existing directory.
    ///
    /// A missing index means an empty store. An index that cannot be read
    /// or parsed is reported as [`StoreError::StoreCorruption`].
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(StoreError::DirectoryNotFound(root).into());
        }

        let index_path = root.join(INDEX_FILE);
        let entries = match fs::read(&index_path) {
            Ok(bytes) => {
                let text = String::from_utf8(bytes).map_err(|e| StoreError::StoreCorruption {
                    path: index_path.clone(),
                    reason: e.to_string(),
                })?;
                index::parse(&index_path, &text)?
            }
            Err(e) if e.kind() == ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                return Err(StoreError::StoreCorruption {
                    path: index_path,
                    reason: e.to_string(),
                }
                .into());
            }
        };

        let mut index = BTreeMap::new();
        for (key, slot) in entries {
            let id: ConfigId = key.parse().map_err(|e| StoreError::StoreCorruption {
                path: index_path.clone(),
                reason: format!("{}", e),
            })?;
            index.insert(id, slot);
        }
        let max_slot = index.values().copied().max().unwrap_or(0);
        log::debug!(
            "Opened configuration store {} with {} configuration(s)",
            root.display(),
            index.len()
        );

        Ok(Self {
            root,
            max_slot: Mutex::new(max_slot),
            index: Mutex::new(index),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Slot number of an installed configuration.
    pub fn slot(&self, id: &ConfigId) -> Option<u64> {
        utils::lock(&self.index).get(id).copied()
    }

    fn slot_dir(&self, slot: u64) -> PathBuf {
        self.root.join(slot.to_string())
    }

    fn require_slot(&self, id: &ConfigId) -> Result<u64> {
        self.slot(id)
            .ok_or_else(|| StoreError::NoSuchConfiguration(id.to_string()).into())
    }

    /// Allocate a fresh slot and create its directory. Directories left
    /// behind by interrupted installs are skipped, never reused.
    fn allocate_slot(&self) -> Result<(u64, PathBuf)> {
        loop {
            let slot = {
                let mut max_slot = utils::lock(&self.max_slot);
                *max_slot += 1;
                *max_slot
            };
            let dir = self.slot_dir(slot);
            match fs::create_dir(&dir) {
                Ok(()) => return Ok((slot, dir)),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(StoreError::io(e, "create_dir", dir).into()),
            }
        }
    }

    fn read_metadata(dir: &Path) -> Result<ConfigurationData> {
        let path = dir.join(METADATA_FILE);
        let bytes = read_bytes(&path)?;
        let mut data: ConfigurationData =
            serde_json::from_slice(&bytes).map_err(|source| StoreError::Serialization { path, source })?;
        let components_path = dir.join(COMPONENTS_FILE);
        if components_path.is_file() {
            data.set_components_bytes(read_bytes(&components_path)?);
        }
        Ok(data)
    }

    fn write_metadata(dir: &Path, data: &ConfigurationData) -> Result<()> {
        let path = dir.join(METADATA_FILE);
        let json = serde_json::to_vec_pretty(data).map_err(|source| StoreError::Serialization {
            path: path.clone(),
            source,
        })?;
        write_atomic(&dir.join(COMPONENTS_FILE), data.components())?;
        write_atomic(&path, &json)?;
        Ok(())
    }

    fn save_index(&self, index: &BTreeMap<ConfigId, u64>) -> Result<()> {
        let entries: BTreeMap<String, u64> = index.iter().map(|(id, slot)| (id.to_string(), *slot)).collect();
        write_atomic(&self.root.join(INDEX_FILE), index::render(&entries).as_bytes())?;
        Ok(())
    }

    /// Unpack into a new slot and read the metadata without touching the
    /// index. The slot directory is removed again on failure.
    pub(crate) fn install_uncommitted(&self, archive_path: &Path) -> Result<(ConfigId, u64)> {
        let (slot, dir) = self.allocate_slot()?;
        let unpacked = archive::unpack(archive_path, &dir)
            .map_err(Error::from)
            .and_then(|_| Self::read_metadata(&dir));
        match unpacked {
            Ok(data) => Ok((data.id, slot)),
            Err(e) => {
                if let Err(cleanup) = remove_dir_quietly(&dir) {
                    log::warn!("Unable to remove slot directory {}: {}", dir.display(), cleanup);
                }
                Err(e)
            }
        }
    }

    fn discard_slot(&self, slot: u64) {
        let dir = self.slot_dir(slot);
        if let Err(e) = remove_dir_quietly(&dir) {
            log::warn!("Unable to remove slot directory {}: {}", dir.display(), e);
        }
    }
}

impl ConfigurationStore for LocalConfigStore {
    fn install(&self, archive_path: &Path) -> Result<ConfigId> {
        let (id, slot) = self.install_uncommitted(archive_path)?;

        let mut index = utils::lock(&self.index);
        if index.contains_key(&id) {
            drop(index);
            self.discard_slot(slot);
            return Err(StoreError::AlreadyInstalled(id.to_string()).into());
        }
        index.insert(id.clone(), slot);
        if let Err(e) = self.save_index(&index) {
            index.remove(&id);
            drop(index);
            self.discard_slot(slot);
            return Err(e);
        }
        log::info!("Installed configuration {} into slot {}", id, slot);
        Ok(id)
    }

    fn uninstall(&self, id: &ConfigId) -> Result<()> {
        let slot = {
            let mut index = utils::lock(&self.index);
            let slot = index
                .remove(id)
                .ok_or_else(|| StoreError::NoSuchConfiguration(id.to_string()))?;
            if let Err(e) = self.save_index(&index) {
                index.insert(id.clone(), slot);
                return Err(e);
            }
            slot
        };
        self.discard_slot(slot);
        log::info!("Uninstalled configuration {}", id);
        Ok(())
    }

    fn contains(&self, id: &ConfigId) -> bool {
        utils::lock(&self.index).contains_key(id)
    }

    fn list(&self) -> Vec<ConfigId> {
        utils::lock(&self.index).keys().cloned().collect()
    }

    fn configuration(&self, id: &ConfigId) -> Result<ConfigurationData> {
        let slot = self.require_slot(id)?;
        Self::read_metadata(&self.slot_dir(slot))
    }

    fn base_dir(&self, id: &ConfigId) -> Result<PathBuf> {
        self.require_slot(id).map(|slot| self.slot_dir(slot))
    }

    fn update_configuration(&self, data: &ConfigurationData) -> Result<()> {
        let slot = self.require_slot(&data.id)?;
        Self::write_metadata(&self.slot_dir(slot), data)?;
        log::debug!("Updated stored state of configuration {}", data.id);
        Ok(())
    }
}

/// Lay out a configuration directory ready for [`archive::pack_directory`]:
/// writes the metadata and descriptor stream under `META-INF/`.
pub fn write_configuration_dir(dir: &Path, data: &ConfigurationData) -> Result<()> {
    fs::create_dir_all(dir.join("META-INF")).map_err(|e| StoreError::io(e, "create_dir_all", dir.to_path_buf()))?;
    LocalConfigStore::write_metadata(dir, data)
}
