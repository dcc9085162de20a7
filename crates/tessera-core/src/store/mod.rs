//! # Tessera Configuration Store
//!
//! Durable home of installed configurations. A store maps each installed
//! [`ConfigId`] to a numbered slot directory holding the unpacked archive:
//!
//! ```text
//! <root>/index.properties
//! <root>/<slot>/META-INF/configuration.json
//! <root>/<slot>/META-INF/components.bin
//! <root>/<slot>/...                      classpath entries
//! ```
//!
//! The index is only ever replaced whole, through a temporary file, so a
//! crash mid-install leaves at worst an orphaned slot directory that no
//! index entry points at.
pub mod archive;
pub mod error;
mod files;
mod index;
pub mod local;

pub use error::StoreError;
pub use local::LocalConfigStore;

use std::fmt::Debug;
use std::path::{Path, PathBuf};

use crate::config::{ConfigId, ConfigurationData};
use crate::kernel::error::Result;

/// Metadata file inside a slot
pub const METADATA_FILE: &str = "META-INF/configuration.json";
/// Descriptor stream inside a slot
pub const COMPONENTS_FILE: &str = "META-INF/components.bin";

/// Persistent storage of configurations.
pub trait ConfigurationStore: Send + Sync + Debug {
    /// Unpack an archive into a new slot and index it.
    fn install(&self, archive: &Path) -> Result<ConfigId>;

    fn uninstall(&self, id: &ConfigId) -> Result<()>;

    fn contains(&self, id: &ConfigId) -> bool;

    /// Installed ids in id order.
    fn list(&self) -> Vec<ConfigId>;

    fn configuration(&self, id: &ConfigId) -> Result<ConfigurationData>;

    /// Directory classpath entries are resolved against.
    fn base_dir(&self, id: &ConfigId) -> Result<PathBuf>;

    /// Replace the stored metadata and descriptor stream of an installed configuration.
    fn update_configuration(&self, data: &ConfigurationData) -> Result<()>;
}

#[cfg(test)]
mod tests;
