//! # Tessera Kernel Settings
//!
//! Settings a kernel is built from: its name, the configuration store
//! root, the repository roots in priority order, and the configurations to
//! start. Files are JSON, or TOML / YAML when the `toml-config` /
//! `yaml-config` features are enabled; the extension picks the format.
//!
//! Relative paths in a settings file are taken relative to the file.
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::ConfigId;

/// Supported settings file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsFormat {
    /// JSON format (.json)
    Json,
    /// YAML format (.yaml, .yml) - requires "yaml-config" feature
    #[cfg(feature = "yaml-config")]
    Yaml,
    /// TOML format (.toml) - requires "toml-config" feature
    #[cfg(feature = "toml-config")]
    Toml,
}

impl SettingsFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            SettingsFormat::Json => "json",
            #[cfg(feature = "yaml-config")]
            SettingsFormat::Yaml => "yaml",
            #[cfg(feature = "toml-config")]
            SettingsFormat::Toml => "toml",
        }
    }

    /// Determine format from file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| match ext.to_lowercase().as_str() {
                "json" => Some(SettingsFormat::Json),
                #[cfg(feature = "yaml-config")]
                "yaml" | "yml" => Some(SettingsFormat::Yaml),
                #[cfg(feature = "toml-config")]
                "toml" => Some(SettingsFormat::Toml),
                _ => None,
            })
    }
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Unsupported settings format: {0}")]
    UnsupportedFormat(PathBuf),

    #[error("Unable to read settings '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid {format} settings: {message}")]
    Parse { format: &'static str, message: String },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct KernelSettings {
    pub kernel_name: Option<String>,
    pub store_root: Option<PathBuf>,
    /// Repository roots, highest priority first
    pub repositories: Vec<PathBuf>,
    /// Configurations loaded and started at boot, in order
    pub start: Vec<ConfigId>,
}

impl KernelSettings {
    /// Load settings from a file, resolving relative paths against its directory.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let format = SettingsFormat::from_path(path).ok_or_else(|| SettingsError::UnsupportedFormat(path.to_path_buf()))?;
        let text = fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut settings = Self::parse(&text, format)?;
        if let Some(dir) = path.parent() {
            settings.resolve_paths(dir);
        }
        log::debug!("Loaded kernel settings from {}", path.display());
        Ok(settings)
    }

    pub fn parse(text: &str, format: SettingsFormat) -> Result<Self, SettingsError> {
        let parse_err = |message: String| SettingsError::Parse {
            format: format.extension(),
            message,
        };
        match format {
            SettingsFormat::Json => serde_json::from_str(text).map_err(|e| parse_err(e.to_string())),
            #[cfg(feature = "yaml-config")]
            SettingsFormat::Yaml => serde_yaml::from_str(text).map_err(|e| parse_err(e.to_string())),
            #[cfg(feature = "toml-config")]
            SettingsFormat::Toml => toml::from_str(text).map_err(|e| parse_err(e.to_string())),
        }
    }

    /// Make relative store and repository paths relative to `base`.
    pub fn resolve_paths(&mut self, base: &Path) {
        if let Some(root) = &self.store_root {
            if root.is_relative() {
                self.store_root = Some(base.join(root));
            }
        }
        for repository in &mut self.repositories {
            if repository.is_relative() {
                *repository = base.join(&*repository);
            }
        }
    }
}

#[cfg(test)]
mod tests;
