use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use semver::Version;
use serde::{Deserialize, Serialize};

use crate::component::{encode_descriptors, ComponentDescriptor, ComponentError};
use crate::config::error::ConfigurationError;
use crate::repository::Artifact;

/// Identity of a configuration: `name/version`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ConfigId {
    name: String,
    version: Version,
}

impl ConfigId {
    /// The name must be non-empty and free of whitespace and of the
    /// characters `: , = *`, which the naming and index syntaxes reserve.
    pub fn new(name: &str, version: Version) -> Result<Self, ConfigurationError> {
        let reserved = |c: char| c.is_whitespace() || matches!(c, ':' | ',' | '=' | '*');
        if name.is_empty() || name.contains(reserved) {
            return Err(ConfigurationError::InvalidConfiguration {
                id: format!("{}/{}", name, version),
                reason: "configuration name is empty or contains a reserved character".to_string(),
            });
        }
        Ok(Self {
            name: name.to_string(),
            version,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &Version {
        &self.version
    }
}

impl fmt::Display for ConfigId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.name, self.version)
    }
}

impl FromStr for ConfigId {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: String| ConfigurationError::InvalidConfiguration {
            id: s.to_string(),
            reason,
        };
        let (name, version) = s
            .rsplit_once('/')
            .ok_or_else(|| invalid("expected name/version".to_string()))?;
        let version = Version::parse(version).map_err(|e| invalid(e.to_string()))?;
        ConfigId::new(name, version)
    }
}

impl TryFrom<String> for ConfigId {
    type Error = ConfigurationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ConfigId> for String {
    fn from(id: ConfigId) -> Self {
        id.to_string()
    }
}

/// Packaging type of a configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleType {
    #[default]
    Car,
    Ear,
    War,
    Rar,
    Jar,
}

/// Offline form of a configuration: metadata plus the encoded descriptor
/// stream of its members.
///
/// The metadata is what `META-INF/configuration.json` holds; the descriptor
/// stream is stored beside it and never part of the JSON document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigurationData {
    pub id: ConfigId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<ConfigId>,
    #[serde(default)]
    pub module_type: ModuleType,
    /// Relative to the configuration's base directory
    #[serde(default)]
    pub classpath: Vec<PathBuf>,
    #[serde(default)]
    pub dependencies: Vec<Artifact>,
    #[serde(skip)]
    components: Vec<u8>,
}

impl ConfigurationData {
    pub fn new(id: ConfigId) -> Self {
        Self {
            id,
            parent: None,
            module_type: ModuleType::default(),
            classpath: Vec::new(),
            dependencies: Vec::new(),
            components: Vec::new(),
        }
    }

    pub fn with_parent(mut self, parent: ConfigId) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn with_dependency(mut self, artifact: Artifact) -> Self {
        self.dependencies.push(artifact);
        self
    }

    pub fn with_classpath(mut self, entry: impl Into<PathBuf>) -> Self {
        self.classpath.push(entry.into());
        self
    }

    /// Encoded descriptor stream.
    pub fn components(&self) -> &[u8] {
        &self.components
    }

    pub fn set_components_bytes(&mut self, bytes: Vec<u8>) {
        self.components = bytes;
    }

    /// Encode `descriptors` as this configuration's members.
    pub fn set_components(&mut self, descriptors: &[ComponentDescriptor]) -> Result<(), ComponentError> {
        self.components = encode_descriptors(descriptors)?;
        Ok(())
    }
}
