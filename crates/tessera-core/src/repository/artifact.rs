use std::fmt;
use std::str::FromStr;

use semver::Version;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Artifact coordinates: `group/name/version/type`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Artifact {
    pub group: String,
    pub name: String,
    pub version: Version,
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArtifactParseError {
    #[error("Artifact '{0}' must have the form group/name/version/type")]
    WrongShape(String),
    #[error("Artifact '{artifact}' has an invalid version: {reason}")]
    InvalidVersion { artifact: String, reason: String },
    #[error("Artifact '{artifact}' has a part that is not a plain path segment: '{part}'")]
    UnsafePart { artifact: String, part: String },
}

fn is_plain_segment(part: &str) -> bool {
    !part.is_empty() && part != "." && part != ".." && !part.contains(['/', '\\', '\0'])
}

impl Artifact {
    pub fn new(group: &str, name: &str, version: Version, kind: &str) -> Self {
        Self {
            group: group.to_string(),
            name: name.to_string(),
            version,
            kind: kind.to_string(),
        }
    }

    /// First part that cannot be used as a single path segment.
    pub fn unsafe_part(&self) -> Option<&str> {
        [&self.group, &self.name, &self.kind]
            .into_iter()
            .map(String::as_str)
            .find(|p| !is_plain_segment(p))
    }

    /// File name used by repositories laid out on disk.
    pub fn file_name(&self) -> String {
        format!("{}-{}.{}", self.name, self.version, self.kind)
    }
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}/{}", self.group, self.name, self.version, self.kind)
    }
}

impl FromStr for Artifact {
    type Err = ArtifactParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('/').collect();
        if parts.len() != 4 || parts.iter().any(|p| p.is_empty()) {
            return Err(ArtifactParseError::WrongShape(s.to_string()));
        }
        if let Some(part) = [parts[0], parts[1], parts[3]].into_iter().find(|p| !is_plain_segment(p)) {
            return Err(ArtifactParseError::UnsafePart {
                artifact: s.to_string(),
                part: part.to_string(),
            });
        }
        let version = Version::parse(parts[2]).map_err(|e| ArtifactParseError::InvalidVersion {
            artifact: s.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self::new(parts[0], parts[1], version, parts[3]))
    }
}

impl TryFrom<String> for Artifact {
    type Error = ArtifactParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Artifact> for String {
    fn from(artifact: Artifact) -> Self {
        artifact.to_string()
    }
}
