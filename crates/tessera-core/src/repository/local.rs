use std::path::{Path, PathBuf};

use crate::kernel::error::Result;
use crate::repository::{Artifact, ArtifactParseError, Repository};
use crate::store::StoreError;

/// Repository backed by a directory tree:
/// `<root>/<group>/<name>/<version>/<name>-<version>.<type>`.
#[derive(Debug, Clone)]
pub struct LocalRepository {
    root: PathBuf,
}

impl LocalRepository {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Where `artifact` lives (or would live) in this repository.
    pub fn location(&self, artifact: &Artifact) -> PathBuf {
        self.root
            .join(&artifact.group)
            .join(&artifact.name)
            .join(artifact.version.to_string())
            .join(artifact.file_name())
    }

    fn checked_location(&self, artifact: &Artifact) -> Result<PathBuf> {
        if let Some(part) = artifact.unsafe_part() {
            return Err(ArtifactParseError::UnsafePart {
                artifact: artifact.to_string(),
                part: part.to_string(),
            }
            .into());
        }
        Ok(self.location(artifact))
    }

    /// Copy bytes into the repository at the artifact's location.
    pub fn deploy(&self, artifact: &Artifact, contents: &[u8]) -> Result<PathBuf> {
        let location = self.checked_location(artifact)?;
        if let Some(parent) = location.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StoreError::io(e, "create_dir_all", parent.to_path_buf()))?;
        }
        std::fs::write(&location, contents).map_err(|e| StoreError::io(e, "write", location.clone()))?;
        Ok(location)
    }
}

impl Repository for LocalRepository {
    fn name(&self) -> &str {
        "local"
    }

    fn has_artifact(&self, artifact: &Artifact) -> bool {
        artifact.unsafe_part().is_none() && self.location(artifact).is_file()
    }

    fn resolve(&self, artifact: &Artifact) -> Result<PathBuf> {
        let location = self.checked_location(artifact)?;
        if !location.is_file() {
            return Err(StoreError::FileNotFound(location).into());
        }
        Ok(location)
    }
}
