//! # Tessera Repositories
//!
//! Artifact coordinates and the [`Repository`] contract used when a
//! configuration resolves its dependencies. Repositories are consulted in
//! priority order; the first one that has an artifact wins.
pub mod artifact;
pub mod local;

pub use artifact::{Artifact, ArtifactParseError};
pub use local::LocalRepository;

use std::fmt::Debug;
use std::path::PathBuf;

use crate::kernel::error::Result;

/// Source of dependency artifacts.
pub trait Repository: Send + Sync + Debug {
    /// Short name used in log output
    fn name(&self) -> &str;

    fn has_artifact(&self, artifact: &Artifact) -> bool;

    /// Location of the artifact. Only meaningful after `has_artifact` returned true.
    fn resolve(&self, artifact: &Artifact) -> Result<PathBuf>;
}

#[cfg(test)]
mod tests;
