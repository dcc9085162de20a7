//! # Tessera Kernel Errors
//!
//! [`Error`] aggregates the typed errors of every subsystem so kernel
//! operations can propagate them with `?`. Component implementations that
//! fail for their own reasons use [`Error::Other`].
use std::result::Result as StdResult;

use thiserror::Error as ThisError;

use crate::component::ComponentError;
use crate::config::ConfigurationError;
use crate::dependency::DependencyError;
use crate::naming::NamingError;
use crate::repository::ArtifactParseError;
use crate::settings::SettingsError;
use crate::store::StoreError;

#[derive(Debug, ThisError)]
pub enum Error {
    #[error("Naming error: {0}")]
    Naming(#[from] NamingError),

    #[error("Dependency error: {0}")]
    Dependency(#[from] DependencyError),

    #[error("Component error: {0}")]
    Component(#[from] ComponentError),

    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),

    #[error("Artifact error: {0}")]
    Artifact(#[from] ArtifactParseError),

    /// Generic error with message
    #[error("Error: {0}")]
    Other(String),
}

impl Error {
    pub fn other(message: impl Into<String>) -> Self {
        Error::Other(message.into())
    }

    /// Innermost error, looking through lifecycle hook wrappers.
    pub fn root_cause(&self) -> &Error {
        match self {
            Error::Component(ComponentError::LifecycleHookFailure { source, .. }) => source.root_cause(),
            other => other,
        }
    }
}

/// Result type for kernel operations
pub type Result<T> = StdResult<T, Error>;
