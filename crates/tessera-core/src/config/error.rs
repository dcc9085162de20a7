use thiserror::Error;

use crate::config::ConfigId;
use crate::repository::Artifact;

/// Errors raised while loading, starting or stopping configurations.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("Configuration '{id}' depends on '{artifact}', which no repository provides")]
    MissingDependencyArtifact { id: ConfigId, artifact: Artifact },

    #[error("Parent configuration '{parent}' of '{id}' is not running")]
    ParentNotRunning { id: ConfigId, parent: ConfigId },

    #[error("Configuration not loaded: {0}")]
    NotLoaded(ConfigId),

    #[error("Configuration already loaded: {0}")]
    AlreadyLoaded(ConfigId),

    #[error("Invalid configuration '{id}': {reason}")]
    InvalidConfiguration { id: String, reason: String },

    #[error("No configuration store has been set on this kernel")]
    NoStore,
}
