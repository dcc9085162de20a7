//! # Tessera Component Errors
//!
//! [`ComponentError`] covers registry, lifecycle, schema and descriptor codec
//! failures. Every variant is local to one component: none of them leaves
//! the registry in a state that affects unrelated components.
use thiserror::Error;

use crate::component::lifecycle::LifecycleState;
use crate::kernel::error::Error;
use crate::naming::AbstractName;

/// Lifecycle step during which a component's own code failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LifecyclePhase {
    #[error("construct")]
    Construct,
    #[error("start")]
    Start,
    #[error("stop")]
    Stop,
}

#[derive(Debug, Error)]
pub enum ComponentError {
    #[error("Component already registered: {0}")]
    IdentityConflict(AbstractName),

    #[error("Component not found: {0}")]
    NotFound(AbstractName),

    #[error("Reference '{reference}' of component '{name}' matched {matches} candidates for {pattern}")]
    UnresolvedReference {
        name: AbstractName,
        reference: String,
        pattern: String,
        matches: usize,
    },

    #[error("Query {query} matched {matches} components, expected exactly one")]
    QueryNotUnique { query: String, matches: usize },

    #[error("Component '{name}' cannot {operation} while {state}")]
    InvalidState {
        name: AbstractName,
        state: LifecycleState,
        operation: String,
    },

    #[error("Component '{name}' cannot start: dependency '{dependency}' is {state}")]
    DependencyNotRunning {
        name: AbstractName,
        dependency: AbstractName,
        state: String,
    },

    #[error("Component '{name}' failed during {phase}: {source}")]
    LifecycleHookFailure {
        name: AbstractName,
        phase: LifecyclePhase,
        #[source]
        source: Box<Error>,
    },

    #[error("Schema mismatch for '{type_name}.{attribute}': {reason}")]
    SchemaMismatch {
        type_name: String,
        attribute: String,
        reason: String,
    },

    #[error("Attribute '{attribute}' of component '{name}' is not mutable at runtime")]
    AttributeNotMutable { name: AbstractName, attribute: String },

    #[error("'{target}' has no operation '{operation}' taking {arity} argument(s)")]
    NoSuchOperation {
        target: String,
        operation: String,
        arity: usize,
    },

    #[error("Invalid component type '{type_name}': {reason}")]
    InvalidSchema { type_name: String, reason: String },

    #[error("Component type already registered: {0}")]
    DuplicateType(String),

    #[error("Component type '{type_name}' is not visible from class loader '{loader}'")]
    ClassNotFound { type_name: String, loader: String },

    #[error("Descriptor stream error: {0}")]
    Codec(String),
}

impl ComponentError {
    pub(crate) fn schema(type_name: &str, attribute: &str, reason: impl Into<String>) -> Self {
        ComponentError::SchemaMismatch {
            type_name: type_name.to_string(),
            attribute: attribute.to_string(),
            reason: reason.into(),
        }
    }
}
