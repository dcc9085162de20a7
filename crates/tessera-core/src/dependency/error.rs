use thiserror::Error;

use crate::naming::AbstractName;

/// Errors raised by dependency ordering and stop/unregister preconditions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DependencyError {
    /// Dependency cycle detected while ordering
    #[error("Circular dependency detected: {}", .0.join(" -> "))]
    CyclicDependency(Vec<String>),

    /// The component still has live dependents
    #[error("Component '{name}' has dependents: {}", .dependents.iter().map(|d| d.to_string()).collect::<Vec<_>>().join(", "))]
    HasDependents {
        name: AbstractName,
        dependents: Vec<AbstractName>,
    },
}
