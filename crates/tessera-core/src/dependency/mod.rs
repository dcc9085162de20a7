//! # Tessera Dependency Manager
//!
//! Tracks directed "must start before / must stop after" edges between
//! component names and answers ordering questions over them.
//!
//! The manager only records edges. It never breaks cycles; ordering
//! functions report [`DependencyError::CyclicDependency`] when one is found.
pub mod error;
pub mod manager;

pub use error::DependencyError;
pub use manager::{topological_order, DependencyManager};

#[cfg(test)]
mod tests;
