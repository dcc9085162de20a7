//! # Tessera Kernel
//!
//! The [`Kernel`] is the façade over every other subsystem. It owns the
//! component registry, the dependency graph, the type registry and system
//! class loader, the repositories and configuration store, and the
//! loaded configurations.
//!
//! ## Submodules
//!
//! - `state`: kernel state, registration, references, attributes and queries
//! - `lifecycle`: start, recursive start and stop transitions
//! - `configurations`: configuration load/start/stop/unload
//! - `monitor`: lifecycle listeners
//! - `error`: the aggregated [`Error`] and [`Result`]
pub mod configurations;
pub mod constants;
pub mod state;
pub mod error;
pub mod lifecycle;
pub mod monitor;

pub use state::{Kernel, KernelHandle};
pub use error::{Error, Result};
pub use lifecycle::StopMode;
pub use monitor::{LifecycleEvent, LifecycleListener, LifecycleMonitor, ListenerId};

#[cfg(test)]
mod tests;
