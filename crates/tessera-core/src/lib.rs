//! # Tessera Core
//!
//! A component lifecycle kernel. Components are described by
//! [`ComponentDescriptor`]s, registered under structured names, resolved
//! against each other, ordered by dependency and driven through a
//! start/stop/fail state machine by the [`Kernel`]. Components are grouped
//! into configurations that carry their own class-loading context and are
//! persisted in a [`ConfigurationStore`](store::ConfigurationStore).
pub mod component;
pub mod config;
pub mod dependency;
pub mod kernel;
pub mod naming;
pub mod repository;
pub mod settings;
pub mod store;
pub mod utils;

pub use component::{
    AttributeInfo, AttributeValue, Component, ComponentContext, ComponentDescriptor, ComponentFactory, ComponentInfo,
    FnComponentFactory, LifecycleState, ReferenceInfo, ReferencePattern, ValueKind,
};
pub use config::{ConfigId, ConfigurationData};
pub use kernel::error::Error as KernelError;
pub use kernel::{Kernel, StopMode};
pub use naming::{AbstractName, AbstractNameQuery};
pub use settings::KernelSettings;
pub use store::{ConfigurationStore, LocalConfigStore};
