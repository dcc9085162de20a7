//! # Tessera Component Model
//!
//! Everything the kernel needs to know about a single managed component:
//! its type schema ([`ComponentInfo`]), its serializable description
//! ([`ComponentDescriptor`]), the [`Component`] and [`ComponentFactory`]
//! traits implemented by component types, the type registry and
//! class-loading contexts that decide which types are visible where, the
//! lifecycle states, and the registry of live instances.
//!
//! Lifecycle driving itself lives on the [`Kernel`](crate::kernel::Kernel).
pub mod codec;
pub mod descriptor;
pub mod error;
pub mod info;
pub mod instance;
pub mod lifecycle;
pub mod loader;
pub mod registry;
pub mod traits;
pub mod value;

pub use codec::{decode_descriptors, encode_descriptors, MAX_LIST_DEPTH};
pub use descriptor::{ComponentDescriptor, ReferencePattern};
pub use error::{ComponentError, LifecyclePhase};
pub use info::{AttributeInfo, ComponentInfo, ComponentInfoBuilder, OperationInfo, ReferenceInfo};
pub use instance::ComponentInstance;
pub use lifecycle::LifecycleState;
pub use loader::{ClassLoader, TypeRegistry};
pub use registry::ComponentRegistry;
pub use traits::{Component, ComponentContext, ComponentFactory, ConstructorArg, ConstructorArgs, FnComponentFactory};
pub use value::{AttributeValue, ValueKind};

#[cfg(test)]
mod tests;
