//! # Tessera Configurations
//!
//! A configuration is a versioned bundle of component descriptors with its
//! own dependency artifacts, classpath and optional parent. Offline it is a
//! [`ConfigurationData`]; once loaded into a kernel it is a
//! [`Configuration`] that registers itself as a component and manages its
//! members through that component's lifecycle.
pub mod configuration;
pub mod data;
pub mod error;

pub use configuration::Configuration;
pub use data::{ConfigId, ConfigurationData, ModuleType};
pub use error::ConfigurationError;

#[cfg(test)]
mod tests;
