//! Loading, starting, stopping and unloading configurations.
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::configuration::ConfigurationFactory;
use crate::config::{ConfigId, Configuration, ConfigurationData, ConfigurationError};
use crate::kernel::state::Kernel;
use crate::kernel::error::Result;
use crate::kernel::lifecycle::StopMode;
use crate::naming::AbstractName;
use crate::utils;

impl Kernel {
    /// Load an installed configuration from the store. Only the
    /// configuration's own component is registered; members appear when it
    /// starts.
    pub fn load_configuration(&self, id: &ConfigId) -> Result<AbstractName> {
        let store = self.store().ok_or(ConfigurationError::NoStore)?;
        if self.configuration(id).is_some() {
            return Err(ConfigurationError::AlreadyLoaded(id.clone()).into());
        }
        let data = store.configuration(id)?;
        let base_dir = store.base_dir(id)?;
        self.load_configuration_data(data, Some(base_dir))
    }

    /// Load a configuration that did not come from the store, e.g. one
    /// produced by a deployment builder.
    pub fn load_configuration_data(&self, data: ConfigurationData, base_dir: Option<PathBuf>) -> Result<AbstractName> {
        let id = data.id.clone();
        let configuration = Arc::new(Configuration::new(data, base_dir));
        let info = Arc::new(Configuration::component_info()?);
        let descriptor = configuration.descriptor(Arc::clone(&info))?;
        let factory = Arc::new(ConfigurationFactory::new(Arc::clone(&configuration), info));

        {
            let mut configurations = utils::lock(&self.inner.configurations);
            if configurations.contains_key(&id) {
                return Err(ConfigurationError::AlreadyLoaded(id).into());
            }
            configurations.insert(id.clone(), Arc::clone(&configuration));
        }
        if let Err(e) = self.register_instance(descriptor, factory, self.system_loader()) {
            utils::lock(&self.inner.configurations).remove(&id);
            return Err(e);
        }
        log::info!("Loaded configuration {}", id);
        Ok(configuration.name().clone())
    }

    fn require_configuration(&self, id: &ConfigId) -> Result<Arc<Configuration>> {
        self.configuration(id)
            .ok_or_else(|| ConfigurationError::NotLoaded(id.clone()).into())
    }

    /// Start the configuration component, then every member in member order.
    ///
    /// The first member failure is returned; members already running stay
    /// running.
    pub async fn start_configuration(&self, id: &ConfigId) -> Result<()> {
        let configuration = self.require_configuration(id)?;
        self.start_component_recursive(configuration.name()).await?;
        for member in configuration.members() {
            self.start_component_recursive(&member).await?;
        }
        log::info!("Started configuration {}", id);
        Ok(())
    }

    /// Cascade-stop the configuration: members (and child configurations)
    /// stop first, then the configuration writes their state back.
    pub async fn stop_configuration(&self, id: &ConfigId) -> Result<()> {
        let configuration = self.require_configuration(id)?;
        self.stop_component(configuration.name(), StopMode::Cascade).await
    }

    /// Stop, unregister and forget a configuration.
    pub async fn unload_configuration(&self, id: &ConfigId) -> Result<()> {
        let configuration = self.require_configuration(id)?;
        self.stop_configuration(id).await?;
        self.unregister_component(configuration.name()).await?;
        utils::lock(&self.inner.configurations).remove(id);
        log::info!("Unloaded configuration {}", id);
        Ok(())
    }

    /// Registered members of a loaded configuration, in start order.
    pub fn configuration_members(&self, id: &ConfigId) -> Result<Vec<AbstractName>> {
        Ok(self.require_configuration(id)?.members())
    }
}
