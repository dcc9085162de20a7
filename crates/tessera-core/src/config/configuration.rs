use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::component::{
    decode_descriptors, AttributeInfo, AttributeValue, ClassLoader, Component, ComponentContext, ComponentDescriptor,
    ComponentError, ComponentFactory, ComponentInfo, ConstructorArgs, ReferencePattern, ValueKind,
};
use crate::config::data::{ConfigId, ConfigurationData};
use crate::config::error::ConfigurationError;
use crate::dependency::topological_order;
use crate::kernel::constants::{CONFIGURATION_BASE_DIR, CONFIGURATION_INTERFACE, CONFIGURATION_TYPE};
use crate::kernel::error::{Error, Result};
use crate::kernel::{Kernel, KernelHandle};
use crate::naming::AbstractName;
use crate::utils;

/// A loaded configuration: the runtime side of [`ConfigurationData`].
///
/// It is registered in the kernel as a component of its own. Starting that
/// component resolves the dependencies, builds the class loader and
/// registers the members; stopping it writes the members back into
/// descriptor form and unregisters them.
pub struct Configuration {
    id: ConfigId,
    name: AbstractName,
    base_dir: Option<PathBuf>,
    data: Mutex<ConfigurationData>,
    class_loader: Mutex<Option<Arc<ClassLoader>>>,
    members: Mutex<Vec<AbstractName>>,
}

impl fmt::Debug for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Configuration")
            .field("id", &self.id)
            .field("base_dir", &self.base_dir)
            .field("members", &self.members().len())
            .finish()
    }
}

impl Configuration {
    pub(crate) fn new(data: ConfigurationData, base_dir: Option<PathBuf>) -> Self {
        Self {
            id: data.id.clone(),
            name: AbstractName::for_configuration(&data.id),
            base_dir,
            data: Mutex::new(data),
            class_loader: Mutex::new(None),
            members: Mutex::new(Vec::new()),
        }
    }

    pub fn id(&self) -> &ConfigId {
        &self.id
    }

    /// Name of the configuration's own component.
    pub fn name(&self) -> &AbstractName {
        &self.name
    }

    pub fn base_dir(&self) -> Option<&Path> {
        self.base_dir.as_deref()
    }

    pub fn parent(&self) -> Option<ConfigId> {
        utils::lock(&self.data).parent.clone()
    }

    /// Current offline form, including the latest stored member state.
    pub fn data(&self) -> ConfigurationData {
        utils::lock(&self.data).clone()
    }

    /// Loader of a started configuration.
    pub fn class_loader(&self) -> Option<Arc<ClassLoader>> {
        utils::lock(&self.class_loader).clone()
    }

    /// Registered members in start order.
    pub fn members(&self) -> Vec<AbstractName> {
        utils::lock(&self.members).clone()
    }

    /// Type metadata of the configuration component.
    pub(crate) fn component_info() -> std::result::Result<ComponentInfo, ComponentError> {
        ComponentInfo::builder(CONFIGURATION_TYPE)
            .interface(CONFIGURATION_INTERFACE)
            .attribute(AttributeInfo::new("configId", ValueKind::Str).transient())
            .attribute(AttributeInfo::new("baseDir", ValueKind::Path).transient())
            .build()
    }

    /// Descriptor under which this configuration registers itself. The
    /// parent configuration, if any, is an explicit dependency.
    pub(crate) fn descriptor(&self, info: Arc<ComponentInfo>) -> Result<ComponentDescriptor> {
        let mut descriptor = ComponentDescriptor::new(self.name.clone(), info);
        descriptor.set_attribute("configId", self.id.to_string())?;
        if let Some(base_dir) = &self.base_dir {
            descriptor.set_attribute("baseDir", base_dir.clone())?;
        }
        if let Some(parent) = self.parent() {
            descriptor.add_dependency(AbstractName::for_configuration(&parent));
        }
        Ok(descriptor)
    }

    /// Loader chained to the parent configuration's, or to the kernel's system loader.
    fn build_class_loader(&self, kernel: &Kernel, data: &ConfigurationData) -> Result<Arc<ClassLoader>> {
        let repositories = kernel.repositories();
        let mut artifacts = Vec::with_capacity(data.dependencies.len());
        for artifact in &data.dependencies {
            let repository = repositories.iter().find(|r| r.has_artifact(artifact)).ok_or_else(|| {
                ConfigurationError::MissingDependencyArtifact {
                    id: self.id.clone(),
                    artifact: artifact.clone(),
                }
            })?;
            let location = repository.resolve(artifact)?;
            log::debug!("{}: resolved {} at {} ({})", self.id, artifact, location.display(), repository.name());
            artifacts.push(artifact.clone());
        }

        let base_dir = self.base_dir.clone().unwrap_or_default();
        let classpath: Vec<PathBuf> = data.classpath.iter().map(|entry| base_dir.join(entry)).collect();
        log::debug!("{}: classpath {:?}", self.id, classpath);

        let parent = match &data.parent {
            None => kernel.system_loader(),
            Some(parent_id) => {
                let not_running = || ConfigurationError::ParentNotRunning {
                    id: self.id.clone(),
                    parent: parent_id.clone(),
                };
                let parent = kernel.configuration(parent_id).ok_or_else(not_running)?;
                if !kernel.is_running(parent.name()) {
                    return Err(not_running().into());
                }
                parent.class_loader().ok_or_else(not_running)?
            }
        };
        Ok(Arc::new(ClassLoader::child(&self.id.to_string(), parent, artifacts, classpath)))
    }

    /// Resolve, decode and register every member. Registration is rolled
    /// back if any member fails to register.
    pub(crate) async fn start(&self, kernel: &Kernel) -> Result<()> {
        let data = self.data();
        let loader = self.build_class_loader(kernel, &data)?;

        let mut descriptors = decode_descriptors(data.components(), |type_name| loader.load_info(type_name))?;
        if let Some(base_dir) = &self.base_dir {
            for descriptor in &mut descriptors {
                let declares_base_dir = descriptor
                    .info()
                    .attribute(CONFIGURATION_BASE_DIR)
                    .is_some_and(|a| a.kind == ValueKind::Path);
                if declares_base_dir {
                    descriptor.set_attribute(CONFIGURATION_BASE_DIR, base_dir.clone())?;
                }
            }
        }

        let ordered = member_order(descriptors)?;
        let mut registered: Vec<AbstractName> = Vec::with_capacity(ordered.len());
        for descriptor in ordered {
            let member = descriptor.name().clone();
            if let Err(e) = kernel.register_component_with_loader(descriptor, Arc::clone(&loader)) {
                log::warn!("{}: registering {} failed, rolling back: {}", self.id, member, e);
                for name in registered.iter().rev() {
                    if let Err(rollback) = kernel.unregister_component(name).await {
                        log::warn!("Could not unregister {}: {}", name, rollback);
                    }
                }
                return Err(e);
            }
            kernel.add_dependency(&member, &self.name);
            registered.push(member);
        }

        log::info!("Configuration {} registered {} component(s)", self.id, registered.len());
        *utils::lock(&self.members) = registered;
        *utils::lock(&self.class_loader) = Some(loader);
        Ok(())
    }

    /// Members are already stopped. Capture their state, unregister them and
    /// hand the new state to the store. Every failure here is logged only.
    pub(crate) async fn stop(&self, kernel: &Kernel) {
        let members = std::mem::take(&mut *utils::lock(&self.members));

        let mut snapshot = Vec::with_capacity(members.len());
        let mut complete = true;
        for member in &members {
            match kernel.component_descriptor(member) {
                Ok(descriptor) => snapshot.push(descriptor),
                Err(e) => {
                    log::info!("Unable to capture state of {}: {}", member, e);
                    complete = false;
                }
            }
        }

        for member in &members {
            kernel.remove_dependency(member, &self.name);
        }
        for member in members.iter().rev() {
            if let Err(e) = kernel.unregister_component(member).await {
                log::warn!("Could not unregister child {}: {}", member, e);
            }
        }

        if complete {
            let updated = {
                let mut data = utils::lock(&self.data);
                match data.set_components(&snapshot) {
                    Ok(()) => Some(data.clone()),
                    Err(e) => {
                        log::info!("Unable to update persistent state during shutdown: {}", e);
                        None
                    }
                }
            };
            if let (Some(data), Some(store)) = (updated, kernel.store()) {
                if store.contains(&self.id) {
                    if let Err(e) = store.update_configuration(&data) {
                        log::warn!("Unable to store configuration {}: {}", self.id, e);
                    }
                }
            }
        }

        *utils::lock(&self.class_loader) = None;
        log::info!("Configuration {} stopped", self.id);
    }
}

/// Topological order of a descriptor set over the edges declared inside it:
/// explicit dependencies and reference patterns (or default queries) that
/// match siblings. Ties keep stream order.
fn member_order(descriptors: Vec<ComponentDescriptor>) -> Result<Vec<ComponentDescriptor>> {
    let names: Vec<AbstractName> = descriptors.iter().map(|d| d.name().clone()).collect();
    let mut unique = BTreeSet::new();
    for name in &names {
        if !unique.insert(name) {
            return Err(ComponentError::IdentityConflict(name.clone()).into());
        }
    }

    let siblings: Vec<(AbstractName, BTreeSet<String>)> = descriptors
        .iter()
        .map(|d| (d.name().clone(), d.info().interfaces().clone()))
        .collect();
    let order = topological_order(&names, |name| {
        let Some(descriptor) = descriptors.iter().find(|d| d.name() == name) else {
            return Vec::new();
        };
        let mut edges: Vec<AbstractName> = descriptor.dependencies().iter().cloned().collect();
        for reference in descriptor.info().references() {
            let pattern = descriptor
                .reference(&reference.name)
                .cloned()
                .or_else(|| reference.default.clone().map(ReferencePattern::Query));
            if let Some(pattern) = pattern {
                edges.extend(
                    siblings
                        .iter()
                        .filter(|(sibling, interfaces)| sibling != name && pattern.matches(sibling, interfaces))
                        .map(|(sibling, _)| sibling.clone()),
                );
            }
        }
        edges
    })?;

    let mut by_name: HashMap<AbstractName, ComponentDescriptor> =
        descriptors.into_iter().map(|d| (d.name().clone(), d)).collect();
    Ok(order.iter().filter_map(|n| by_name.remove(n)).collect())
}

/// The component a configuration registers for itself.
#[derive(Debug)]
struct ConfigurationComponent {
    configuration: Arc<Configuration>,
    kernel: KernelHandle,
}

impl ConfigurationComponent {
    fn kernel(&self) -> Result<Kernel> {
        self.kernel
            .upgrade()
            .ok_or_else(|| Error::other(format!("kernel of configuration {} is gone", self.configuration.id)))
    }
}

#[async_trait]
impl Component for ConfigurationComponent {
    async fn do_start(&self) -> Result<()> {
        let kernel = self.kernel()?;
        self.configuration.start(&kernel).await
    }

    async fn do_stop(&self) -> Result<()> {
        let kernel = self.kernel()?;
        self.configuration.stop(&kernel).await;
        Ok(())
    }

    async fn do_fail(&self) {
        // Start already rolled back any members it registered
        log::warn!("Configuration {} failed", self.configuration.id);
    }

    fn attribute(&self, name: &str) -> Option<AttributeValue> {
        match name {
            "configId" => Some(AttributeValue::Str(self.configuration.id.to_string())),
            "baseDir" => self.configuration.base_dir.clone().map(AttributeValue::Path),
            _ => None,
        }
    }
}

/// Factory bound to one loaded configuration; never placed in the type registry.
#[derive(Debug)]
pub(crate) struct ConfigurationFactory {
    configuration: Arc<Configuration>,
    info: Arc<ComponentInfo>,
}

impl ConfigurationFactory {
    pub(crate) fn new(configuration: Arc<Configuration>, info: Arc<ComponentInfo>) -> Self {
        Self { configuration, info }
    }
}

impl ComponentFactory for ConfigurationFactory {
    fn info(&self) -> Arc<ComponentInfo> {
        Arc::clone(&self.info)
    }

    fn create(&self, _args: ConstructorArgs, context: ComponentContext) -> Result<Arc<dyn Component>> {
        Ok(Arc::new(ConfigurationComponent {
            configuration: Arc::clone(&self.configuration),
            kernel: context.kernel,
        }))
    }
}
