use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::{Arc, Mutex, RwLock, Weak};

use crate::component::{
    AttributeValue, ClassLoader, ComponentDescriptor, ComponentError, ComponentFactory, ComponentInstance,
    ComponentRegistry, LifecycleState, ReferenceInfo, ReferencePattern, TypeRegistry,
};
use crate::config::{ConfigId, Configuration};
use crate::dependency::{DependencyError, DependencyManager};
use crate::kernel::constants::DEFAULT_KERNEL_NAME;
use crate::kernel::error::Result;
use crate::kernel::monitor::{LifecycleEvent, LifecycleMonitor};
use crate::naming::{AbstractName, AbstractNameQuery};
use crate::repository::{LocalRepository, Repository};
use crate::settings::KernelSettings;
use crate::store::{ConfigurationStore, LocalConfigStore};
use crate::utils;

pub(crate) struct KernelInner {
    name: String,
    types: Arc<TypeRegistry>,
    system_loader: Arc<ClassLoader>,
    pub(crate) registry: ComponentRegistry,
    pub(crate) dependencies: Mutex<DependencyManager>,
    repositories: RwLock<Vec<Arc<dyn Repository>>>,
    store: RwLock<Option<Arc<dyn ConfigurationStore>>>,
    pub(crate) configurations: Mutex<BTreeMap<ConfigId, Arc<Configuration>>>,
    monitor: LifecycleMonitor,
}

/// The component kernel.
///
/// A cheap-to-clone handle around shared state: registry, dependency graph,
/// repositories, configuration store and loaded configurations. Kernels are
/// independent of each other; nothing is global.
#[derive(Clone)]
pub struct Kernel {
    pub(crate) inner: Arc<KernelInner>,
}

/// Non-owning kernel handle given to components, so a component never keeps
/// its kernel alive.
#[derive(Clone)]
pub struct KernelHandle {
    inner: Weak<KernelInner>,
}

impl KernelHandle {
    pub fn upgrade(&self) -> Option<Kernel> {
        self.inner.upgrade().map(|inner| Kernel { inner })
    }
}

impl fmt::Debug for KernelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KernelHandle")
            .field("alive", &(self.inner.strong_count() > 0))
            .finish()
    }
}

impl fmt::Debug for Kernel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Kernel")
            .field("name", &self.inner.name)
            .field("components", &self.inner.registry.len())
            .finish()
    }
}

impl Kernel {
    pub fn new(name: &str) -> Self {
        let types = Arc::new(TypeRegistry::new());
        let system_loader = Arc::new(ClassLoader::system(Arc::clone(&types)));
        log::debug!("Creating kernel {}", name);
        Self {
            inner: Arc::new(KernelInner {
                name: name.to_string(),
                types,
                system_loader,
                registry: ComponentRegistry::new(),
                dependencies: Mutex::new(DependencyManager::new()),
                repositories: RwLock::new(Vec::new()),
                store: RwLock::new(None),
                configurations: Mutex::new(BTreeMap::new()),
                monitor: LifecycleMonitor::new(),
            }),
        }
    }

    /// Kernel with the repositories and store named in `settings`.
    /// Component types still have to be registered before configurations load.
    pub fn from_settings(settings: &KernelSettings) -> Result<Self> {
        let name = settings.kernel_name.as_deref().unwrap_or(DEFAULT_KERNEL_NAME);
        let kernel = Kernel::new(name);
        for root in &settings.repositories {
            kernel.add_repository(Arc::new(LocalRepository::new(root.clone())));
        }
        if let Some(root) = &settings.store_root {
            kernel.set_store(Arc::new(LocalConfigStore::open(root.clone())?));
        }
        Ok(kernel)
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn handle(&self) -> KernelHandle {
        KernelHandle {
            inner: Arc::downgrade(&self.inner),
        }
    }

    pub fn system_loader(&self) -> Arc<ClassLoader> {
        Arc::clone(&self.inner.system_loader)
    }

    pub fn types(&self) -> &Arc<TypeRegistry> {
        &self.inner.types
    }

    /// Make a component type available to class loaders of this kernel.
    pub fn register_type(&self, factory: Arc<dyn ComponentFactory>) -> Result<()> {
        self.inner.types.register(factory)?;
        Ok(())
    }

    /// Append a repository; earlier repositories take priority.
    pub fn add_repository(&self, repository: Arc<dyn Repository>) {
        log::debug!("Adding repository {}", repository.name());
        utils::write(&self.inner.repositories).push(repository);
    }

    pub fn repositories(&self) -> Vec<Arc<dyn Repository>> {
        utils::read(&self.inner.repositories).clone()
    }

    pub fn set_store(&self, store: Arc<dyn ConfigurationStore>) {
        *utils::write(&self.inner.store) = Some(store);
    }

    pub fn store(&self) -> Option<Arc<dyn ConfigurationStore>> {
        utils::read(&self.inner.store).clone()
    }

    pub fn monitor(&self) -> &LifecycleMonitor {
        &self.inner.monitor
    }

    pub(crate) fn notify(&self, instance: &ComponentInstance, event: LifecycleEvent) {
        self.inner
            .monitor
            .notify(instance.name(), instance.info().interfaces(), event);
    }

    // --- Registration ---

    /// Register a component whose type is loaded through the system class loader.
    pub fn register_component(&self, descriptor: ComponentDescriptor) -> Result<()> {
        self.register_component_with_loader(descriptor, self.system_loader())
    }

    /// Register a component whose type must be visible from `class_loader`.
    pub fn register_component_with_loader(
        &self,
        descriptor: ComponentDescriptor,
        class_loader: Arc<ClassLoader>,
    ) -> Result<()> {
        let factory = class_loader.load_type(descriptor.type_name())?;
        self.register_instance(descriptor, factory, class_loader)
    }

    /// Register with an explicit factory, bypassing type lookup.
    pub(crate) fn register_instance(
        &self,
        descriptor: ComponentDescriptor,
        factory: Arc<dyn ComponentFactory>,
        class_loader: Arc<ClassLoader>,
    ) -> Result<()> {
        let name = descriptor.name().clone();
        if self.inner.registry.contains(&name) {
            return Err(ComponentError::IdentityConflict(name).into());
        }

        let info = Arc::clone(descriptor.info());
        let mut reference_edges = BTreeSet::new();
        for reference in info.references() {
            match self.resolve_reference(&name, reference, descriptor.reference(&reference.name)) {
                Ok(targets) => reference_edges.extend(targets),
                // Constructor references are needed to build the target at all
                Err(e) if info.constructor().contains(&reference.name) => return Err(e.into()),
                Err(_) => {}
            }
        }
        let explicit = descriptor.dependencies().clone();

        let sequence = self.inner.registry.next_sequence();
        let instance = Arc::new(ComponentInstance::new(descriptor, sequence, factory, class_loader));
        instance.set_reference_edges(reference_edges.clone());
        self.inner.registry.insert(Arc::clone(&instance))?;

        {
            let mut dependencies = utils::lock(&self.inner.dependencies);
            for target in reference_edges.iter().chain(explicit.iter()) {
                dependencies.add_dependency(&name, target);
            }
        }
        log::trace!("Registered {} ({})", name, info.type_name());
        self.notify(&instance, LifecycleEvent::Loaded);
        Ok(())
    }

    /// Remove a component. Allowed from `Registered`, `Stopped` and `Failed`,
    /// and only while no registered component depends on it.
    pub async fn unregister_component(&self, name: &AbstractName) -> Result<()> {
        let instance = self.inner.registry.require(name)?;
        let _transition = instance.lock_transition().await;

        let state = instance.state();
        if !state.can_unregister() {
            return Err(ComponentError::InvalidState {
                name: name.clone(),
                state,
                operation: "unregister".to_string(),
            }
            .into());
        }
        let dependents: Vec<AbstractName> = utils::lock(&self.inner.dependencies)
            .dependents(name)
            .into_iter()
            .filter(|d| self.inner.registry.contains(d))
            .collect();
        if !dependents.is_empty() {
            return Err(DependencyError::HasDependents {
                name: name.clone(),
                dependents,
            }
            .into());
        }

        self.inner.registry.remove(name);
        utils::lock(&self.inner.dependencies).remove_all(name);
        instance.set_target(None);
        instance.set_state(LifecycleState::Unregistered);
        log::trace!("Unregistered {}", name);
        self.notify(&instance, LifecycleEvent::Unloaded);
        Ok(())
    }

    // --- References ---

    /// Targets of one reference slot against the current registry.
    ///
    /// A descriptor pattern that matches nothing falls back to the schema's
    /// default query. A component never resolves to itself.
    pub(crate) fn resolve_reference(
        &self,
        owner: &AbstractName,
        reference: &ReferenceInfo,
        pattern: Option<&ReferencePattern>,
    ) -> std::result::Result<Vec<AbstractName>, ComponentError> {
        let find = |pattern: &ReferencePattern| -> Vec<AbstractName> {
            self.inner
                .registry
                .instances()
                .iter()
                .filter(|i| i.name() != owner && pattern.matches(i.name(), i.info().interfaces()))
                .map(|i| i.name().clone())
                .collect()
        };

        let mut targets = pattern.map(find).unwrap_or_default();
        let mut described = pattern.map(|p| p.to_string());
        if targets.is_empty() {
            if let Some(default) = &reference.default {
                targets = find(&ReferencePattern::Query(default.clone()));
                described = Some(default.to_string());
            }
        }

        let acceptable = match (reference.multiple, targets.len()) {
            (_, 0) => !reference.required,
            (false, 1) => true,
            (false, _) => false,
            (true, _) => true,
        };
        if !acceptable {
            return Err(ComponentError::UnresolvedReference {
                name: owner.clone(),
                reference: reference.name.clone(),
                pattern: described.unwrap_or_else(|| "<no pattern>".to_string()),
                matches: targets.len(),
            });
        }
        Ok(targets)
    }

    /// Replace the reference edges of `instance` with edges to `targets`,
    /// keeping explicitly declared dependencies.
    pub(crate) fn refresh_reference_edges(
        &self,
        instance: &ComponentInstance,
        explicit: &BTreeSet<AbstractName>,
        targets: BTreeSet<AbstractName>,
    ) {
        let previous = instance.reference_edges();
        let mut dependencies = utils::lock(&self.inner.dependencies);
        for stale in previous.difference(&targets) {
            if !explicit.contains(stale) {
                dependencies.remove_dependency(instance.name(), stale);
            }
        }
        for target in &targets {
            dependencies.add_dependency(instance.name(), target);
        }
        drop(dependencies);
        instance.set_reference_edges(targets);
    }

    // --- Dependency edges ---

    pub fn add_dependency(&self, dependent: &AbstractName, dependency: &AbstractName) -> bool {
        utils::lock(&self.inner.dependencies).add_dependency(dependent, dependency)
    }

    pub fn remove_dependency(&self, dependent: &AbstractName, dependency: &AbstractName) -> bool {
        utils::lock(&self.inner.dependencies).remove_dependency(dependent, dependency)
    }

    pub fn dependencies_of(&self, name: &AbstractName) -> BTreeSet<AbstractName> {
        utils::lock(&self.inner.dependencies).dependencies(name)
    }

    pub fn dependents_of(&self, name: &AbstractName) -> BTreeSet<AbstractName> {
        utils::lock(&self.inner.dependencies).dependents(name)
    }

    pub(crate) fn is_live(&self, name: &AbstractName) -> bool {
        self.inner.registry.get(name).is_some_and(|i| i.state().is_live())
    }

    // --- Queries ---

    pub fn state(&self, name: &AbstractName) -> Result<LifecycleState> {
        Ok(self.inner.registry.require(name)?.state())
    }

    pub fn is_loaded(&self, name: &AbstractName) -> bool {
        self.inner.registry.contains(name)
    }

    pub fn is_running(&self, name: &AbstractName) -> bool {
        self.inner
            .registry
            .get(name)
            .is_some_and(|i| i.state() == LifecycleState::Running)
    }

    /// Names matching `query`, in registration order.
    pub fn list_components(&self, query: &AbstractNameQuery) -> Vec<AbstractName> {
        self.inner
            .registry
            .query(query)
            .iter()
            .map(|i| i.name().clone())
            .collect()
    }

    /// The single component matching `query`.
    pub fn resolve_one(&self, query: &AbstractNameQuery) -> Result<AbstractName> {
        let mut matches = self.list_components(query);
        if matches.len() != 1 {
            return Err(ComponentError::QueryNotUnique {
                query: query.to_string(),
                matches: matches.len(),
            }
            .into());
        }
        Ok(matches.remove(0))
    }

    /// Descriptor of a registered component with the live values of its
    /// persistent attributes.
    pub fn component_descriptor(&self, name: &AbstractName) -> Result<ComponentDescriptor> {
        let instance = self.inner.registry.require(name)?;
        capture_persistent_attributes(&instance)?;
        Ok(instance.descriptor())
    }

    // --- Attributes and operations ---

    /// Live value when the running target reports one, else the stored value.
    pub fn get_attribute(&self, name: &AbstractName, attribute: &str) -> Result<AttributeValue> {
        let instance = self.inner.registry.require(name)?;
        if instance.info().attribute(attribute).is_none() {
            return Err(ComponentError::schema(instance.info().type_name(), attribute, "no such attribute").into());
        }
        if let Some(value) = instance.target().and_then(|t| t.attribute(attribute)) {
            return Ok(value);
        }
        Ok(instance.stored_attribute(attribute).unwrap_or(AttributeValue::Null))
    }

    /// Validate and store a value. While running the attribute must be
    /// mutable at runtime, and the value is pushed into the live target.
    pub fn set_attribute(&self, name: &AbstractName, attribute: &str, value: AttributeValue) -> Result<()> {
        let instance = self.inner.registry.require(name)?;
        let info = instance.info().check_attribute(attribute, &value)?.clone();
        if let Some(target) = instance.target() {
            if !info.mutable_at_runtime {
                return Err(ComponentError::AttributeNotMutable {
                    name: name.clone(),
                    attribute: attribute.to_string(),
                }
                .into());
            }
            target.set_attribute(attribute, &value)?;
        }
        instance.store_attribute(attribute, value)?;
        Ok(())
    }

    /// Call a declared operation on a running component.
    pub async fn invoke(&self, name: &AbstractName, operation: &str, args: Vec<AttributeValue>) -> Result<AttributeValue> {
        let instance = self.inner.registry.require(name)?;
        let declared = instance
            .info()
            .operation(operation, args.len())
            .ok_or_else(|| ComponentError::NoSuchOperation {
                target: name.to_string(),
                operation: operation.to_string(),
                arity: args.len(),
            })?;
        for (i, (arg, kind)) in args.iter().zip(&declared.parameters).enumerate() {
            if !arg.conforms_to(*kind) {
                return Err(ComponentError::schema(
                    instance.info().type_name(),
                    &format!("{}#{}", operation, i),
                    format!("expected {}", kind),
                )
                .into());
            }
        }
        let target = match (instance.state(), instance.target()) {
            (LifecycleState::Running, Some(target)) => target,
            (state, _) => {
                return Err(ComponentError::InvalidState {
                    name: name.clone(),
                    state,
                    operation: format!("invoke '{}'", operation),
                }
                .into());
            }
        };
        target.invoke(operation, args).await
    }

    // --- Configurations ---

    /// A loaded configuration.
    pub fn configuration(&self, id: &ConfigId) -> Option<Arc<Configuration>> {
        utils::lock(&self.inner.configurations).get(id).cloned()
    }

    pub fn loaded_configurations(&self) -> Vec<ConfigId> {
        utils::lock(&self.inner.configurations).keys().cloned().collect()
    }
}

/// Copy the live values of persistent attributes back into the stored descriptor.
pub(crate) fn capture_persistent_attributes(instance: &ComponentInstance) -> Result<()> {
    let Some(target) = instance.target() else {
        return Ok(());
    };
    for attribute in instance.info().attributes().iter().filter(|a| a.persistent) {
        if let Some(value) = target.attribute(&attribute.name) {
            instance.store_attribute(&attribute.name, value)?;
        }
    }
    Ok(())
}
