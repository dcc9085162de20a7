use std::collections::BTreeSet;
use std::fmt;
use std::sync::{Arc, Mutex, RwLock};

use tokio::sync::{Mutex as AsyncMutex, MutexGuard as AsyncMutexGuard};

use crate::component::descriptor::ComponentDescriptor;
use crate::component::info::ComponentInfo;
use crate::component::lifecycle::LifecycleState;
use crate::component::loader::ClassLoader;
use crate::component::traits::{Component, ComponentFactory};
use crate::component::value::AttributeValue;
use crate::naming::AbstractName;
use crate::utils;

#[derive(Debug)]
struct InstanceData {
    descriptor: ComponentDescriptor,
    target: Option<Arc<dyn Component>>,
    /// Edges added for resolved reference targets, refreshed at each start
    reference_edges: BTreeSet<AbstractName>,
}

/// Live registry record of one component.
///
/// The published state can be read at any time. Transitions are serialized
/// by a per-instance async lock, so a slow hook only blocks callers
/// interested in the same name.
pub struct ComponentInstance {
    name: AbstractName,
    sequence: u64,
    info: Arc<ComponentInfo>,
    factory: Arc<dyn ComponentFactory>,
    class_loader: Arc<ClassLoader>,
    transition: AsyncMutex<()>,
    state: RwLock<LifecycleState>,
    data: Mutex<InstanceData>,
}

impl ComponentInstance {
    pub(crate) fn new(
        descriptor: ComponentDescriptor,
        sequence: u64,
        factory: Arc<dyn ComponentFactory>,
        class_loader: Arc<ClassLoader>,
    ) -> Self {
        Self {
            name: descriptor.name().clone(),
            sequence,
            info: Arc::clone(descriptor.info()),
            factory,
            class_loader,
            transition: AsyncMutex::new(()),
            state: RwLock::new(LifecycleState::Registered),
            data: Mutex::new(InstanceData {
                descriptor,
                target: None,
                reference_edges: BTreeSet::new(),
            }),
        }
    }

    pub fn name(&self) -> &AbstractName {
        &self.name
    }

    /// Registration sequence number, used to break ordering ties.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn info(&self) -> &Arc<ComponentInfo> {
        &self.info
    }

    pub(crate) fn factory(&self) -> &Arc<dyn ComponentFactory> {
        &self.factory
    }

    pub fn class_loader(&self) -> &Arc<ClassLoader> {
        &self.class_loader
    }

    pub fn state(&self) -> LifecycleState {
        *utils::read(&self.state)
    }

    pub(crate) fn set_state(&self, state: LifecycleState) {
        let mut current = utils::write(&self.state);
        debug_assert!(current.can_transition_to(state), "{}: {} -> {}", self.name, *current, state);
        log::debug!("{}: {} -> {}", self.name, *current, state);
        *current = state;
    }

    pub(crate) async fn lock_transition(&self) -> AsyncMutexGuard<'_, ()> {
        self.transition.lock().await
    }

    /// Copy of the stored descriptor (attribute values as last stored).
    pub fn descriptor(&self) -> ComponentDescriptor {
        utils::lock(&self.data).descriptor.clone()
    }

    pub(crate) fn target(&self) -> Option<Arc<dyn Component>> {
        utils::lock(&self.data).target.clone()
    }

    pub(crate) fn set_target(&self, target: Option<Arc<dyn Component>>) {
        utils::lock(&self.data).target = target;
    }

    pub(crate) fn reference_edges(&self) -> BTreeSet<AbstractName> {
        utils::lock(&self.data).reference_edges.clone()
    }

    pub(crate) fn set_reference_edges(&self, edges: BTreeSet<AbstractName>) {
        utils::lock(&self.data).reference_edges = edges;
    }

    /// Stored value of an attribute, falling back to the schema default.
    pub fn stored_attribute(&self, name: &str) -> Option<AttributeValue> {
        utils::lock(&self.data).descriptor.attribute(name).cloned()
    }

    /// Store a validated value.
    pub(crate) fn store_attribute(&self, name: &str, value: AttributeValue) -> Result<(), crate::component::ComponentError> {
        utils::lock(&self.data).descriptor.set_attribute(name, value)
    }
}

impl fmt::Debug for ComponentInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentInstance")
            .field("name", &self.name)
            .field("sequence", &self.sequence)
            .field("type", &self.info.type_name())
            .field("state", &self.state())
            .finish()
    }
}
