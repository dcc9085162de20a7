use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use crate::component::error::ComponentError;
use crate::component::instance::ComponentInstance;
use crate::naming::{AbstractName, AbstractNameQuery};
use crate::utils;

/// Name-to-instance map of every registered component.
///
/// The map lock is only held for lookups and updates, never across a
/// lifecycle hook.
#[derive(Debug, Default)]
pub struct ComponentRegistry {
    instances: RwLock<HashMap<AbstractName, Arc<ComponentInstance>>>,
    next_sequence: AtomicU64,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next registration sequence number.
    pub fn next_sequence(&self) -> u64 {
        self.next_sequence.fetch_add(1, Ordering::SeqCst)
    }

    /// Insert an instance; a bound name is left untouched.
    pub fn insert(&self, instance: Arc<ComponentInstance>) -> Result<(), ComponentError> {
        let mut instances = utils::write(&self.instances);
        if instances.contains_key(instance.name()) {
            return Err(ComponentError::IdentityConflict(instance.name().clone()));
        }
        instances.insert(instance.name().clone(), instance);
        Ok(())
    }

    pub fn remove(&self, name: &AbstractName) -> Option<Arc<ComponentInstance>> {
        utils::write(&self.instances).remove(name)
    }

    pub fn get(&self, name: &AbstractName) -> Option<Arc<ComponentInstance>> {
        utils::read(&self.instances).get(name).cloned()
    }

    /// Like [`get`](Self::get) but reporting a missing name.
    pub fn require(&self, name: &AbstractName) -> Result<Arc<ComponentInstance>, ComponentError> {
        self.get(name).ok_or_else(|| ComponentError::NotFound(name.clone()))
    }

    pub fn contains(&self, name: &AbstractName) -> bool {
        utils::read(&self.instances).contains_key(name)
    }

    /// Sequence number of a registered name; unknown names sort last.
    pub fn sequence(&self, name: &AbstractName) -> u64 {
        self.get(name).map(|i| i.sequence()).unwrap_or(u64::MAX)
    }

    /// All instances in registration order.
    pub fn instances(&self) -> Vec<Arc<ComponentInstance>> {
        let mut all: Vec<_> = utils::read(&self.instances).values().cloned().collect();
        all.sort_by_key(|i| i.sequence());
        all
    }

    pub fn names(&self) -> Vec<AbstractName> {
        self.instances().iter().map(|i| i.name().clone()).collect()
    }

    /// Instances matching `query`, in registration order.
    pub fn query(&self, query: &AbstractNameQuery) -> Vec<Arc<ComponentInstance>> {
        self.instances()
            .into_iter()
            .filter(|i| query.matches(i.name(), i.info().interfaces()))
            .collect()
    }

    pub fn len(&self) -> usize {
        utils::read(&self.instances).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
