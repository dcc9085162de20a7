use std::collections::BTreeSet;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use crate::naming::{AbstractName, AbstractNameQuery};
use crate::utils;

/// Lifecycle notifications, one per transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleEvent {
    Loaded,
    Starting,
    Running,
    Stopping,
    Stopped,
    Failed,
    Unloaded,
}

/// Receives lifecycle events. Called synchronously on the transitioning
/// task, so implementations must not block.
pub trait LifecycleListener: Send + Sync {
    fn on_event(&self, name: &AbstractName, event: LifecycleEvent);
}

impl<F> LifecycleListener for F
where
    F: Fn(&AbstractName, LifecycleEvent) + Send + Sync,
{
    fn on_event(&self, name: &AbstractName, event: LifecycleEvent) {
        self(name, event)
    }
}

/// Handle returned by [`LifecycleMonitor::add_listener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

struct Registration {
    id: ListenerId,
    filter: Option<AbstractNameQuery>,
    listener: Arc<dyn LifecycleListener>,
}

/// Fans lifecycle events out to listeners, optionally filtered by a name query.
#[derive(Default)]
pub struct LifecycleMonitor {
    next_id: AtomicU64,
    listeners: RwLock<Vec<Registration>>,
}

impl fmt::Debug for LifecycleMonitor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LifecycleMonitor")
            .field("listeners", &utils::read(&self.listeners).len())
            .finish()
    }
}

impl LifecycleMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener. With a filter, only components matching it are reported.
    pub fn add_listener(&self, filter: Option<AbstractNameQuery>, listener: Arc<dyn LifecycleListener>) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::SeqCst));
        utils::write(&self.listeners).push(Registration { id, filter, listener });
        id
    }

    pub fn remove_listener(&self, id: ListenerId) -> bool {
        let mut listeners = utils::write(&self.listeners);
        let before = listeners.len();
        listeners.retain(|r| r.id != id);
        listeners.len() < before
    }

    pub(crate) fn notify(&self, name: &AbstractName, interfaces: &BTreeSet<String>, event: LifecycleEvent) {
        // Listeners run outside the lock so they may add or remove listeners
        let targets: Vec<Arc<dyn LifecycleListener>> = utils::read(&self.listeners)
            .iter()
            .filter(|r| r.filter.as_ref().is_none_or(|q| q.matches(name, interfaces)))
            .map(|r| Arc::clone(&r.listener))
            .collect();
        for listener in targets {
            listener.on_event(name, event);
        }
    }
}
