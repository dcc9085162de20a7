use std::fmt;

/// Lifecycle states of a registered component.
///
/// ```text
/// Registered -> Starting -> Running -> Stopping -> Stopped -> Unregistered
///                  ^                                  |
///                  +----------------------------------+
/// ```
/// Any transition may end in `Failed`; a failed component can only be
/// unregistered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleState {
    Registered,
    Starting,
    Running,
    Stopping,
    Stopped,
    Failed,
    Unregistered,
}

impl LifecycleState {
    /// States in which dependents must be accounted for before stopping.
    pub fn is_live(self) -> bool {
        matches!(self, LifecycleState::Starting | LifecycleState::Running | LifecycleState::Stopping)
    }

    pub fn can_start(self) -> bool {
        matches!(self, LifecycleState::Registered | LifecycleState::Stopped)
    }

    pub fn can_unregister(self) -> bool {
        matches!(self, LifecycleState::Registered | LifecycleState::Stopped | LifecycleState::Failed)
    }

    /// Whether the state machine allows moving from `self` to `next`.
    pub fn can_transition_to(self, next: LifecycleState) -> bool {
        use LifecycleState::*;
        match (self, next) {
            (_, Failed) => self != Unregistered,
            (Registered, Starting) | (Stopped, Starting) => true,
            (Starting, Running) => true,
            (Running, Stopping) => true,
            (Stopping, Stopped) => true,
            (Registered, Unregistered) | (Stopped, Unregistered) | (Failed, Unregistered) => true,
            _ => false,
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            LifecycleState::Registered => "registered",
            LifecycleState::Starting => "starting",
            LifecycleState::Running => "running",
            LifecycleState::Stopping => "stopping",
            LifecycleState::Stopped => "stopped",
            LifecycleState::Failed => "failed",
            LifecycleState::Unregistered => "unregistered",
        };
        f.write_str(label)
    }
}
