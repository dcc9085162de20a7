//! Start and stop transitions of registered components.
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use crate::component::{
    AttributeValue, Component, ComponentContext, ComponentDescriptor, ComponentError, ComponentInstance, ConstructorArg,
    ConstructorArgs, LifecyclePhase, LifecycleState,
};
use crate::dependency::DependencyError;
use crate::kernel::state::{capture_persistent_attributes, Kernel};
use crate::kernel::error::{Error, Result};
use crate::kernel::monitor::LifecycleEvent;
use crate::naming::AbstractName;
use crate::utils;

/// How [`Kernel::stop_component`] treats running dependents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StopMode {
    /// Refuse while anything live depends on the component
    #[default]
    Normal,
    /// Stop every live transitive dependent first, deepest first
    Cascade,
}

impl Kernel {
    /// Start one component. Every dependency must already be running.
    ///
    /// Starting a running component is a no-op. A concurrent transition of
    /// the same name is waited for and its outcome observed.
    pub async fn start_component(&self, name: &AbstractName) -> Result<()> {
        let instance = self.inner.registry.require(name)?;
        let _transition = instance.lock_transition().await;

        let state = instance.state();
        if state == LifecycleState::Running {
            return Ok(());
        }
        if !state.can_start() {
            return Err(ComponentError::InvalidState {
                name: name.clone(),
                state,
                operation: "start".to_string(),
            }
            .into());
        }

        let descriptor = instance.descriptor();
        let mut resolved = BTreeMap::new();
        for reference in instance.info().references() {
            let targets = self.resolve_reference(name, reference, descriptor.reference(&reference.name))?;
            resolved.insert(reference.name.clone(), targets);
        }
        let targets: BTreeSet<AbstractName> = resolved.values().flatten().cloned().collect();
        self.refresh_reference_edges(&instance, descriptor.dependencies(), targets);

        for dependency in self.dependencies_of(name) {
            let state = self.inner.registry.get(&dependency).map(|i| i.state());
            if state != Some(LifecycleState::Running) {
                return Err(ComponentError::DependencyNotRunning {
                    name: name.clone(),
                    dependency,
                    state: state.map(|s| s.to_string()).unwrap_or_else(|| "not registered".to_string()),
                }
                .into());
            }
        }

        instance.set_state(LifecycleState::Starting);
        self.notify(&instance, LifecycleEvent::Starting);

        let target = match self.construct(&instance, &descriptor, &resolved) {
            Ok(target) => target,
            Err(e) => return self.fail(&instance, None, LifecyclePhase::Construct, e).await,
        };
        instance.set_target(Some(Arc::clone(&target)));
        if let Err(e) = target.do_start().await {
            return self.fail(&instance, Some(target), LifecyclePhase::Start, e).await;
        }

        instance.set_state(LifecycleState::Running);
        self.notify(&instance, LifecycleEvent::Running);
        Ok(())
    }

    /// Build the target: constructor parameters in declared order, then the
    /// remaining attributes and references through the target's setters.
    fn construct(
        &self,
        instance: &ComponentInstance,
        descriptor: &ComponentDescriptor,
        resolved: &BTreeMap<String, Vec<AbstractName>>,
    ) -> Result<Arc<dyn Component>> {
        let info = instance.info();
        let mut args = ConstructorArgs::new();
        for parameter in info.constructor() {
            let arg = match info.reference(parameter) {
                Some(reference) => {
                    let targets = resolved.get(parameter).cloned().unwrap_or_default();
                    if reference.multiple {
                        ConstructorArg::Multiple(targets)
                    } else {
                        ConstructorArg::Single(targets.into_iter().next())
                    }
                }
                None => ConstructorArg::Value(descriptor.attribute(parameter).cloned().unwrap_or(AttributeValue::Null)),
            };
            args.push(parameter, arg);
        }

        let context = ComponentContext {
            name: instance.name().clone(),
            kernel: self.handle(),
            class_loader: Arc::clone(instance.class_loader()),
        };
        let target = instance.factory().create(args, context)?;

        let in_constructor = |slot: &str| info.constructor().iter().any(|p| p == slot);
        for attribute in info.attributes().iter().filter(|a| !in_constructor(&a.name)) {
            if let Some(value) = descriptor.attribute(&attribute.name).filter(|v| !v.is_null()) {
                target.set_attribute(&attribute.name, value)?;
            }
        }
        for (reference, targets) in resolved.iter().filter(|(r, _)| !in_constructor(r)) {
            target.set_reference(reference, targets)?;
        }
        Ok(target)
    }

    /// Move to `Failed`, give the target its fail hook and wrap the cause.
    async fn fail(
        &self,
        instance: &ComponentInstance,
        target: Option<Arc<dyn Component>>,
        phase: LifecyclePhase,
        error: Error,
    ) -> Result<()> {
        log::error!("Component {} failed during {}: {}", instance.name(), phase, error);
        instance.set_state(LifecycleState::Failed);
        instance.set_target(None);
        if let Some(target) = target {
            target.do_fail().await;
        }
        self.notify(instance, LifecycleEvent::Failed);
        Err(ComponentError::LifecycleHookFailure {
            name: instance.name().clone(),
            phase,
            source: Box::new(error),
        }
        .into())
    }

    /// Start `name` after everything it transitively depends on.
    ///
    /// Members are started one at a time in dependency order. The first
    /// failure is returned; members already started stay running.
    pub async fn start_component_recursive(&self, name: &AbstractName) -> Result<()> {
        self.inner.registry.require(name)?;

        // Targets registered after their dependent have no edge yet
        let mut closure = utils::lock(&self.inner.dependencies).dependency_closure(name);
        let mut refreshed = BTreeSet::new();
        loop {
            let pending: Vec<AbstractName> = closure.difference(&refreshed).cloned().collect();
            for member in pending {
                self.refresh_pending_references(&member).await;
                refreshed.insert(member);
            }
            let grown = utils::lock(&self.inner.dependencies).dependency_closure(name);
            if grown == closure {
                break;
            }
            closure = grown;
        }

        let order = utils::lock(&self.inner.dependencies).start_order(&closure, |n| self.inner.registry.sequence(n))?;
        log::debug!("Start order for {}: {} component(s)", name, order.len());
        for member in &order {
            if !self.inner.registry.contains(member) {
                return Err(ComponentError::DependencyNotRunning {
                    name: name.clone(),
                    dependency: member.clone(),
                    state: "not registered".to_string(),
                }
                .into());
            }
            self.start_component(member).await?;
        }
        Ok(())
    }

    /// Re-resolve the reference slots of a startable component and refresh
    /// its edges. Resolution errors are left for `start_component` to report.
    async fn refresh_pending_references(&self, name: &AbstractName) {
        let Some(instance) = self.inner.registry.get(name) else {
            return;
        };
        let _transition = instance.lock_transition().await;
        if !instance.state().can_start() {
            return;
        }
        let descriptor = instance.descriptor();
        let mut targets = BTreeSet::new();
        for reference in instance.info().references() {
            match self.resolve_reference(name, reference, descriptor.reference(&reference.name)) {
                Ok(resolved) => targets.extend(resolved),
                Err(e) => {
                    log::debug!("Leaving edges of {} as registered: {}", name, e);
                    return;
                }
            }
        }
        self.refresh_reference_edges(&instance, descriptor.dependencies(), targets);
    }

    /// Stop a component. Stopping a component that is not running is a no-op.
    pub async fn stop_component(&self, name: &AbstractName, mode: StopMode) -> Result<()> {
        self.inner.registry.require(name)?;
        if mode == StopMode::Cascade {
            let order = utils::lock(&self.inner.dependencies).stop_order(name, |n| self.inner.registry.sequence(n))?;
            for dependent in &order {
                // Earlier stops may have unregistered configuration members
                if self.is_live(dependent) {
                    self.stop_single(dependent).await?;
                }
            }
        }
        self.stop_single(name).await
    }

    async fn stop_single(&self, name: &AbstractName) -> Result<()> {
        let Some(instance) = self.inner.registry.get(name) else {
            return Ok(());
        };
        let _transition = instance.lock_transition().await;
        if instance.state() != LifecycleState::Running {
            return Ok(());
        }

        let live = utils::lock(&self.inner.dependencies).live_dependents(name, |d| self.is_live(d));
        if !live.is_empty() {
            return Err(DependencyError::HasDependents {
                name: name.clone(),
                dependents: live,
            }
            .into());
        }

        instance.set_state(LifecycleState::Stopping);
        self.notify(&instance, LifecycleEvent::Stopping);

        let target = instance.target();
        if let Some(target) = &target {
            if let Err(e) = target.do_stop().await {
                return self.fail(&instance, Some(Arc::clone(target)), LifecyclePhase::Stop, e).await;
            }
        }
        if let Err(e) = capture_persistent_attributes(&instance) {
            log::warn!("Unable to capture attributes of {}: {}", name, e);
        }

        instance.set_target(None);
        instance.set_state(LifecycleState::Stopped);
        self.notify(&instance, LifecycleEvent::Stopped);
        Ok(())
    }
}
