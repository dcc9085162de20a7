use std::fmt::{self, Debug};
use std::sync::Arc;

use async_trait::async_trait;

use crate::component::error::ComponentError;
use crate::component::info::ComponentInfo;
use crate::component::loader::ClassLoader;
use crate::component::value::AttributeValue;
use crate::kernel::error::Result;
use crate::kernel::KernelHandle;
use crate::naming::AbstractName;

/// Live target of a registered component.
///
/// Every hook has a default so simple components only implement what they
/// need. Attribute and operation calls arrive already checked against the
/// component's [`ComponentInfo`].
#[async_trait]
pub trait Component: Send + Sync + Debug {
    async fn do_start(&self) -> Result<()> {
        Ok(())
    }

    async fn do_stop(&self) -> Result<()> {
        Ok(())
    }

    /// Called after a failed construction, start or stop. Best effort only.
    async fn do_fail(&self) {}

    /// Current value of an attribute, if the target tracks it itself.
    fn attribute(&self, _name: &str) -> Option<AttributeValue> {
        None
    }

    /// Receives attribute values that are not constructor parameters, and
    /// runtime updates of mutable attributes.
    fn set_attribute(&self, _name: &str, _value: &AttributeValue) -> Result<()> {
        Ok(())
    }

    /// Receives the resolved targets of references that are not constructor
    /// parameters. Called before `do_start`.
    fn set_reference(&self, _name: &str, _targets: &[AbstractName]) -> Result<()> {
        Ok(())
    }

    async fn invoke(&self, operation: &str, args: Vec<AttributeValue>) -> Result<AttributeValue> {
        Err(ComponentError::NoSuchOperation {
            target: std::any::type_name::<Self>().to_string(),
            operation: operation.to_string(),
            arity: args.len(),
        }
        .into())
    }
}

/// One constructor parameter, by slot kind.
#[derive(Debug, Clone, PartialEq)]
pub enum ConstructorArg {
    Value(AttributeValue),
    Single(Option<AbstractName>),
    Multiple(Vec<AbstractName>),
}

/// Constructor parameters in the order declared by [`ComponentInfo::constructor`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConstructorArgs {
    entries: Vec<(String, ConstructorArg)>,
}

impl ConstructorArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: &str, arg: ConstructorArg) {
        self.entries.push((name.to_string(), arg));
    }

    pub fn get(&self, name: &str) -> Option<&ConstructorArg> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, a)| a)
    }

    /// Attribute value for `name`; `None` when absent or not an attribute.
    pub fn value(&self, name: &str) -> Option<&AttributeValue> {
        match self.get(name) {
            Some(ConstructorArg::Value(value)) => Some(value),
            _ => None,
        }
    }

    /// Target of a single-valued reference.
    pub fn reference(&self, name: &str) -> Option<&AbstractName> {
        match self.get(name) {
            Some(ConstructorArg::Single(target)) => target.as_ref(),
            Some(ConstructorArg::Multiple(targets)) => targets.first(),
            _ => None,
        }
    }

    /// Targets of a reference of either arity.
    pub fn references(&self, name: &str) -> Vec<AbstractName> {
        match self.get(name) {
            Some(ConstructorArg::Single(target)) => target.iter().cloned().collect(),
            Some(ConstructorArg::Multiple(targets)) => targets.clone(),
            _ => Vec::new(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ConstructorArg)> {
        self.entries.iter().map(|(n, a)| (n.as_str(), a))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// What a factory gets to know about the component it is building.
#[derive(Clone)]
pub struct ComponentContext {
    pub name: AbstractName,
    /// Weak handle; components call other components by name through it
    pub kernel: KernelHandle,
    pub class_loader: Arc<ClassLoader>,
}

impl Debug for ComponentContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentContext")
            .field("name", &self.name)
            .field("class_loader", &self.class_loader.name())
            .finish()
    }
}

/// Builds live targets for one component type.
pub trait ComponentFactory: Send + Sync + Debug {
    fn info(&self) -> Arc<ComponentInfo>;

    fn create(&self, args: ConstructorArgs, context: ComponentContext) -> Result<Arc<dyn Component>>;
}

type CreateFn = dyn Fn(ConstructorArgs, ComponentContext) -> Result<Arc<dyn Component>> + Send + Sync;

/// Factory backed by a closure.
pub struct FnComponentFactory {
    info: Arc<ComponentInfo>,
    create: Box<CreateFn>,
}

impl FnComponentFactory {
    pub fn new<F>(info: ComponentInfo, create: F) -> Self
    where
        F: Fn(ConstructorArgs, ComponentContext) -> Result<Arc<dyn Component>> + Send + Sync + 'static,
    {
        Self {
            info: Arc::new(info),
            create: Box::new(create),
        }
    }
}

impl Debug for FnComponentFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnComponentFactory")
            .field("type_name", &self.info.type_name())
            .finish()
    }
}

impl ComponentFactory for FnComponentFactory {
    fn info(&self) -> Arc<ComponentInfo> {
        Arc::clone(&self.info)
    }

    fn create(&self, args: ConstructorArgs, context: ComponentContext) -> Result<Arc<dyn Component>> {
        (self.create)(args, context)
    }
}
