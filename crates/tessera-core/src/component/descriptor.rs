use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use crate::component::error::ComponentError;
use crate::component::info::ComponentInfo;
use crate::component::value::AttributeValue;
use crate::naming::{AbstractName, AbstractNameQuery};

/// How a descriptor selects the targets of one reference slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReferencePattern {
    Query(AbstractNameQuery),
    /// Explicit set of fully specified names
    Names(BTreeSet<AbstractName>),
}

impl ReferencePattern {
    pub fn matches(&self, name: &AbstractName, interfaces: &BTreeSet<String>) -> bool {
        match self {
            ReferencePattern::Query(query) => query.matches(name, interfaces),
            ReferencePattern::Names(names) => names.contains(name),
        }
    }
}

impl fmt::Display for ReferencePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReferencePattern::Query(query) => write!(f, "{}", query),
            ReferencePattern::Names(names) => {
                let names: Vec<String> = names.iter().map(|n| n.to_string()).collect();
                write!(f, "{{{}}}", names.join(", "))
            }
        }
    }
}

/// Serializable description of one component: identity, type, attribute
/// values, reference patterns and explicit dependencies.
#[derive(Debug, Clone)]
pub struct ComponentDescriptor {
    name: AbstractName,
    info: Arc<ComponentInfo>,
    attributes: BTreeMap<String, AttributeValue>,
    references: BTreeMap<String, ReferencePattern>,
    dependencies: BTreeSet<AbstractName>,
}

impl ComponentDescriptor {
    pub fn new(name: AbstractName, info: Arc<ComponentInfo>) -> Self {
        Self {
            name,
            info,
            attributes: BTreeMap::new(),
            references: BTreeMap::new(),
            dependencies: BTreeSet::new(),
        }
    }

    pub fn name(&self) -> &AbstractName {
        &self.name
    }

    pub fn info(&self) -> &Arc<ComponentInfo> {
        &self.info
    }

    pub fn type_name(&self) -> &str {
        self.info.type_name()
    }

    /// Explicitly set attribute values.
    pub fn attributes(&self) -> &BTreeMap<String, AttributeValue> {
        &self.attributes
    }

    /// Explicit value, else the schema default.
    pub fn attribute(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes
            .get(name)
            .or_else(|| self.info.attribute(name).and_then(|a| a.default.as_ref()))
    }

    pub fn set_attribute(&mut self, name: &str, value: impl Into<AttributeValue>) -> Result<(), ComponentError> {
        let value = value.into();
        self.info.check_attribute(name, &value)?;
        self.attributes.insert(name.to_string(), value);
        Ok(())
    }

    /// Builder-style [`set_attribute`](Self::set_attribute).
    pub fn with_attribute(mut self, name: &str, value: impl Into<AttributeValue>) -> Result<Self, ComponentError> {
        self.set_attribute(name, value)?;
        Ok(self)
    }

    pub fn references(&self) -> &BTreeMap<String, ReferencePattern> {
        &self.references
    }

    pub fn reference(&self, name: &str) -> Option<&ReferencePattern> {
        self.references.get(name)
    }

    pub fn set_reference(&mut self, name: &str, pattern: ReferencePattern) -> Result<(), ComponentError> {
        if self.info.reference(name).is_none() {
            return Err(ComponentError::schema(self.info.type_name(), name, "no such reference"));
        }
        self.references.insert(name.to_string(), pattern);
        Ok(())
    }

    /// Point a reference at a single fully specified name.
    pub fn set_reference_name(&mut self, name: &str, target: AbstractName) -> Result<(), ComponentError> {
        self.set_reference(name, ReferencePattern::Names(BTreeSet::from([target])))
    }

    pub fn dependencies(&self) -> &BTreeSet<AbstractName> {
        &self.dependencies
    }

    /// Declare an explicit dependency that is not expressed through a reference.
    pub fn add_dependency(&mut self, name: AbstractName) {
        if name != self.name {
            self.dependencies.insert(name);
        }
    }
}
