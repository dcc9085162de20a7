use std::collections::BTreeSet;

use crate::component::error::ComponentError;
use crate::component::value::{AttributeValue, ValueKind};
use crate::naming::AbstractNameQuery;
use crate::repository::Artifact;

/// Schema of one attribute slot.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeInfo {
    pub name: String,
    pub kind: ValueKind,
    /// Written back into the descriptor when the owning configuration stops
    pub persistent: bool,
    pub mutable_at_runtime: bool,
    pub default: Option<AttributeValue>,
}

impl AttributeInfo {
    /// Persistent, immutable while running, no default.
    pub fn new(name: &str, kind: ValueKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            persistent: true,
            mutable_at_runtime: false,
            default: None,
        }
    }

    pub fn transient(mut self) -> Self {
        self.persistent = false;
        self
    }

    pub fn mutable(mut self) -> Self {
        self.mutable_at_runtime = true;
        self
    }

    pub fn with_default(mut self, value: impl Into<AttributeValue>) -> Self {
        self.default = Some(value.into());
        self
    }
}

/// Schema of one reference slot.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceInfo {
    pub name: String,
    pub required: bool,
    /// Collection reference: any number of targets instead of exactly one
    pub multiple: bool,
    /// Query tried when the descriptor sets no pattern or its pattern matches nothing
    pub default: Option<AbstractNameQuery>,
}

impl ReferenceInfo {
    /// Required single-valued reference.
    pub fn single(name: &str) -> Self {
        Self {
            name: name.to_string(),
            required: true,
            multiple: false,
            default: None,
        }
    }

    /// Optional collection reference.
    pub fn multiple(name: &str) -> Self {
        Self {
            name: name.to_string(),
            required: false,
            multiple: true,
            default: None,
        }
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_default(mut self, query: AbstractNameQuery) -> Self {
        self.default = Some(query);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationInfo {
    pub name: String,
    pub parameters: Vec<ValueKind>,
}

/// Type metadata for a component: what it is called, which artifact
/// provides it, and the attributes, references and operations it declares.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentInfo {
    type_name: String,
    artifact: Option<Artifact>,
    interfaces: BTreeSet<String>,
    attributes: Vec<AttributeInfo>,
    references: Vec<ReferenceInfo>,
    operations: Vec<OperationInfo>,
    constructor: Vec<String>,
}

impl ComponentInfo {
    pub fn builder(type_name: &str) -> ComponentInfoBuilder {
        ComponentInfoBuilder::new(type_name)
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Artifact a class loader must see to load this type; `None` for system types.
    pub fn artifact(&self) -> Option<&Artifact> {
        self.artifact.as_ref()
    }

    pub fn interfaces(&self) -> &BTreeSet<String> {
        &self.interfaces
    }

    pub fn attributes(&self) -> &[AttributeInfo] {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&AttributeInfo> {
        self.attributes.iter().find(|a| a.name == name)
    }

    pub fn references(&self) -> &[ReferenceInfo] {
        &self.references
    }

    pub fn reference(&self, name: &str) -> Option<&ReferenceInfo> {
        self.references.iter().find(|r| r.name == name)
    }

    pub fn operations(&self) -> &[OperationInfo] {
        &self.operations
    }

    /// Operation with the given name and parameter count.
    pub fn operation(&self, name: &str, arity: usize) -> Option<&OperationInfo> {
        self.operations
            .iter()
            .find(|o| o.name == name && o.parameters.len() == arity)
    }

    /// Attribute and reference names in constructor parameter order.
    pub fn constructor(&self) -> &[String] {
        &self.constructor
    }

    /// Check a value against the declared kind of `attribute`.
    pub fn check_attribute(&self, attribute: &str, value: &AttributeValue) -> Result<&AttributeInfo, ComponentError> {
        let info = self
            .attribute(attribute)
            .ok_or_else(|| ComponentError::schema(&self.type_name, attribute, "no such attribute"))?;
        if !value.conforms_to(info.kind) {
            let actual = value.kind().map(|k| k.to_string()).unwrap_or_else(|| "null".to_string());
            return Err(ComponentError::schema(
                &self.type_name,
                attribute,
                format!("expected {}, got {}", info.kind, actual),
            ));
        }
        Ok(info)
    }
}

/// Builder for [`ComponentInfo`]; `build` validates the schema as a whole.
#[derive(Debug, Clone)]
pub struct ComponentInfoBuilder {
    info: ComponentInfo,
}

impl ComponentInfoBuilder {
    pub fn new(type_name: &str) -> Self {
        Self {
            info: ComponentInfo {
                type_name: type_name.to_string(),
                artifact: None,
                interfaces: BTreeSet::new(),
                attributes: Vec::new(),
                references: Vec::new(),
                operations: Vec::new(),
                constructor: Vec::new(),
            },
        }
    }

    pub fn artifact(mut self, artifact: Artifact) -> Self {
        self.info.artifact = Some(artifact);
        self
    }

    pub fn interface(mut self, tag: &str) -> Self {
        self.info.interfaces.insert(tag.to_string());
        self
    }

    pub fn attribute(mut self, attribute: AttributeInfo) -> Self {
        self.info.attributes.push(attribute);
        self
    }

    pub fn reference(mut self, reference: ReferenceInfo) -> Self {
        self.info.references.push(reference);
        self
    }

    pub fn operation(mut self, name: &str, parameters: &[ValueKind]) -> Self {
        self.info.operations.push(OperationInfo {
            name: name.to_string(),
            parameters: parameters.to_vec(),
        });
        self
    }

    pub fn constructor(mut self, parameters: &[&str]) -> Self {
        self.info.constructor = parameters.iter().map(|p| p.to_string()).collect();
        self
    }

    pub fn build(self) -> Result<ComponentInfo, ComponentError> {
        let info = self.info;
        let invalid = |reason: String| ComponentError::InvalidSchema {
            type_name: info.type_name.clone(),
            reason,
        };

        if info.type_name.is_empty() {
            return Err(invalid("empty type name".to_string()));
        }

        // Attributes and references share one namespace
        let mut slots = BTreeSet::new();
        let names = info
            .attributes
            .iter()
            .map(|a| a.name.as_str())
            .chain(info.references.iter().map(|r| r.name.as_str()));
        for name in names {
            if name.is_empty() {
                return Err(invalid("empty attribute or reference name".to_string()));
            }
            if !slots.insert(name) {
                return Err(invalid(format!("'{}' declared more than once", name)));
            }
        }

        for attribute in &info.attributes {
            if let Some(default) = &attribute.default {
                if !default.conforms_to(attribute.kind) {
                    return Err(invalid(format!(
                        "default of '{}' is not a {}",
                        attribute.name, attribute.kind
                    )));
                }
            }
        }

        let mut seen = BTreeSet::new();
        for parameter in &info.constructor {
            if !slots.contains(parameter.as_str()) {
                return Err(invalid(format!("constructor parameter '{}' is not declared", parameter)));
            }
            if !seen.insert(parameter.as_str()) {
                return Err(invalid(format!("constructor parameter '{}' repeated", parameter)));
            }
        }

        let mut operations = BTreeSet::new();
        for operation in &info.operations {
            if !operations.insert((operation.name.as_str(), operation.parameters.len())) {
                return Err(invalid(format!(
                    "operation '{}' with {} parameter(s) declared twice",
                    operation.name,
                    operation.parameters.len()
                )));
            }
        }

        Ok(info)
    }
}
