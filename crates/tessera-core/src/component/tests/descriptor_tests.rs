#![cfg(test)]

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::component::{
    AttributeInfo, AttributeValue, ComponentDescriptor, ComponentError, ComponentInfo, ReferenceInfo, ReferencePattern,
    ValueKind,
};
use crate::naming::{AbstractName, AbstractNameQuery};

fn info() -> Arc<ComponentInfo> {
    Arc::new(
        ComponentInfo::builder("Worker")
            .attribute(AttributeInfo::new("threads", ValueKind::Int).with_default(2i64))
            .attribute(AttributeInfo::new("label", ValueKind::Str))
            .reference(ReferenceInfo::multiple("listeners"))
            .build()
            .unwrap(),
    )
}

fn name(n: &str) -> AbstractName {
    AbstractName::new("app", [("name", n)]).unwrap()
}

#[test]
fn test_attribute_falls_back_to_default() {
    let mut descriptor = ComponentDescriptor::new(name("w"), info());
    assert_eq!(descriptor.attribute("threads"), Some(&AttributeValue::Int(2)));
    assert!(descriptor.attributes().is_empty());

    descriptor.set_attribute("threads", 6i64).unwrap();
    assert_eq!(descriptor.attribute("threads"), Some(&AttributeValue::Int(6)));
    assert_eq!(descriptor.attribute("label"), None);
}

#[test]
fn test_set_attribute_validates_schema() {
    let mut descriptor = ComponentDescriptor::new(name("w"), info());
    let err = descriptor.set_attribute("threads", "six").unwrap_err();
    assert!(matches!(err, ComponentError::SchemaMismatch { ref attribute, .. } if attribute == "threads"));
    assert!(descriptor.set_attribute("unknown", 1i64).is_err());
    assert!(descriptor.attributes().is_empty());
}

#[test]
fn test_set_reference_requires_declared_slot() {
    let mut descriptor = ComponentDescriptor::new(name("w"), info());
    let pattern = ReferencePattern::Query(AbstractNameQuery::any().interface("Listener"));
    descriptor.set_reference("listeners", pattern.clone()).unwrap();
    assert_eq!(descriptor.reference("listeners"), Some(&pattern));
    assert!(descriptor.set_reference("sinks", pattern).is_err());
}

#[test]
fn test_self_dependency_ignored() {
    let mut descriptor = ComponentDescriptor::new(name("w"), info());
    descriptor.add_dependency(name("w"));
    descriptor.add_dependency(name("db"));
    assert_eq!(descriptor.dependencies(), &BTreeSet::from([name("db")]));
}

#[test]
fn test_names_pattern_matching() {
    let pattern = ReferencePattern::Names(BTreeSet::from([name("a"), name("b")]));
    assert!(pattern.matches(&name("a"), &BTreeSet::new()));
    assert!(!pattern.matches(&name("c"), &BTreeSet::new()));
}
