#![cfg(test)]

use std::sync::Arc;

use async_trait::async_trait;
use semver::Version;

use crate::component::{ClassLoader, Component, ComponentError, ComponentInfo, FnComponentFactory, TypeRegistry};
use crate::repository::Artifact;

#[derive(Debug)]
struct Noop;

#[async_trait]
impl Component for Noop {}

fn factory(info: ComponentInfo) -> Arc<FnComponentFactory> {
    Arc::new(FnComponentFactory::new(info, |_, _| Ok(Arc::new(Noop) as Arc<dyn Component>)))
}

fn jdbc() -> Artifact {
    Artifact::new("org.example", "jdbc", Version::new(1, 2, 0), "jar")
}

fn types() -> Arc<TypeRegistry> {
    let types = Arc::new(TypeRegistry::new());
    types.register(factory(ComponentInfo::builder("Logger").build().unwrap())).unwrap();
    types
        .register(factory(ComponentInfo::builder("Pool").artifact(jdbc()).build().unwrap()))
        .unwrap();
    types
}

#[test]
fn test_duplicate_type_rejected() {
    let types = types();
    let err = types
        .register(factory(ComponentInfo::builder("Logger").build().unwrap()))
        .unwrap_err();
    assert!(matches!(err, ComponentError::DuplicateType(ref t) if t == "Logger"));
    assert_eq!(types.type_names(), vec!["Logger".to_string(), "Pool".to_string()]);
}

#[test]
fn test_system_loader_sees_only_system_types() {
    let system = ClassLoader::system(types());
    assert!(system.load_type("Logger").is_ok());
    let err = system.load_type("Pool").unwrap_err();
    assert!(matches!(err, ComponentError::ClassNotFound { ref loader, .. } if loader == "system"));
    assert!(system.load_type("Unknown").is_err());
}

#[test]
fn test_child_sees_its_artifacts() {
    let system = Arc::new(ClassLoader::system(types()));
    let child = ClassLoader::child("app/1.0.0", Arc::clone(&system), vec![jdbc()], Vec::new());
    assert!(child.sees_artifact(&jdbc()));
    assert_eq!(child.load_info("Pool").unwrap().type_name(), "Pool");
    assert!(child.load_type("Logger").is_ok());
}

#[test]
fn test_grandchild_inherits_parent_artifacts() {
    let system = Arc::new(ClassLoader::system(types()));
    let parent = Arc::new(ClassLoader::child("base/1.0.0", system, vec![jdbc()], Vec::new()));
    let child = ClassLoader::child("app/1.0.0", Arc::clone(&parent), Vec::new(), Vec::new());
    assert!(child.load_type("Pool").is_ok());
    assert_eq!(child.parent().map(|p| p.name()), Some("base/1.0.0"));
}

#[test]
fn test_version_must_match() {
    let system = Arc::new(ClassLoader::system(types()));
    let other = Artifact::new("org.example", "jdbc", Version::new(2, 0, 0), "jar");
    let child = ClassLoader::child("app/1.0.0", system, vec![other], Vec::new());
    assert!(child.load_type("Pool").is_err());
}
