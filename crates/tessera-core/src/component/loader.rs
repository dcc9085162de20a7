use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use crate::component::error::ComponentError;
use crate::component::info::ComponentInfo;
use crate::component::traits::ComponentFactory;
use crate::repository::Artifact;
use crate::utils;

/// Every component type the kernel knows how to build, keyed by type name.
#[derive(Default)]
pub struct TypeRegistry {
    factories: RwLock<BTreeMap<String, Arc<dyn ComponentFactory>>>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, factory: Arc<dyn ComponentFactory>) -> Result<(), ComponentError> {
        let type_name = factory.info().type_name().to_string();
        let mut factories = utils::write(&self.factories);
        if factories.contains_key(&type_name) {
            return Err(ComponentError::DuplicateType(type_name));
        }
        log::trace!("Registered component type {}", type_name);
        factories.insert(type_name, factory);
        Ok(())
    }

    pub fn get(&self, type_name: &str) -> Option<Arc<dyn ComponentFactory>> {
        utils::read(&self.factories).get(type_name).cloned()
    }

    pub fn contains(&self, type_name: &str) -> bool {
        utils::read(&self.factories).contains_key(type_name)
    }

    pub fn type_names(&self) -> Vec<String> {
        utils::read(&self.factories).keys().cloned().collect()
    }
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("types", &self.type_names())
            .finish()
    }
}

/// Type-visibility context.
///
/// A type provided by an artifact is loadable only through a loader that
/// has that artifact on its own dependency list or on an ancestor's. Types
/// without an artifact are system types and visible from every loader.
#[derive(Debug)]
pub struct ClassLoader {
    name: String,
    parent: Option<Arc<ClassLoader>>,
    artifacts: Vec<Artifact>,
    classpath: Vec<PathBuf>,
    types: Arc<TypeRegistry>,
}

impl ClassLoader {
    /// Root loader of a kernel: sees only system types.
    pub fn system(types: Arc<TypeRegistry>) -> Self {
        Self {
            name: "system".to_string(),
            parent: None,
            artifacts: Vec::new(),
            classpath: Vec::new(),
            types,
        }
    }

    pub fn child(name: &str, parent: Arc<ClassLoader>, artifacts: Vec<Artifact>, classpath: Vec<PathBuf>) -> Self {
        let types = Arc::clone(&parent.types);
        Self {
            name: name.to_string(),
            parent: Some(parent),
            artifacts,
            classpath,
            types,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<&Arc<ClassLoader>> {
        self.parent.as_ref()
    }

    pub fn artifacts(&self) -> &[Artifact] {
        &self.artifacts
    }

    /// Resolved classpath entries, in declaration order.
    pub fn classpath(&self) -> &[PathBuf] {
        &self.classpath
    }

    pub fn sees_artifact(&self, artifact: &Artifact) -> bool {
        self.artifacts.contains(artifact) || self.parent.as_ref().is_some_and(|p| p.sees_artifact(artifact))
    }

    /// Factory for `type_name`, if the type is visible from this loader.
    pub fn load_type(&self, type_name: &str) -> Result<Arc<dyn ComponentFactory>, ComponentError> {
        let not_found = || ComponentError::ClassNotFound {
            type_name: type_name.to_string(),
            loader: self.name.clone(),
        };
        let factory = self.types.get(type_name).ok_or_else(not_found)?;
        let visible = match factory.info().artifact() {
            None => true,
            Some(artifact) => self.sees_artifact(artifact),
        };
        if !visible {
            return Err(not_found());
        }
        Ok(factory)
    }

    pub fn load_info(&self, type_name: &str) -> Result<Arc<ComponentInfo>, ComponentError> {
        self.load_type(type_name).map(|factory| factory.info())
    }
}
