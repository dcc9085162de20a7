use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::naming::name::AbstractName;

/// Partial identity used to find components.
///
/// A query matches a name when the domain (if any) is equal, every query
/// property is present on the name with the same value, and the candidate
/// declares every interface tag the query asks for.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AbstractNameQuery {
    domain: Option<String>,
    properties: BTreeMap<String, String>,
    interfaces: BTreeSet<String>,
}

impl AbstractNameQuery {
    /// Query matching every component.
    pub fn any() -> Self {
        Self::default()
    }

    /// Query matching exactly the given name (and nothing that lacks one of its properties).
    pub fn exact(name: &AbstractName) -> Self {
        Self {
            domain: Some(name.domain().to_string()),
            properties: name.properties().clone(),
            interfaces: BTreeSet::new(),
        }
    }

    pub fn domain(mut self, domain: &str) -> Self {
        self.domain = Some(domain.to_string());
        self
    }

    pub fn property(mut self, key: &str, value: &str) -> Self {
        self.properties.insert(key.to_string(), value.to_string());
        self
    }

    pub fn interface(mut self, tag: &str) -> Self {
        self.interfaces.insert(tag.to_string());
        self
    }

    pub fn required_domain(&self) -> Option<&str> {
        self.domain.as_deref()
    }

    pub fn properties(&self) -> &BTreeMap<String, String> {
        &self.properties
    }

    pub fn interfaces(&self) -> &BTreeSet<String> {
        &self.interfaces
    }

    /// Check a candidate name together with the interface tags its type declares.
    pub fn matches(&self, name: &AbstractName, interfaces: &BTreeSet<String>) -> bool {
        if let Some(domain) = &self.domain {
            if domain != name.domain() {
                return false;
            }
        }
        let properties_match = self
            .properties
            .iter()
            .all(|(key, value)| name.property(key) == Some(value.as_str()));
        properties_match && self.interfaces.is_subset(interfaces)
    }
}

impl fmt::Display for AbstractNameQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:", self.domain.as_deref().unwrap_or("*"))?;
        let mut first = true;
        for (key, value) in &self.properties {
            if !first {
                f.write_str(",")?;
            }
            first = false;
            write!(f, "{}={}", key, value)?;
        }
        if !self.interfaces.is_empty() {
            let tags: Vec<&str> = self.interfaces.iter().map(String::as_str).collect();
            write!(f, " [{}]", tags.join(", "))?;
        }
        Ok(())
    }
}
