use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::naming::error::NamingError;

/// Domain used for the names of loaded configurations.
pub const CONFIGURATION_DOMAIN: &str = "tessera.config";

/// Fully specified component identity: a domain plus key/value properties.
///
/// Properties are kept sorted by key, which makes the [`Display`](fmt::Display)
/// form canonical and lets names be compared and hashed structurally.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AbstractName {
    domain: String,
    properties: BTreeMap<String, String>,
}

impl AbstractName {
    /// Build a name from a domain and at least one property.
    pub fn new<I, K, V>(domain: &str, properties: I) -> Result<Self, NamingError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        check_part(domain)?;
        if domain.is_empty() {
            return Err(NamingError::EmptyDomain(domain.to_string()));
        }

        let mut map = BTreeMap::new();
        for (key, value) in properties {
            let (key, value) = (key.into(), value.into());
            check_part(&key)?;
            check_part(&value)?;
            if key.is_empty() || value.is_empty() {
                return Err(NamingError::MalformedProperty {
                    name: domain.to_string(),
                    property: format!("{}={}", key, value),
                });
            }
            if map.insert(key.clone(), value).is_some() {
                return Err(NamingError::DuplicateKey { name: domain.to_string(), key });
            }
        }
        if map.is_empty() {
            return Err(NamingError::NoProperties(domain.to_string()));
        }

        Ok(Self { domain: domain.to_string(), properties: map })
    }

    /// Name under which a configuration registers itself in the kernel.
    pub fn for_configuration(id: &impl fmt::Display) -> Self {
        Self {
            domain: CONFIGURATION_DOMAIN.to_string(),
            properties: BTreeMap::from([("name".to_string(), id.to_string())]),
        }
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn properties(&self) -> &BTreeMap<String, String> {
        &self.properties
    }

    /// Value of a single property, if present.
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    /// Copy of this name with one property added or replaced.
    pub fn with_property(&self, key: &str, value: &str) -> Result<Self, NamingError> {
        check_part(key)?;
        check_part(value)?;
        if key.is_empty() || value.is_empty() {
            return Err(NamingError::MalformedProperty {
                name: self.to_string(),
                property: format!("{}={}", key, value),
            });
        }
        let mut copy = self.clone();
        copy.properties.insert(key.to_string(), value.to_string());
        Ok(copy)
    }
}

// Config ids legitimately contain '/', so only the separators of the name
// syntax itself are reserved.
fn check_part(part: &str) -> Result<(), NamingError> {
    if part.contains([':', ',', '=', '*']) {
        return Err(NamingError::ReservedCharacter(part.to_string()));
    }
    Ok(())
}

impl fmt::Display for AbstractName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:", self.domain)?;
        for (i, (key, value)) in self.properties.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}={}", key, value)?;
        }
        Ok(())
    }
}

impl FromStr for AbstractName {
    type Err = NamingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (domain, rest) = s
            .split_once(':')
            .ok_or_else(|| NamingError::MissingDomainSeparator(s.to_string()))?;
        if domain.is_empty() {
            return Err(NamingError::EmptyDomain(s.to_string()));
        }
        if rest.is_empty() {
            return Err(NamingError::NoProperties(s.to_string()));
        }

        let mut pairs = Vec::new();
        for property in rest.split(',') {
            let (key, value) = property.split_once('=').ok_or_else(|| NamingError::MalformedProperty {
                name: s.to_string(),
                property: property.to_string(),
            })?;
            pairs.push((key.trim().to_string(), value.trim().to_string()));
        }

        AbstractName::new(domain, pairs).map_err(|e| match e {
            NamingError::DuplicateKey { key, .. } => NamingError::DuplicateKey { name: s.to_string(), key },
            NamingError::MalformedProperty { property, .. } => {
                NamingError::MalformedProperty { name: s.to_string(), property }
            }
            other => other,
        })
    }
}
