use thiserror::Error;

/// Errors raised while parsing or building names and queries.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NamingError {
    #[error("Name '{0}' is missing the ':' separating domain and properties")]
    MissingDomainSeparator(String),

    #[error("Name '{0}' has an empty domain")]
    EmptyDomain(String),

    #[error("Name '{0}' has no properties")]
    NoProperties(String),

    #[error("Malformed property '{property}' in name '{name}'")]
    MalformedProperty { name: String, property: String },

    #[error("Duplicate property key '{key}' in name '{name}'")]
    DuplicateKey { name: String, key: String },

    #[error("Characters ':', ',', '=' and '*' are not allowed in '{0}'")]
    ReservedCharacter(String),
}
