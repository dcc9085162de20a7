//! # Tessera Naming
//!
//! Structured identities for components ([`AbstractName`]) and the partial
//! selectors used to find them ([`AbstractNameQuery`]).
//!
//! A name is a domain plus a set of key/value properties. Its canonical
//! string form sorts the keys, so `app:type=Pool,name=main` and
//! `app:name=main,type=Pool` denote the same component.
pub mod error;
pub mod name;
pub mod query;

pub use error::NamingError;
pub use name::AbstractName;
pub use query::AbstractNameQuery;

#[cfg(test)]
mod tests;
