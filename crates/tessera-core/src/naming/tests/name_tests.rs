#![cfg(test)]

use std::str::FromStr;

use crate::naming::{AbstractName, NamingError};

#[test]
fn test_parse_and_canonical_display() {
    let name = AbstractName::from_str("app:type=Pool,name=main").unwrap();
    assert_eq!(name.domain(), "app");
    assert_eq!(name.property("type"), Some("Pool"));
    assert_eq!(name.property("name"), Some("main"));
    // Keys are sorted in the canonical form
    assert_eq!(name.to_string(), "app:name=main,type=Pool");
}

#[test]
fn test_property_order_does_not_affect_equality() {
    let a: AbstractName = "app:type=Pool,name=main".parse().unwrap();
    let b: AbstractName = "app:name=main,type=Pool".parse().unwrap();
    assert_eq!(a, b);
    assert_eq!(a.to_string(), b.to_string());
}

#[test]
fn test_parse_rejects_malformed_names() {
    assert!(matches!(
        AbstractName::from_str("no-separator"),
        Err(NamingError::MissingDomainSeparator(_))
    ));
    assert!(matches!(AbstractName::from_str(":name=x"), Err(NamingError::EmptyDomain(_))));
    assert!(matches!(AbstractName::from_str("app:"), Err(NamingError::NoProperties(_))));
    assert!(matches!(
        AbstractName::from_str("app:name"),
        Err(NamingError::MalformedProperty { .. })
    ));
    assert!(matches!(
        AbstractName::from_str("app:name=a,name=b"),
        Err(NamingError::DuplicateKey { ref key, .. }) if key == "name"
    ));
    assert!(matches!(
        AbstractName::from_str("app:name="),
        Err(NamingError::MalformedProperty { .. })
    ));
}

#[test]
fn test_new_rejects_reserved_characters() {
    let result = AbstractName::new("app", [("name", "a=b")]);
    assert!(matches!(result, Err(NamingError::ReservedCharacter(_))));
}

#[test]
fn test_configuration_name() {
    let name = AbstractName::for_configuration(&"shop/1.0.0");
    assert_eq!(name.to_string(), "tessera.config:name=shop/1.0.0");
    let reparsed: AbstractName = name.to_string().parse().unwrap();
    assert_eq!(reparsed, name);
}

#[test]
fn test_with_property() {
    let base: AbstractName = "app:name=main".parse().unwrap();
    let typed = base.with_property("type", "Pool").unwrap();
    assert_eq!(typed.to_string(), "app:name=main,type=Pool");
    // Original untouched
    assert_eq!(base.property("type"), None);
}
