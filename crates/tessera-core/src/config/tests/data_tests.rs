#![cfg(test)]

use std::path::PathBuf;
use std::sync::Arc;

use semver::Version;

use crate::component::{decode_descriptors, AttributeInfo, ComponentDescriptor, ComponentInfo, ValueKind};
use crate::config::{ConfigId, ConfigurationData, ConfigurationError, ModuleType};
use crate::naming::AbstractName;
use crate::repository::Artifact;

fn id(name: &str) -> ConfigId {
    ConfigId::new(name, Version::new(2, 1, 0)).unwrap()
}

#[test]
fn test_config_id_parse_and_display() {
    let parsed: ConfigId = "shop-web/2.1.0".parse().unwrap();
    assert_eq!(parsed, id("shop-web"));
    assert_eq!(parsed.name(), "shop-web");
    assert_eq!(parsed.version(), &Version::new(2, 1, 0));
    assert_eq!(parsed.to_string(), "shop-web/2.1.0");

    // Only the last separator splits name from version
    let nested: ConfigId = "org/shop/1.0.0".parse().unwrap();
    assert_eq!(nested.name(), "org/shop");
}

#[test]
fn test_config_id_rejects_bad_input() {
    for input in ["shop", "shop/", "shop/one", "/1.0.0", "sh op/1.0.0", "shop,x/1.0.0", "a=b/1.0.0", "*/1.0.0"] {
        let err = input.parse::<ConfigId>().unwrap_err();
        assert!(
            matches!(err, ConfigurationError::InvalidConfiguration { .. }),
            "{input} should be rejected"
        );
    }
}

#[test]
fn test_metadata_json_shape() {
    let data = ConfigurationData::new(id("shop"))
        .with_parent(id("base"))
        .with_classpath("lib/shop.bin")
        .with_dependency(Artifact::new("org.example", "jdbc", Version::new(1, 2, 0), "jar"));

    let json: serde_json::Value = serde_json::to_value(&data).unwrap();
    assert_eq!(json["id"], "shop/2.1.0");
    assert_eq!(json["parent"], "base/2.1.0");
    assert_eq!(json["module_type"], "car");
    assert_eq!(json["classpath"][0], "lib/shop.bin");
    assert_eq!(json["dependencies"][0], "org.example/jdbc/1.2.0/jar");
    assert!(json.get("components").is_none());
}

#[test]
fn test_metadata_defaults_when_absent() {
    let data: ConfigurationData = serde_json::from_str(r#"{"id": "shop/2.1.0"}"#).unwrap();
    assert_eq!(data, ConfigurationData::new(id("shop")));
    assert_eq!(data.module_type, ModuleType::Car);
    assert!(data.parent.is_none());
    assert!(data.components().is_empty());

    let war: ConfigurationData =
        serde_json::from_str(r#"{"id": "shop/2.1.0", "module_type": "war", "classpath": ["WEB-INF/classes"]}"#).unwrap();
    assert_eq!(war.module_type, ModuleType::War);
    assert_eq!(war.classpath, vec![PathBuf::from("WEB-INF/classes")]);

    assert!(serde_json::from_str::<ConfigurationData>(r#"{"id": "no-version"}"#).is_err());
}

#[test]
fn test_components_are_kept_beside_metadata() {
    let info = Arc::new(
        ComponentInfo::builder("Timer")
            .attribute(AttributeInfo::new("period", ValueKind::Int))
            .build()
            .unwrap(),
    );
    let timer = ComponentDescriptor::new(AbstractName::new("shop", [("name", "timer")]).unwrap(), Arc::clone(&info))
        .with_attribute("period", 30i64)
        .unwrap();

    let mut data = ConfigurationData::new(id("shop"));
    data.set_components(std::slice::from_ref(&timer)).unwrap();
    assert!(!data.components().is_empty());

    // The JSON form never carries the descriptor stream
    let restored: ConfigurationData = serde_json::from_str(&serde_json::to_string(&data).unwrap()).unwrap();
    assert!(restored.components().is_empty());

    let decoded = decode_descriptors(data.components(), |_| Ok(Arc::clone(&info))).unwrap();
    assert_eq!(decoded.len(), 1);
    assert_eq!(decoded[0].name(), timer.name());
    assert_eq!(decoded[0].attributes(), timer.attributes());
}
