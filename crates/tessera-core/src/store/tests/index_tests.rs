#![cfg(test)]

use std::collections::BTreeMap;
use std::path::Path;

use crate::store::index::{parse, render};
use crate::store::StoreError;

#[test]
fn test_parse_skips_comments_and_blank_lines() {
    let text = "# header\n\n! other comment\napp/1.0.0=3\n  base/2.0.0 : 1  \n";
    let entries = parse(Path::new("index.properties"), text).unwrap();
    assert_eq!(entries.get("app/1.0.0"), Some(&3));
    assert_eq!(entries.get("base/2.0.0"), Some(&1));
    assert_eq!(entries.len(), 2);
}

#[test]
fn test_non_numeric_slot_is_corruption() {
    let err = parse(Path::new("index.properties"), "app/1.0.0=three\n").unwrap_err();
    assert!(matches!(err, StoreError::StoreCorruption { ref reason, .. } if reason.contains("line 1")));
}

#[test]
fn test_missing_separator_is_corruption() {
    let err = parse(Path::new("index.properties"), "app/1.0.0\n").unwrap_err();
    assert!(matches!(err, StoreError::StoreCorruption { .. }));
}

#[test]
fn test_render_then_parse() {
    let entries = BTreeMap::from([("a/1.0.0".to_string(), 2u64), ("b/0.1.0".to_string(), 7u64)]);
    let text = render(&entries);
    assert!(text.starts_with('#'));
    assert_eq!(parse(Path::new("index.properties"), &text).unwrap(), entries);
}
