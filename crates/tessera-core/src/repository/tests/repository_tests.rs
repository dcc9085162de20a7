#![cfg(test)]

use std::str::FromStr;

use semver::Version;
use tempfile::tempdir;

use crate::repository::{Artifact, ArtifactParseError, LocalRepository, Repository};

#[test]
fn test_artifact_parse_and_display() {
    let artifact = Artifact::from_str("org.example/pool/1.2.0/jar").unwrap();
    assert_eq!(artifact.group, "org.example");
    assert_eq!(artifact.name, "pool");
    assert_eq!(artifact.version, Version::new(1, 2, 0));
    assert_eq!(artifact.kind, "jar");
    assert_eq!(artifact.to_string(), "org.example/pool/1.2.0/jar");
    assert_eq!(artifact.file_name(), "pool-1.2.0.jar");
}

#[test]
fn test_artifact_parse_errors() {
    assert!(matches!(Artifact::from_str("a/b/1.0.0"), Err(ArtifactParseError::WrongShape(_))));
    assert!(matches!(Artifact::from_str("a//1.0.0/jar"), Err(ArtifactParseError::WrongShape(_))));
    assert!(matches!(
        Artifact::from_str("a/b/one/jar"),
        Err(ArtifactParseError::InvalidVersion { .. })
    ));
}

#[test]
fn test_artifact_serde_uses_string_form() {
    let artifact = Artifact::from_str("g/n/0.1.0/car").unwrap();
    let json = serde_json::to_string(&artifact).unwrap();
    assert_eq!(json, "\"g/n/0.1.0/car\"");
    let back: Artifact = serde_json::from_str(&json).unwrap();
    assert_eq!(back, artifact);
}

#[test]
fn test_local_repository_lookup() {
    let dir = tempdir().expect("Failed to create temp directory");
    let repository = LocalRepository::new(dir.path());
    let artifact = Artifact::from_str("g/lib/1.0.0/jar").unwrap();

    assert!(!repository.has_artifact(&artifact));
    assert!(repository.resolve(&artifact).is_err());

    let deployed = repository.deploy(&artifact, b"bytes").unwrap();
    assert!(repository.has_artifact(&artifact));
    assert_eq!(repository.resolve(&artifact).unwrap(), deployed);
    assert!(deployed.ends_with("g/lib/1.0.0/lib-1.0.0.jar"));
}

#[test]
fn test_artifact_parts_must_be_plain_segments() {
    for bad in ["../b/1.0.0/jar", "a/../1.0.0/jar", "a/b/1.0.0/..", "a/..\\x/1.0.0/jar", "./b/1.0.0/jar"] {
        assert!(
            matches!(Artifact::from_str(bad), Err(ArtifactParseError::UnsafePart { .. })),
            "{} should be rejected",
            bad
        );
    }
    assert!(serde_json::from_str::<Artifact>("\"../b/1.0.0/jar\"").is_err());
}

#[test]
fn test_local_repository_stays_under_root() {
    let dir = tempdir().expect("Failed to create temp directory");
    let repository = LocalRepository::new(dir.path().join("repo"));
    let escaping = Artifact::new("..", "lib", Version::new(1, 0, 0), "jar");
    assert_eq!(escaping.unsafe_part(), Some(".."));

    // A file exactly where the unchecked path would point
    let outside = dir.path().join("lib/1.0.0/lib-1.0.0.jar");
    std::fs::create_dir_all(outside.parent().unwrap()).unwrap();
    std::fs::write(&outside, b"bytes").unwrap();

    assert!(!repository.has_artifact(&escaping));
    assert!(repository.resolve(&escaping).is_err());
    assert!(repository.deploy(&escaping, b"other").is_err());
    assert_eq!(std::fs::read(&outside).unwrap(), b"bytes");
}
