//! Source registry: reference counting, conflicts and model caching.

use std::sync::Arc;

use yang_reactor::source::{RegistryError, RegistryEvent};
use yang_reactor::{BuildOptions, FeatureSet, SourceDescriptor, SourceIdentifier, SourceRegistry};

fn source(name: &str, text: &str) -> SourceDescriptor {
    SourceDescriptor::parse(name, text).unwrap()
}

const FOO: &str = "module foo { namespace urn:foo; prefix foo; container top { } }";
const BAR: &str = r#"module bar { namespace urn:bar; prefix bar; import foo { prefix foo; }
    augment "/foo:top" { leaf y { type string; } } }"#;

#[test]
fn test_refcounted_registration() {
    let registry = SourceRegistry::new();
    let foo = SourceIdentifier::new("foo", None);

    assert_eq!(registry.register(source("foo.yang", FOO)).unwrap(), 1);
    assert_eq!(registry.register(source("foo.yang", FOO)).unwrap(), 2);
    assert_eq!(registry.refcount(&foo), 2);
    assert_eq!(registry.len(), 1);

    match registry.unregister(&foo) {
        Some(RegistryEvent::Released { refcount, .. }) => assert_eq!(refcount, 1),
        other => panic!("expected a release, got {other:?}"),
    }
    assert!(registry.contains(&foo));

    match registry.unregister(&foo) {
        Some(RegistryEvent::Removed { identifier, .. }) => assert_eq!(identifier, foo),
        other => panic!("expected an eviction, got {other:?}"),
    }
    assert!(registry.is_empty());
    assert!(registry.unregister(&foo).is_none());
}

#[test]
fn test_conflicting_registration_is_rejected() {
    let registry = SourceRegistry::new();
    registry.register(source("a/foo.yang", FOO)).unwrap();
    let error = registry
        .register(source("b/foo.yang", "module foo { namespace urn:other; prefix foo; }"))
        .unwrap_err();
    let RegistryError::Conflict { identifier, existing, new } = error;
    assert_eq!(identifier, SourceIdentifier::new("foo", None));
    assert_eq!(existing.as_ref(), "a/foo.yang");
    assert_eq!(new.as_ref(), "b/foo.yang");
    assert_eq!(registry.refcount(&identifier), 1);
}

#[test]
fn test_model_is_cached_until_the_set_changes() {
    let registry = SourceRegistry::new();
    registry.register(source("foo.yang", FOO)).unwrap();

    let first = registry.effective_model().unwrap();
    let again = registry.effective_model().unwrap();
    assert!(Arc::ptr_eq(&first, &again));
    assert!(first.find_schema_path("/foo:top").unwrap().schema_children().next().is_none());

    registry.register(source("bar.yang", BAR)).unwrap();
    let extended = registry.effective_model().unwrap();
    assert!(!Arc::ptr_eq(&first, &extended));
    assert!(extended.find_schema_path("/foo:top/bar:y").is_some());

    registry.unregister(&SourceIdentifier::new("bar", None));
    let reduced = registry.effective_model().unwrap();
    assert_eq!(*reduced, *first);
}

#[test]
fn test_shared_registration_keeps_the_cache() {
    let registry = SourceRegistry::new();
    registry.register(source("foo.yang", FOO)).unwrap();
    let first = registry.effective_model().unwrap();
    registry.register(source("foo.yang", FOO)).unwrap();
    assert!(Arc::ptr_eq(&first, &registry.effective_model().unwrap()));
}

#[test]
fn test_failed_build_surfaces_diagnostics() {
    let registry = SourceRegistry::new();
    registry.register(source("bar.yang", BAR)).unwrap();
    let error = registry.effective_model().unwrap_err();
    assert_eq!(error.errors().count(), 1);
}

#[test]
fn test_registry_options_apply() {
    let text = "module m { namespace urn:m; prefix m; feature f; leaf l { if-feature f; type string; } }";
    let registry = SourceRegistry::with_options(BuildOptions::new().with_features(FeatureSet::only([("m", "f")])));
    registry.register(source("m.yang", text)).unwrap();
    assert!(registry.effective_model().unwrap().find_schema_path("/m:l").is_some());

    let registry = SourceRegistry::with_options(BuildOptions::new().with_features(FeatureSet::only([("m", "g")])));
    registry.register(source("m.yang", text)).unwrap();
    assert!(registry.effective_model().unwrap().find_schema_path("/m:l").is_none());
}

#[test]
fn test_concurrent_registration() {
    let registry = Arc::new(SourceRegistry::new());
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let registry = registry.clone();
            std::thread::spawn(move || registry.register(source("foo.yang", FOO)).unwrap())
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(registry.refcount(&SourceIdentifier::new("foo", None)), 8);
}
