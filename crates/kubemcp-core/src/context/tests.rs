use super::*;
use crate::kubeconfig::KubeconfigDocument;
use crate::test_support::{with_current, write_kubeconfig, TWO_CONTEXTS};

#[test]
fn new_resolver_has_no_context() {
    let resolver = ContextResolver::new();
    assert!(!resolver.is_resolved());
    assert!(resolver.context_name().is_none());
}

#[test]
fn adopts_declared_current_context() {
    let (_dir, path) = write_kubeconfig(&with_current("b"));
    let store = KubeconfigStore::new();
    let mut resolver = ContextResolver::new();

    assert_eq!(resolver.resolve(&store, &path).unwrap(), "b");
    assert_eq!(resolver.context_name(), Some("b"));
    assert_eq!(store.write_count(), 0);
}

#[test]
fn second_resolve_does_not_read_the_file() {
    let (_dir, path) = write_kubeconfig(&with_current("a"));
    let store = KubeconfigStore::new();
    let mut resolver = ContextResolver::new();

    let first = resolver.resolve(&store, &path).unwrap();
    let reads = store.read_count();
    let second = resolver.resolve(&store, &path).unwrap();

    assert_eq!(first, second);
    assert_eq!(store.read_count(), reads);
}

#[test]
fn picks_and_persists_first_context_when_none_declared() {
    let (_dir, path) = write_kubeconfig(TWO_CONTEXTS);
    let store = KubeconfigStore::new();
    let mut resolver = ContextResolver::new();

    assert_eq!(resolver.resolve(&store, &path).unwrap(), "a");
    assert_eq!(store.write_count(), 1);

    let raw = std::fs::read_to_string(&path).unwrap();
    let doc: KubeconfigDocument = serde_yaml::from_str(&raw).unwrap();
    assert_eq!(doc.current_context(), Some("a"));
}

#[test]
fn reset_forces_a_fresh_read() {
    let (_dir, path) = write_kubeconfig(&with_current("a"));
    let store = KubeconfigStore::new();
    let mut resolver = ContextResolver::new();
    resolver.resolve(&store, &path).unwrap();

    std::fs::write(&path, with_current("b")).unwrap();
    assert_eq!(resolver.resolve(&store, &path).unwrap(), "a");

    resolver.reset();
    assert_eq!(resolver.resolve(&store, &path).unwrap(), "b");
}

#[test]
fn invalid_document_is_rejected_and_not_memoized() {
    let (_dir, path) = write_kubeconfig("apiVersion: v1\nkind: Config\n");
    let store = KubeconfigStore::new();
    let mut resolver = ContextResolver::new();

    let err = resolver.resolve(&store, &path).unwrap_err();
    assert!(matches!(err, ConnectionError::Validation { .. }));
    assert!(!resolver.is_resolved());
}

#[test]
fn set_context_overrides_without_reading() {
    let store = KubeconfigStore::new();
    let mut resolver = ContextResolver::new();
    resolver.set_context("prod");
    assert_eq!(resolver.resolve(&store, Path::new("/nonexistent")).unwrap(), "prod");
    assert_eq!(store.read_count(), 0);
}
