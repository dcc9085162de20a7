#![cfg(test)]

use std::collections::{BTreeSet, HashMap};

use crate::dependency::{topological_order, DependencyError, DependencyManager};
use crate::naming::AbstractName;

fn n(name: &str) -> AbstractName {
    AbstractName::new("test", [("name", name)]).unwrap()
}

// Registration order used as tie-breaker: a=0, b=1, ...
fn seq(name: &AbstractName) -> u64 {
    name.property("name").and_then(|s| s.bytes().next()).map(|b| b as u64).unwrap_or(0)
}

#[test]
fn test_edges_are_idempotent() {
    let mut manager = DependencyManager::new();
    assert!(manager.add_dependency(&n("a"), &n("b")));
    assert!(!manager.add_dependency(&n("a"), &n("b")));
    assert_eq!(manager.edge_count(), 1);
    assert_eq!(manager.dependencies(&n("a")), BTreeSet::from([n("b")]));
    assert_eq!(manager.dependents(&n("b")), BTreeSet::from([n("a")]));
}

#[test]
fn test_remove_missing_edge_is_noop() {
    let mut manager = DependencyManager::new();
    assert!(!manager.remove_dependency(&n("a"), &n("b")));
    manager.add_dependency(&n("a"), &n("b"));
    assert!(manager.remove_dependency(&n("a"), &n("b")));
    assert!(!manager.remove_dependency(&n("a"), &n("b")));
    assert_eq!(manager.edge_count(), 0);
    assert!(manager.dependents(&n("b")).is_empty());
}

#[test]
fn test_self_edge_ignored() {
    let mut manager = DependencyManager::new();
    assert!(!manager.add_dependency(&n("a"), &n("a")));
    assert_eq!(manager.edge_count(), 0);
}

#[test]
fn test_remove_all_clears_both_directions() {
    let mut manager = DependencyManager::new();
    manager.add_dependency(&n("a"), &n("b"));
    manager.add_dependency(&n("b"), &n("c"));
    manager.remove_all(&n("b"));
    assert_eq!(manager.edge_count(), 0);
    assert!(manager.dependencies(&n("a")).is_empty());
    assert!(manager.dependents(&n("c")).is_empty());
}

#[test]
fn test_can_stop_only_counts_live_dependents() {
    let mut manager = DependencyManager::new();
    manager.add_dependency(&n("a"), &n("b"));

    let mut live = HashMap::new();
    live.insert(n("a"), true);
    assert!(!manager.can_stop(&n("b"), |x| live.get(x).copied().unwrap_or(false)));

    live.insert(n("a"), false);
    assert!(manager.can_stop(&n("b"), |x| live.get(x).copied().unwrap_or(false)));
}

#[test]
fn test_start_order_chain() {
    let mut manager = DependencyManager::new();
    manager.add_dependency(&n("a"), &n("b"));
    manager.add_dependency(&n("b"), &n("c"));

    let closure = manager.dependency_closure(&n("a"));
    assert_eq!(closure.len(), 3);
    let order = manager.start_order(&closure, seq).unwrap();
    assert_eq!(order, vec![n("c"), n("b"), n("a")]);
}

#[test]
fn test_start_order_ties_follow_sequence() {
    let mut manager = DependencyManager::new();
    // d depends on both b and c; neither constrains the other
    manager.add_dependency(&n("d"), &n("c"));
    manager.add_dependency(&n("d"), &n("b"));

    let closure = manager.dependency_closure(&n("d"));
    let order = manager.start_order(&closure, seq).unwrap();
    assert_eq!(order, vec![n("b"), n("c"), n("d")]);
}

#[test]
fn test_diamond_starts_shared_dependency_once() {
    let mut manager = DependencyManager::new();
    manager.add_dependency(&n("a"), &n("b"));
    manager.add_dependency(&n("a"), &n("c"));
    manager.add_dependency(&n("b"), &n("d"));
    manager.add_dependency(&n("c"), &n("d"));

    let order = manager.start_order(&manager.dependency_closure(&n("a")), seq).unwrap();
    assert_eq!(order, vec![n("d"), n("b"), n("c"), n("a")]);
}

#[test]
fn test_cycle_detected() {
    let mut manager = DependencyManager::new();
    manager.add_dependency(&n("a"), &n("b"));
    manager.add_dependency(&n("b"), &n("c"));
    manager.add_dependency(&n("c"), &n("a"));

    let closure = manager.dependency_closure(&n("a"));
    match manager.start_order(&closure, seq) {
        Err(DependencyError::CyclicDependency(path)) => {
            assert_eq!(path.first(), path.last(), "cycle path should return to its start: {:?}", path);
            assert_eq!(path.len(), 4);
        }
        other => panic!("Expected CyclicDependency, got {:?}", other),
    }
}

#[test]
fn test_stop_order_deepest_first() {
    let mut manager = DependencyManager::new();
    manager.add_dependency(&n("a"), &n("b"));
    manager.add_dependency(&n("b"), &n("c"));

    assert_eq!(manager.dependents_closure(&n("c")), BTreeSet::from([n("a"), n("b")]));
    assert_eq!(manager.stop_order(&n("c"), seq).unwrap(), vec![n("a"), n("b")]);
    assert!(manager.stop_order(&n("a"), seq).unwrap().is_empty());
}

#[test]
fn test_topological_order_ignores_outside_nodes() {
    let nodes = vec![n("a"), n("b")];
    let order = topological_order(&nodes, |x| {
        if *x == n("a") { vec![n("b"), n("z")] } else { vec![] }
    })
    .unwrap();
    assert_eq!(order, vec![n("b"), n("a")]);
}

#[test]
fn test_cycle_error_display() {
    let err = DependencyError::CyclicDependency(vec!["A".into(), "B".into(), "A".into()]);
    assert_eq!(err.to_string(), "Circular dependency detected: A -> B -> A");
}

#[test]
fn test_long_chain_sorts_without_recursion() {
    let chain: Vec<AbstractName> = (0..20_000).map(|i| n(&format!("link{}", i))).collect();
    let next: HashMap<AbstractName, AbstractName> = chain.windows(2).map(|w| (w[0].clone(), w[1].clone())).collect();

    let order = topological_order(&chain, |node| next.get(node).cloned().into_iter().collect()).unwrap();
    assert_eq!(order.first(), chain.last());
    assert_eq!(order.last(), chain.first());
    assert_eq!(order.len(), chain.len());
}
