use std::collections::{BTreeSet, HashMap, VecDeque};

use crate::dependency::error::DependencyError;
use crate::naming::AbstractName;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Visiting,
    Done,
}

/// Topologically sort `nodes` so that dependencies come before dependents.
///
/// `nodes` must already be in tie-break order (registration order in the
/// kernel); among nodes with no ordering constraint between them, that order
/// is preserved. Dependencies that are not part of `nodes` are ignored.
pub fn topological_order<F>(nodes: &[AbstractName], mut dependencies_of: F) -> Result<Vec<AbstractName>, DependencyError>
where
    F: FnMut(&AbstractName) -> Vec<AbstractName>,
{
    let position: HashMap<&AbstractName, usize> = nodes.iter().enumerate().map(|(i, n)| (n, i)).collect();
    let mut marks: HashMap<AbstractName, Mark> = HashMap::new();
    let mut sorted = Vec::with_capacity(nodes.len());

    for root in nodes {
        if marks.contains_key(root) {
            continue;
        }
        // Explicit DFS stack: each frame holds a node and its unvisited dependencies
        marks.insert(root.clone(), Mark::Visiting);
        let pending = ordered_dependencies(root, &position, &mut dependencies_of);
        let mut frames: Vec<(AbstractName, std::vec::IntoIter<AbstractName>)> = vec![(root.clone(), pending)];

        while let Some((_, pending)) = frames.last_mut() {
            let Some(dependency) = pending.next() else {
                if let Some((node, _)) = frames.pop() {
                    marks.insert(node.clone(), Mark::Done);
                    sorted.push(node);
                }
                continue;
            };
            match marks.get(&dependency) {
                Some(Mark::Done) => {}
                Some(Mark::Visiting) => {
                    // Revisited before completion: everything from its first appearance is the cycle
                    let start = frames.iter().position(|(n, _)| *n == dependency).unwrap_or(0);
                    let mut cycle: Vec<String> = frames[start..].iter().map(|(n, _)| n.to_string()).collect();
                    cycle.push(dependency.to_string());
                    return Err(DependencyError::CyclicDependency(cycle));
                }
                None => {
                    marks.insert(dependency.clone(), Mark::Visiting);
                    let next = ordered_dependencies(&dependency, &position, &mut dependencies_of);
                    frames.push((dependency, next));
                }
            }
        }
    }
    Ok(sorted)
}

/// Dependencies of `node` within the sorted set, in tie-break order.
fn ordered_dependencies<F>(
    node: &AbstractName,
    position: &HashMap<&AbstractName, usize>,
    dependencies_of: &mut F,
) -> std::vec::IntoIter<AbstractName>
where
    F: FnMut(&AbstractName) -> Vec<AbstractName>,
{
    let mut dependencies: Vec<AbstractName> = dependencies_of(node)
        .into_iter()
        .filter(|d| position.contains_key(d))
        .collect();
    dependencies.sort_by_key(|d| position.get(d).copied().unwrap_or(usize::MAX));
    dependencies.dedup();
    dependencies.into_iter()
}

/// Directed edge store: `dependent -> dependency`.
///
/// Edges have set semantics. Self edges are ignored.
#[derive(Debug, Default)]
pub struct DependencyManager {
    /// name -> names it depends on
    dependencies: HashMap<AbstractName, BTreeSet<AbstractName>>,
    /// name -> names depending on it
    dependents: HashMap<AbstractName, BTreeSet<AbstractName>>,
}

impl DependencyManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `dependent` must start after and stop before `dependency`.
    /// Returns `true` if the edge is new.
    pub fn add_dependency(&mut self, dependent: &AbstractName, dependency: &AbstractName) -> bool {
        if dependent == dependency {
            return false;
        }
        let inserted = self
            .dependencies
            .entry(dependent.clone())
            .or_default()
            .insert(dependency.clone());
        self.dependents
            .entry(dependency.clone())
            .or_default()
            .insert(dependent.clone());
        inserted
    }

    /// Remove a single edge. Removing an edge that does not exist is a no-op.
    pub fn remove_dependency(&mut self, dependent: &AbstractName, dependency: &AbstractName) -> bool {
        let removed = match self.dependencies.get_mut(dependent) {
            Some(set) => set.remove(dependency),
            None => false,
        };
        if let Some(set) = self.dependents.get_mut(dependency) {
            set.remove(dependent);
        }
        self.prune(dependent);
        self.prune(dependency);
        removed
    }

    /// Remove every edge touching `name`, in either direction.
    pub fn remove_all(&mut self, name: &AbstractName) {
        if let Some(dependencies) = self.dependencies.remove(name) {
            for dependency in dependencies {
                if let Some(set) = self.dependents.get_mut(&dependency) {
                    set.remove(name);
                }
                self.prune(&dependency);
            }
        }
        if let Some(dependents) = self.dependents.remove(name) {
            for dependent in dependents {
                if let Some(set) = self.dependencies.get_mut(&dependent) {
                    set.remove(name);
                }
                self.prune(&dependent);
            }
        }
    }

    fn prune(&mut self, name: &AbstractName) {
        if self.dependencies.get(name).is_some_and(|s| s.is_empty()) {
            self.dependencies.remove(name);
        }
        if self.dependents.get(name).is_some_and(|s| s.is_empty()) {
            self.dependents.remove(name);
        }
    }

    /// Names `name` depends on directly.
    pub fn dependencies(&self, name: &AbstractName) -> BTreeSet<AbstractName> {
        self.dependencies.get(name).cloned().unwrap_or_default()
    }

    /// Names depending directly on `name`.
    pub fn dependents(&self, name: &AbstractName) -> BTreeSet<AbstractName> {
        self.dependents.get(name).cloned().unwrap_or_default()
    }

    pub fn has_dependency(&self, dependent: &AbstractName, dependency: &AbstractName) -> bool {
        self.dependencies.get(dependent).is_some_and(|s| s.contains(dependency))
    }

    pub fn edge_count(&self) -> usize {
        self.dependencies.values().map(BTreeSet::len).sum()
    }

    /// Direct dependents for which `is_live` holds.
    pub fn live_dependents<F>(&self, name: &AbstractName, is_live: F) -> Vec<AbstractName>
    where
        F: Fn(&AbstractName) -> bool,
    {
        self.dependents
            .get(name)
            .map(|set| set.iter().filter(|d| is_live(d)).cloned().collect())
            .unwrap_or_default()
    }

    /// A component may stop only while nothing live depends on it.
    pub fn can_stop<F>(&self, name: &AbstractName, is_live: F) -> bool
    where
        F: Fn(&AbstractName) -> bool,
    {
        self.live_dependents(name, is_live).is_empty()
    }

    /// `root` plus everything it transitively depends on.
    pub fn dependency_closure(&self, root: &AbstractName) -> BTreeSet<AbstractName> {
        self.closure(root, &self.dependencies)
    }

    /// Everything transitively depending on `root` (excluding `root`).
    pub fn dependents_closure(&self, root: &AbstractName) -> BTreeSet<AbstractName> {
        let mut closure = self.closure(root, &self.dependents);
        closure.remove(root);
        closure
    }

    fn closure(
        &self,
        root: &AbstractName,
        edges: &HashMap<AbstractName, BTreeSet<AbstractName>>,
    ) -> BTreeSet<AbstractName> {
        let mut seen = BTreeSet::new();
        let mut queue = VecDeque::from([root.clone()]);
        while let Some(name) = queue.pop_front() {
            if !seen.insert(name.clone()) {
                continue;
            }
            if let Some(next) = edges.get(&name) {
                queue.extend(next.iter().filter(|n| !seen.contains(*n)).cloned());
            }
        }
        seen
    }

    /// Order `names` dependencies-first, breaking ties with `sequence`.
    pub fn start_order<F>(&self, names: &BTreeSet<AbstractName>, sequence: F) -> Result<Vec<AbstractName>, DependencyError>
    where
        F: Fn(&AbstractName) -> u64,
    {
        let mut nodes: Vec<AbstractName> = names.iter().cloned().collect();
        nodes.sort_by_key(|n| sequence(n));
        topological_order(&nodes, |n| self.dependencies(n).into_iter().collect())
    }

    /// Transitive dependents of `root`, deepest first: the order in which
    /// they have to stop before `root` can.
    pub fn stop_order<F>(&self, root: &AbstractName, sequence: F) -> Result<Vec<AbstractName>, DependencyError>
    where
        F: Fn(&AbstractName) -> u64,
    {
        let mut names = self.dependents_closure(root);
        names.insert(root.clone());
        let mut order = self.start_order(&names, sequence)?;
        order.retain(|n| n != root);
        order.reverse();
        Ok(order)
    }
}
